use super::{
    instance, submit_type_queue_flags, Buffer, CommandDrain, ContextInfo, GPUError, Image,
    RenderPass, ResourcePool, Result, SubmitType, Task, Timestamp, Transaction,
};
use crate::utils::{Pool, Scope};
use ash::vk;
use std::collections::BTreeMap;

#[derive(Clone, Copy)]
pub(crate) struct SubmitQueue {
    pub qfam_idx: u32,
    pub queue: vk::Queue,
}

/// Owns a logical device, one queue per needed submit class, the memory-type
/// priority tables, a default sampler, and the arenas every resource handle
/// points into.
pub struct Context {
    pub(crate) instance: ash::Instance,
    pub(crate) pdevice: vk::PhysicalDevice,
    pub(crate) device: ash::Device,
    pub(crate) properties: vk::PhysicalDeviceProperties,
    pub(crate) graphics_queue: Option<SubmitQueue>,
    pub(crate) compute_queue: Option<SubmitQueue>,
    pub(crate) mem_type_ranks: [Vec<u32>; 4],
    pub(crate) default_sampler: vk::Sampler,

    pub(crate) buffers: Pool<Buffer>,
    pub(crate) images: Pool<Image>,
    pub(crate) tasks: Pool<Task>,
    pub(crate) render_passes: Pool<RenderPass>,
    pub(crate) resource_pools: Pool<ResourcePool>,
    pub(crate) transactions: Pool<Transaction>,
    pub(crate) drains: Pool<CommandDrain>,
    pub(crate) timestamps: Pool<Timestamp>,

    debug_name: String,
}

/// Buckets queue families by the popcount of their capability bits. Searching
/// buckets from the highest popcount down reproduces the allocation order the
/// driver-facing layer expects.
fn bucket_queue_families(
    props: &[vk::QueueFamilyProperties],
) -> BTreeMap<u32, Vec<(u32, vk::QueueFlags)>> {
    let mut buckets: BTreeMap<u32, Vec<(u32, vk::QueueFlags)>> = BTreeMap::new();
    for (idx, prop) in props.iter().enumerate() {
        if prop.queue_count == 0 {
            log::warn!("ignored queue family #{} with zero queue count", idx);
            continue;
        }
        let nbits = prop.queue_flags.as_raw().count_ones();
        buckets
            .entry(nbits)
            .or_default()
            .push((idx as u32, prop.queue_flags));
    }
    buckets
}

fn pick_queue_family(
    buckets: &BTreeMap<u32, Vec<(u32, vk::QueueFlags)>>,
    required: vk::QueueFlags,
) -> Option<u32> {
    for (_, families) in buckets.iter().rev() {
        for &(idx, flags) in families {
            if flags.contains(required) {
                return Some(idx);
            }
        }
    }
    None
}

fn queue_caps_string(flags: vk::QueueFlags) -> String {
    let mut caps = Vec::new();
    if flags.contains(vk::QueueFlags::GRAPHICS) {
        caps.push("GRAPHICS");
    }
    if flags.contains(vk::QueueFlags::COMPUTE) {
        caps.push("COMPUTE");
    }
    if flags.contains(vk::QueueFlags::TRANSFER) {
        caps.push("TRANSFER");
    }
    if flags.contains(vk::QueueFlags::SPARSE_BINDING) {
        caps.push("SPARSE_BINDING");
    }
    caps.join(" | ")
}

/// Memory-type score for a host access pattern; higher is better. The lookup
/// tables are exact property-set matches so a type with extra unrelated bits
/// never outranks the intended tier.
pub(crate) fn memory_priority(
    host_access: super::MemoryAccess,
    props: vk::MemoryPropertyFlags,
) -> u32 {
    use super::MemoryAccess;
    use vk::MemoryPropertyFlags as M;

    let dl = M::DEVICE_LOCAL.as_raw();
    let hv = M::HOST_VISIBLE.as_raw();
    let hco = M::HOST_COHERENT.as_raw();
    let hca = M::HOST_CACHED.as_raw();

    let lut: [u32; 6] = match host_access {
        MemoryAccess::None => {
            return if props.contains(M::DEVICE_LOCAL) { 1 } else { 0 };
        }
        MemoryAccess::ReadOnly => [
            hv | hca | hco,
            hv | hca,
            hv | hco,
            dl | hv | hco,
            dl | hv | hca,
            dl | hv | hca | hco,
        ],
        MemoryAccess::WriteOnly => [
            dl | hv | hco,
            dl | hv | hca | hco,
            dl | hv | hca,
            hv | hco,
            hv | hca | hco,
            hv | hca,
        ],
        MemoryAccess::ReadWrite => [
            dl | hv | hca | hco,
            dl | hv | hco,
            dl | hv | hca,
            hv | hco,
            hv | hca | hco,
            hv | hca,
        ],
    };
    for (i, &wanted) in lut.iter().enumerate() {
        if props.as_raw() == wanted {
            return (lut.len() - i) as u32;
        }
    }
    0
}

/// Ranks every memory type for one host access mode, best first. Stable on
/// ties so enumeration order breaks them, matching driver expectations.
pub(crate) fn rank_memory_types(
    host_access: super::MemoryAccess,
    types: &[vk::MemoryType],
) -> Vec<u32> {
    let mut idxs: Vec<u32> = (0..types.len() as u32).collect();
    idxs.sort_by_key(|&i| {
        std::cmp::Reverse(memory_priority(host_access, types[i as usize].property_flags))
    });
    idxs
}

/// First type in the ranked list whose bit is set in the requirement mask.
pub(crate) fn select_memory_type(ranked: &[u32], type_mask: u32) -> Option<u32> {
    ranked
        .iter()
        .copied()
        .find(|&idx| (1u32 << idx) & type_mask != 0)
}

impl Context {
    pub fn new(info: &ContextInfo) -> Result<Self> {
        let (instance, pdevice, desc) = instance::acquire(info.device_index)?;
        match Self::init(instance, pdevice, &desc, info) {
            Ok(ctx) => Ok(ctx),
            Err(err) => {
                instance::release();
                Err(err)
            }
        }
    }

    fn init(
        instance: ash::Instance,
        pdevice: vk::PhysicalDevice,
        desc: &str,
        info: &ContextInfo,
    ) -> Result<Self> {
        let properties = unsafe { instance.get_physical_device_properties(pdevice) };

        if properties.limits.timestamp_compute_and_graphics == vk::FALSE {
            log::warn!(
                "context '{}': device does not support timestamps; WriteTimestamp will not be available",
                info.debug_name
            );
        }

        let qfam_props =
            unsafe { instance.get_physical_device_queue_family_properties(pdevice) };
        for (idx, prop) in qfam_props.iter().enumerate() {
            log::debug!(
                "discovered queue family #{}: {}",
                idx,
                queue_caps_string(prop.queue_flags)
            );
        }
        let buckets = bucket_queue_families(&qfam_props);
        if buckets.is_empty() {
            return Err(GPUError::Unsupported("no usable queue family"));
        }

        let graphics_family =
            pick_queue_family(&buckets, submit_type_queue_flags(SubmitType::Graphics));
        let compute_family =
            pick_queue_family(&buckets, submit_type_queue_flags(SubmitType::Compute));
        if graphics_family.is_none() {
            log::warn!(
                "no queue family supports GRAPHICS; Draw, DrawIndexed, and render passes will not be available"
            );
        }
        if compute_family.is_none() {
            log::warn!("no queue family supports COMPUTE; Dispatch will not be available");
        }

        let mut unique_families: Vec<u32> = graphics_family
            .iter()
            .chain(compute_family.iter())
            .copied()
            .collect();
        unique_families.sort_unstable();
        unique_families.dedup();
        if unique_families.is_empty() {
            return Err(GPUError::Unsupported("no graphics or compute queue family"));
        }

        let priorities = [1.0f32];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let device = unsafe {
            instance.create_device(
                pdevice,
                &vk::DeviceCreateInfo::builder()
                    .queue_create_infos(&queue_infos)
                    .build(),
                None,
            )
        }?;

        let queue_for = |family: Option<u32>| -> Option<SubmitQueue> {
            family.map(|qfam_idx| SubmitQueue {
                qfam_idx,
                queue: unsafe { device.get_device_queue(qfam_idx, 0) },
            })
        };
        let graphics_queue = queue_for(graphics_family);
        let compute_queue = queue_for(compute_family);

        let mem_props = unsafe { instance.get_physical_device_memory_properties(pdevice) };
        let mem_types = &mem_props.memory_types[..mem_props.memory_type_count as usize];
        let mem_type_ranks = [
            rank_memory_types(super::MemoryAccess::None, mem_types),
            rank_memory_types(super::MemoryAccess::ReadOnly, mem_types),
            rank_memory_types(super::MemoryAccess::WriteOnly, mem_types),
            rank_memory_types(super::MemoryAccess::ReadWrite, mem_types),
        ];

        let default_sampler = unsafe {
            device.create_sampler(
                &vk::SamplerCreateInfo::builder()
                    .mag_filter(vk::Filter::LINEAR)
                    .min_filter(vk::Filter::LINEAR)
                    .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
                    .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
                    .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
                    .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
                    .unnormalized_coordinates(false)
                    .build(),
                None,
            )
        }?;

        log::debug!("created context '{}' on {}", info.debug_name, desc);
        Ok(Self {
            instance,
            pdevice,
            device,
            properties,
            graphics_queue,
            compute_queue,
            mem_type_ranks,
            default_sampler,
            buffers: Pool::default(),
            images: Pool::default(),
            tasks: Pool::default(),
            render_passes: Pool::default(),
            resource_pools: Pool::default(),
            transactions: Pool::default(),
            drains: Pool::default(),
            timestamps: Pool::default(),
            debug_name: info.debug_name.to_string(),
        })
    }

    /// Whether commands of a submit class can run on this context. A context
    /// missing a class is still usable for everything else.
    pub fn supports(&self, ty: SubmitType) -> bool {
        match ty {
            SubmitType::Graphics => self.graphics_queue.is_some(),
            SubmitType::Compute => self.compute_queue.is_some(),
            SubmitType::Any => self.graphics_queue.is_some() || self.compute_queue.is_some(),
        }
    }

    /// Resolves a submit class to its queue. `Any` must already have been
    /// resolved to a concrete class by the recording engine.
    pub(crate) fn submit_queue(&self, ty: SubmitType) -> Result<SubmitQueue> {
        match ty {
            SubmitType::Graphics => self
                .graphics_queue
                .ok_or(GPUError::Unsupported("no graphics queue family")),
            SubmitType::Compute => self
                .compute_queue
                .ok_or(GPUError::Unsupported("no compute queue family")),
            SubmitType::Any => panic!("submit type must be concrete at queue resolution"),
        }
    }

    pub(crate) fn ranked_memory_types(&self, access: super::MemoryAccess) -> &[u32] {
        &self.mem_type_ranks[access as usize]
    }

    /// Opens a scope that destroys everything created through it on exit.
    pub fn scope(&mut self) -> Scope<'_> {
        Scope::new(self)
    }

    /// Destroys every resource still alive in the context's arenas, then the
    /// device itself. The caller must ensure the device is idle.
    pub fn destroy(mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
        }

        let drains = self.drains.drain_all();
        for drain in drains {
            drain.destroy(&self.device);
        }
        let transactions = self.transactions.drain_all();
        for transaction in transactions {
            transaction.destroy(&self.device);
        }
        for pool in self.resource_pools.drain_all() {
            pool.destroy(&self.device);
        }
        for task in self.tasks.drain_all() {
            task.destroy(&self.device);
        }
        for pass in self.render_passes.drain_all() {
            pass.destroy(&self.device);
        }
        for timestamp in self.timestamps.drain_all() {
            timestamp.destroy(&self.device);
        }
        for image in self.images.drain_all() {
            image.destroy(&self.device);
        }
        for buffer in self.buffers.drain_all() {
            buffer.destroy(&self.device);
        }

        unsafe {
            self.device.destroy_sampler(self.default_sampler, None);
            self.device.destroy_device(None);
        }
        instance::release();
        log::debug!("destroyed context '{}'", self.debug_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::MemoryAccess;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn mem_type(flags: vk::MemoryPropertyFlags) -> vk::MemoryType {
        vk::MemoryType {
            property_flags: flags,
            heap_index: 0,
        }
    }

    #[test]
    fn queue_search_prefers_higher_popcount_buckets() {
        // A graphics+compute+transfer family and a compute-only family: both
        // satisfy COMPUTE, the search walks buckets from the most capable
        // down, so the combined family wins.
        let props = [
            family(vk::QueueFlags::COMPUTE),
            family(
                vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
            ),
        ];
        let buckets = bucket_queue_families(&props);
        assert_eq!(pick_queue_family(&buckets, vk::QueueFlags::COMPUTE), Some(1));
        assert_eq!(pick_queue_family(&buckets, vk::QueueFlags::GRAPHICS), Some(1));
    }

    #[test]
    fn queue_search_fails_when_no_family_matches() {
        let props = [family(vk::QueueFlags::TRANSFER)];
        let buckets = bucket_queue_families(&props);
        assert_eq!(pick_queue_family(&buckets, vk::QueueFlags::GRAPHICS), None);
        assert_eq!(pick_queue_family(&buckets, vk::QueueFlags::COMPUTE), None);
    }

    #[test]
    fn zero_count_families_are_ignored() {
        let mut prop = family(vk::QueueFlags::GRAPHICS);
        prop.queue_count = 0;
        let buckets = bucket_queue_families(&[prop]);
        assert!(buckets.is_empty());
    }

    #[test]
    fn memory_ranking_prefers_device_local_for_gpu_only() {
        let types = [
            mem_type(vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT),
            mem_type(vk::MemoryPropertyFlags::DEVICE_LOCAL),
        ];
        let ranked = rank_memory_types(MemoryAccess::None, &types);
        assert_eq!(ranked[0], 1);
    }

    #[test]
    fn memory_ranking_prefers_cached_for_readback() {
        let types = [
            mem_type(vk::MemoryPropertyFlags::DEVICE_LOCAL),
            mem_type(vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT),
            mem_type(
                vk::MemoryPropertyFlags::HOST_VISIBLE
                    | vk::MemoryPropertyFlags::HOST_CACHED
                    | vk::MemoryPropertyFlags::HOST_COHERENT,
            ),
        ];
        let ranked = rank_memory_types(MemoryAccess::ReadOnly, &types);
        assert_eq!(ranked[0], 2);
        assert_eq!(ranked[1], 1);
    }

    #[test]
    fn memory_ranking_prefers_device_local_coherent_for_upload() {
        let types = [
            mem_type(vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT),
            mem_type(
                vk::MemoryPropertyFlags::DEVICE_LOCAL
                    | vk::MemoryPropertyFlags::HOST_VISIBLE
                    | vk::MemoryPropertyFlags::HOST_COHERENT,
            ),
        ];
        let ranked = rank_memory_types(MemoryAccess::WriteOnly, &types);
        assert_eq!(ranked[0], 1);
    }

    #[test]
    fn selection_respects_the_requirement_mask() {
        let ranked = vec![2, 0, 1];
        // Type 2 is best but masked out; type 0 is next.
        assert_eq!(select_memory_type(&ranked, 0b011), Some(0));
        assert_eq!(select_memory_type(&ranked, 0b100), Some(2));
        assert_eq!(select_memory_type(&ranked, 0), None);
    }

    #[test]
    fn selection_picks_highest_priority_eligible_type() {
        let types = [
            mem_type(vk::MemoryPropertyFlags::DEVICE_LOCAL),
            mem_type(vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT),
        ];
        let ranked = rank_memory_types(MemoryAccess::ReadWrite, &types);
        // Both types eligible: the host-visible one outranks pure device-local.
        assert_eq!(select_memory_type(&ranked, 0b11), Some(1));
        // Only the device-local type eligible: it is still chosen.
        assert_eq!(select_memory_type(&ranked, 0b01), Some(0));
    }
}

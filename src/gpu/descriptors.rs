use super::{BufferView, Context, GPUError, ImageView, ResourceType, Result, Task};
use crate::utils::Handle;
use ash::vk;

/// A single descriptor set allocated against one task's layout. Tasks with no
/// declared resources get an empty pool; binding into it is an error.
pub struct ResourcePool {
    pub(crate) task: Handle<Task>,
    pub(crate) desc_pool: vk::DescriptorPool,
    pub(crate) desc_set: vk::DescriptorSet,
}

impl ResourcePool {
    pub(crate) fn destroy(self, device: &ash::Device) {
        if self.desc_pool != vk::DescriptorPool::null() {
            unsafe { device.destroy_descriptor_pool(self.desc_pool, None) };
        }
        log::debug!("destroyed resource pool");
    }
}

impl Context {
    pub fn make_resource_pool(&mut self, task: Handle<Task>) -> Result<Handle<ResourcePool>> {
        let (pool_sizes, desc_set_layout) = {
            let task_data = self
                .tasks
                .get_ref(task)
                .ok_or(GPUError::InvalidHandle("task"))?;
            (task_data.pool_sizes.clone(), task_data.desc_set_layout)
        };

        if pool_sizes.is_empty() {
            log::debug!("created resource pool with no entry");
            return self
                .resource_pools
                .insert(ResourcePool {
                    task,
                    desc_pool: vk::DescriptorPool::null(),
                    desc_set: vk::DescriptorSet::null(),
                })
                .ok_or(GPUError::SlotError());
        }

        let desc_pool = unsafe {
            self.device.create_descriptor_pool(
                &vk::DescriptorPoolCreateInfo::builder()
                    .pool_sizes(&pool_sizes)
                    .max_sets(1)
                    .build(),
                None,
            )
        }?;

        let set_layouts = [desc_set_layout];
        let desc_set = match unsafe {
            self.device.allocate_descriptor_sets(
                &vk::DescriptorSetAllocateInfo::builder()
                    .descriptor_pool(desc_pool)
                    .set_layouts(&set_layouts)
                    .build(),
            )
        } {
            Ok(sets) => sets[0],
            Err(err) => {
                unsafe { self.device.destroy_descriptor_pool(desc_pool, None) };
                return Err(err.into());
            }
        };

        log::debug!("created resource pool");
        self.resource_pools
            .insert(ResourcePool {
                task,
                desc_pool,
                desc_set,
            })
            .ok_or(GPUError::SlotError())
    }

    /// Destroying a handle twice is a no-op.
    pub fn destroy_resource_pool(&mut self, handle: Handle<ResourcePool>) {
        match self.resource_pools.take(handle) {
            Some(pool) => pool.destroy(&self.device),
            None => log::warn!("ignored destroy of dead resource pool handle"),
        }
    }

    /// The recorded resource type at a binding index, with range checking.
    fn pool_binding_type(
        &self,
        pool: &ResourcePool,
        binding: u32,
    ) -> Result<ResourceType> {
        if pool.desc_pool == vk::DescriptorPool::null() {
            return Err(GPUError::EmptyResourcePool);
        }
        let task = self
            .tasks
            .get_ref(pool.task)
            .ok_or(GPUError::InvalidHandle("task"))?;
        task.resources
            .get(binding as usize)
            .copied()
            .ok_or(GPUError::BindingOutOfRange {
                binding,
                count: task.resources.len() as u32,
            })
    }

    /// Binds a buffer range to a descriptor. Rebinding the same index simply
    /// overwrites the previous descriptor.
    pub fn bind_buffer(
        &mut self,
        handle: Handle<ResourcePool>,
        binding: u32,
        view: BufferView,
    ) -> Result<()> {
        let pool = self
            .resource_pools
            .get_ref(handle)
            .ok_or(GPUError::InvalidHandle("resource pool"))?;
        let rsc_ty = self.pool_binding_type(pool, binding)?;
        if !rsc_ty.is_buffer() {
            return Err(GPUError::BindingTypeMismatch {
                binding,
                expected: rsc_ty,
            });
        }
        let buffer = self
            .buffers
            .get_ref(view.buf)
            .ok_or(GPUError::InvalidHandle("buffer"))?;

        let buffer_info = [vk::DescriptorBufferInfo {
            buffer: buffer.buf,
            offset: view.offset,
            range: view.size,
        }];
        let write = vk::WriteDescriptorSet::builder()
            .dst_set(pool.desc_set)
            .dst_binding(binding)
            .dst_array_element(0)
            .descriptor_type(super::resource_type_to_vk(rsc_ty))
            .buffer_info(&buffer_info)
            .build();
        unsafe { self.device.update_descriptor_sets(&[write], &[]) };
        log::debug!(
            "bound pool resource #{} to buffer '{}'",
            binding,
            buffer.debug_name
        );
        Ok(())
    }

    /// Binds an image view to a descriptor. Sampled images are described in
    /// shader-read-only layout, storage images in general layout.
    pub fn bind_image(
        &mut self,
        handle: Handle<ResourcePool>,
        binding: u32,
        view: ImageView,
    ) -> Result<()> {
        let pool = self
            .resource_pools
            .get_ref(handle)
            .ok_or(GPUError::InvalidHandle("resource pool"))?;
        let rsc_ty = self.pool_binding_type(pool, binding)?;
        if rsc_ty.is_buffer() {
            return Err(GPUError::BindingTypeMismatch {
                binding,
                expected: rsc_ty,
            });
        }
        let image = self
            .images
            .get_ref(view.img)
            .ok_or(GPUError::InvalidHandle("image"))?;
        if image.view == vk::ImageView::null() {
            return Err(GPUError::InvalidHandle("staging image has no view"));
        }

        let layout = match rsc_ty {
            ResourceType::SampledImage => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            ResourceType::StorageImage => vk::ImageLayout::GENERAL,
            _ => unreachable!(),
        };
        let image_info = [vk::DescriptorImageInfo {
            sampler: vk::Sampler::null(),
            image_view: image.view,
            image_layout: layout,
        }];
        let write = vk::WriteDescriptorSet::builder()
            .dst_set(pool.desc_set)
            .dst_binding(binding)
            .dst_array_element(0)
            .descriptor_type(super::resource_type_to_vk(rsc_ty))
            .image_info(&image_info)
            .build();
        unsafe { self.device.update_descriptor_sets(&[write], &[]) };
        log::debug!(
            "bound pool resource #{} to image '{}'",
            binding,
            image.debug_name
        );
        Ok(())
    }
}

use super::{
    buffer_usage_to_vk, select_memory_type, BufferInfo, BufferUsage, BufferView, Context,
    GPUError, MemoryAccess, Result,
};
use crate::utils::Handle;
use ash::vk;

/// A device buffer plus the dedicated allocation backing it.
pub struct Buffer {
    pub(crate) buf: vk::Buffer,
    pub(crate) memory: vk::DeviceMemory,
    pub(crate) size: u64,
    pub(crate) host_access: MemoryAccess,
    pub(crate) usage: BufferUsage,
    pub(crate) debug_name: String,
}

impl Buffer {
    pub(crate) fn destroy(self, device: &ash::Device) {
        unsafe {
            device.destroy_buffer(self.buf, None);
            device.free_memory(self.memory, None);
        }
        log::debug!("destroyed buffer '{}'", self.debug_name);
    }
}

impl Context {
    pub fn make_buffer(&mut self, info: &BufferInfo) -> Result<Handle<Buffer>> {
        let usage = buffer_usage_to_vk(info.usage);

        let buf = unsafe {
            self.device.create_buffer(
                &vk::BufferCreateInfo::builder()
                    .size(info.byte_size)
                    .usage(usage)
                    .sharing_mode(vk::SharingMode::EXCLUSIVE)
                    .build(),
                None,
            )
        }?;

        let reqs = unsafe { self.device.get_buffer_memory_requirements(buf) };
        let memory = match self.allocate_dedicated(&reqs, info.host_access) {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { self.device.destroy_buffer(buf, None) };
                return Err(err);
            }
        };
        unsafe { self.device.bind_buffer_memory(buf, memory, 0) }?;

        log::debug!("created buffer '{}'", info.debug_name);
        self.buffers
            .insert(Buffer {
                buf,
                memory,
                size: info.byte_size,
                host_access: info.host_access,
                usage: info.usage,
                debug_name: info.debug_name.to_string(),
            })
            .ok_or(GPUError::SlotError())
    }

    /// Destroying a handle twice is a no-op.
    pub fn destroy_buffer(&mut self, handle: Handle<Buffer>) {
        match self.buffers.take(handle) {
            Some(buffer) => buffer.destroy(&self.device),
            None => log::warn!("ignored destroy of dead buffer handle"),
        }
    }

    pub(crate) fn allocate_dedicated(
        &self,
        reqs: &vk::MemoryRequirements,
        host_access: MemoryAccess,
    ) -> Result<vk::DeviceMemory> {
        let ranked = self.ranked_memory_types(host_access);
        let mem_type = select_memory_type(ranked, reqs.memory_type_bits)
            .ok_or(GPUError::NoSuitableMemoryType(host_access))?;
        let memory = unsafe {
            self.device.allocate_memory(
                &vk::MemoryAllocateInfo::builder()
                    .allocation_size(reqs.size)
                    .memory_type_index(mem_type)
                    .build(),
                None,
            )
        }?;
        Ok(memory)
    }

    /// Maps the viewed range for reading. The caller must guarantee no
    /// concurrent device access to the range.
    pub fn map_buffer<T>(&mut self, view: BufferView) -> Result<&[T]> {
        let (memory, len) = self.map_range(view)?;
        Ok(unsafe { std::slice::from_raw_parts(memory as *const T, len / std::mem::size_of::<T>()) })
    }

    pub fn map_buffer_mut<T>(&mut self, view: BufferView) -> Result<&mut [T]> {
        let (memory, len) = self.map_range(view)?;
        Ok(unsafe {
            std::slice::from_raw_parts_mut(memory as *mut T, len / std::mem::size_of::<T>())
        })
    }

    fn map_range(&mut self, view: BufferView) -> Result<(*mut std::ffi::c_void, usize)> {
        let buffer = self
            .buffers
            .get_ref(view.buf)
            .ok_or(GPUError::InvalidHandle("buffer"))?;
        let mapped = unsafe {
            self.device.map_memory(
                buffer.memory,
                view.offset,
                view.size,
                vk::MemoryMapFlags::empty(),
            )
        }?;
        log::debug!(
            "mapped buffer '{}' from {} to {}",
            buffer.debug_name,
            view.offset,
            view.offset + view.size
        );
        Ok((mapped, view.size as usize))
    }

    pub fn unmap_buffer(&mut self, handle: Handle<Buffer>) -> Result<()> {
        let buffer = self
            .buffers
            .get_ref(handle)
            .ok_or(GPUError::InvalidHandle("buffer"))?;
        unsafe { self.device.unmap_memory(buffer.memory) };
        log::debug!("unmapped buffer '{}'", buffer.debug_name);
        Ok(())
    }

    /// Copies host bytes into the viewed range through a transient mapping.
    pub fn copy_host_to_buffer(&mut self, view: BufferView, data: &[u8]) -> Result<()> {
        if data.len() as u64 != view.size {
            return Err(GPUError::MismatchedCopySize {
                src: data.len() as u64,
                dst: view.size,
            });
        }
        if view.size == 0 {
            log::warn!("ignored zero-sized host-to-buffer copy");
            return Ok(());
        }
        let mapped: &mut [u8] = self.map_buffer_mut(view)?;
        mapped.copy_from_slice(data);
        self.unmap_buffer(view.buf)
    }

    /// Copies the viewed range back out to host memory.
    pub fn copy_buffer_to_host(&mut self, view: BufferView, out: &mut [u8]) -> Result<()> {
        if out.len() as u64 != view.size {
            return Err(GPUError::MismatchedCopySize {
                src: view.size,
                dst: out.len() as u64,
            });
        }
        if view.size == 0 {
            log::warn!("ignored zero-sized buffer-to-host copy");
            return Ok(());
        }
        let mapped: &[u8] = self.map_buffer(view)?;
        out.copy_from_slice(mapped);
        self.unmap_buffer(view.buf)
    }

    /// The usage set a buffer was created with.
    pub fn buffer_usage(&self, handle: Handle<Buffer>) -> Result<BufferUsage> {
        self.buffers
            .get_ref(handle)
            .map(|b| b.usage)
            .ok_or(GPUError::InvalidHandle("buffer"))
    }

    /// The host access mode a buffer was created with.
    pub fn buffer_host_access(&self, handle: Handle<Buffer>) -> Result<MemoryAccess> {
        self.buffers
            .get_ref(handle)
            .map(|b| b.host_access)
            .ok_or(GPUError::InvalidHandle("buffer"))
    }

    /// A view spanning a whole buffer.
    pub fn whole_buffer(&self, handle: Handle<Buffer>) -> Result<BufferView> {
        let buffer = self
            .buffers
            .get_ref(handle)
            .ok_or(GPUError::InvalidHandle("buffer"))?;
        Ok(BufferView::new(handle, 0, buffer.size))
    }
}

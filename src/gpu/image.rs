use super::{
    image_usage_to_vk, pixel_format_to_vk, Context, GPUError, ImageInfo, ImageUsage, ImageView,
    PixelFormat, Result,
};
use crate::utils::Handle;
use ash::vk;

/// A 2D device image plus its dedicated allocation. Non-staging images carry
/// a color-aspect view; staging images are linear, preinitialized, and
/// host-mappable instead.
pub struct Image {
    pub(crate) img: vk::Image,
    pub(crate) memory: vk::DeviceMemory,
    pub(crate) view: vk::ImageView,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) vk_format: vk::Format,
    pub(crate) format: PixelFormat,
    pub(crate) usage: ImageUsage,
    pub(crate) is_staging: bool,
    pub(crate) debug_name: String,
}

impl Image {
    pub(crate) fn destroy(self, device: &ash::Device) {
        unsafe {
            if self.view != vk::ImageView::null() {
                device.destroy_image_view(self.view, None);
            }
            device.destroy_image(self.img, None);
            device.free_memory(self.memory, None);
        }
        log::debug!("destroyed image '{}'", self.debug_name);
    }
}

impl Context {
    pub fn make_image(&mut self, info: &ImageInfo) -> Result<Handle<Image>> {
        let is_staging = info.usage.contains(ImageUsage::STAGING);
        if is_staging && info.usage != ImageUsage::STAGING {
            return Err(GPUError::StagingUsageConflict);
        }

        let format = pixel_format_to_vk(&info.format)?;
        let usage = image_usage_to_vk(info.usage);
        let tiling = if is_staging {
            vk::ImageTiling::LINEAR
        } else {
            vk::ImageTiling::OPTIMAL
        };
        let initial_layout = if is_staging {
            vk::ImageLayout::PREINITIALIZED
        } else {
            vk::ImageLayout::UNDEFINED
        };

        // Fail fast when the device cannot serve this format/usage pairing.
        unsafe {
            self.instance.get_physical_device_image_format_properties(
                self.pdevice,
                format,
                vk::ImageType::TYPE_2D,
                tiling,
                usage,
                vk::ImageCreateFlags::empty(),
            )
        }?;

        let img = unsafe {
            self.device.create_image(
                &vk::ImageCreateInfo::builder()
                    .image_type(vk::ImageType::TYPE_2D)
                    .format(format)
                    .extent(vk::Extent3D {
                        width: info.width,
                        height: info.height,
                        depth: 1,
                    })
                    .mip_levels(1)
                    .array_layers(1)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .tiling(tiling)
                    .usage(usage)
                    .sharing_mode(vk::SharingMode::EXCLUSIVE)
                    .initial_layout(initial_layout)
                    .build(),
                None,
            )
        }?;

        let reqs = unsafe { self.device.get_image_memory_requirements(img) };
        let memory = match self.allocate_dedicated(&reqs, info.host_access) {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { self.device.destroy_image(img, None) };
                return Err(err);
            }
        };
        unsafe { self.device.bind_image_memory(img, memory, 0) }?;

        let view = if is_staging {
            vk::ImageView::null()
        } else {
            unsafe {
                self.device.create_image_view(
                    &vk::ImageViewCreateInfo::builder()
                        .image(img)
                        .view_type(vk::ImageViewType::TYPE_2D)
                        .format(format)
                        .components(vk::ComponentMapping::default())
                        .subresource_range(
                            vk::ImageSubresourceRange::builder()
                                .aspect_mask(vk::ImageAspectFlags::COLOR)
                                .base_array_layer(0)
                                .layer_count(1)
                                .base_mip_level(0)
                                .level_count(1)
                                .build(),
                        )
                        .build(),
                    None,
                )
            }?
        };

        log::debug!("created image '{}'", info.debug_name);
        self.images
            .insert(Image {
                img,
                memory,
                view,
                width: info.width,
                height: info.height,
                vk_format: format,
                format: info.format,
                usage: info.usage,
                is_staging,
                debug_name: info.debug_name.to_string(),
            })
            .ok_or(GPUError::SlotError())
    }

    /// Destroying a handle twice is a no-op.
    pub fn destroy_image(&mut self, handle: Handle<Image>) {
        match self.images.take(handle) {
            Some(image) => image.destroy(&self.device),
            None => log::warn!("ignored destroy of dead image handle"),
        }
    }

    /// Maps the image's subresource and returns the bytes plus the row pitch.
    /// Only sensible for staging images; the caller must guarantee no
    /// concurrent device access.
    pub fn map_image<T>(&mut self, view: ImageView) -> Result<(&mut [T], usize)> {
        let image = self
            .images
            .get_ref(view.img)
            .ok_or(GPUError::InvalidHandle("image"))?;
        if !image.is_staging {
            // Subresource layouts are only queryable for linear images.
            return Err(GPUError::InvalidHandle("only staging images are host-mappable"));
        }
        let layout = unsafe {
            self.device.get_image_subresource_layout(
                image.img,
                vk::ImageSubresource {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    array_layer: 0,
                },
            )
        };
        let mapped = unsafe {
            self.device.map_memory(
                image.memory,
                layout.offset,
                layout.size,
                vk::MemoryMapFlags::empty(),
            )
        }?;
        log::debug!(
            "mapped image '{}' from ({}, {}) to ({}, {})",
            image.debug_name,
            view.x,
            view.y,
            view.x + view.width,
            view.y + view.height
        );
        let slice = unsafe {
            std::slice::from_raw_parts_mut(
                mapped as *mut T,
                layout.size as usize / std::mem::size_of::<T>(),
            )
        };
        Ok((slice, layout.row_pitch as usize))
    }

    pub fn unmap_image(&mut self, handle: Handle<Image>) -> Result<()> {
        let image = self
            .images
            .get_ref(handle)
            .ok_or(GPUError::InvalidHandle("image"))?;
        unsafe { self.device.unmap_memory(image.memory) };
        log::debug!("unmapped image '{}'", image.debug_name);
        Ok(())
    }

    /// The pixel format an image was created with.
    pub fn image_format(&self, handle: Handle<Image>) -> Result<PixelFormat> {
        self.images
            .get_ref(handle)
            .map(|i| i.format)
            .ok_or(GPUError::InvalidHandle("image"))
    }

    /// The usage set an image was created with.
    pub fn image_usage(&self, handle: Handle<Image>) -> Result<ImageUsage> {
        self.images
            .get_ref(handle)
            .map(|i| i.usage)
            .ok_or(GPUError::InvalidHandle("image"))
    }

    /// A view spanning a whole image.
    pub fn whole_image(&self, handle: Handle<Image>) -> Result<ImageView> {
        let image = self
            .images
            .get_ref(handle)
            .ok_or(GPUError::InvalidHandle("image"))?;
        Ok(ImageView::new(handle, 0, 0, image.width, image.height))
    }
}

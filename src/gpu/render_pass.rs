use super::{Context, GPUError, Image, RenderPassInfo, Result};
use crate::utils::Handle;
use ash::vk;

/// One color attachment bundled with a render pass object, a framebuffer,
/// and a viewport covering the attachment's full extent. References its
/// attachment image without owning it.
pub struct RenderPass {
    pub(crate) raw: vk::RenderPass,
    pub(crate) framebuffer: vk::Framebuffer,
    pub(crate) extent: vk::Extent2D,
    pub(crate) clear_value: vk::ClearValue,
    pub(crate) attachment: Handle<Image>,
    pub(crate) debug_name: String,
}

impl RenderPass {
    pub(crate) fn destroy(self, device: &ash::Device) {
        unsafe {
            device.destroy_framebuffer(self.framebuffer, None);
            device.destroy_render_pass(self.raw, None);
        }
        log::debug!("destroyed render pass '{}'", self.debug_name);
    }
}

impl Context {
    pub fn make_render_pass(&mut self, info: &RenderPassInfo) -> Result<Handle<RenderPass>> {
        let (format, view, width, height) = {
            let image = self
                .images
                .get_ref(info.attachment)
                .ok_or(GPUError::InvalidHandle("attachment image"))?;
            if image.view == vk::ImageView::null() {
                return Err(GPUError::InvalidHandle("staging image as attachment"));
            }
            (image.vk_format, image.view, image.width, image.height)
        };

        let attachments = [vk::AttachmentDescription::builder()
            .format(format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .build()];
        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let subpasses = [vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)
            .build()];

        let raw = unsafe {
            self.device.create_render_pass(
                &vk::RenderPassCreateInfo::builder()
                    .attachments(&attachments)
                    .subpasses(&subpasses)
                    .build(),
                None,
            )
        }?;

        let fb_views = [view];
        let framebuffer = unsafe {
            self.device.create_framebuffer(
                &vk::FramebufferCreateInfo::builder()
                    .render_pass(raw)
                    .attachments(&fb_views)
                    .width(width)
                    .height(height)
                    .layers(1)
                    .build(),
                None,
            )
        }?;

        log::debug!("created render pass '{}'", info.debug_name);
        self.render_passes
            .insert(RenderPass {
                raw,
                framebuffer,
                extent: vk::Extent2D { width, height },
                clear_value: vk::ClearValue {
                    color: vk::ClearColorValue {
                        float32: info.clear_color,
                    },
                },
                attachment: info.attachment,
                debug_name: info.debug_name.to_string(),
            })
            .ok_or(GPUError::SlotError())
    }

    /// Destroying a handle twice is a no-op.
    pub fn destroy_render_pass(&mut self, handle: Handle<RenderPass>) {
        match self.render_passes.take(handle) {
            Some(pass) => pass.destroy(&self.device),
            None => log::warn!("ignored destroy of dead render pass handle"),
        }
    }

    /// The image a render pass draws into.
    pub fn render_pass_attachment(&self, handle: Handle<RenderPass>) -> Result<Handle<Image>> {
        self.render_passes
            .get_ref(handle)
            .map(|pass| pass.attachment)
            .ok_or(GPUError::InvalidHandle("render pass"))
    }
}

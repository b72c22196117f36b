use super::{
    buffer_barrier_params, image_barrier_params, BarrierSide, BeginRenderPass, BufferBarrier,
    BufferCopy, BufferImageCopy, Command, Context, Dispatch, Draw, DrawIndexed, GPUError,
    ImageBarrier, ImageBufferCopy, ImageCopy, Result, SubmitType,
};
use crate::utils::Handle;
use ash::vk;

/// One queue-family-bound command buffer in a recording, with the semaphores
/// that chain it to its neighbours. Detail *i* waits on detail *i-1*'s signal
/// semaphore; detail 0 waits on nothing. The final signal semaphore is unused
/// but created anyway so every detail has the same shape.
pub(crate) struct SubmitDetail {
    pub submit_type: SubmitType,
    pub cmd_pool: vk::CommandPool,
    pub cmd_buf: vk::CommandBuffer,
    pub wait_sema: Option<vk::Semaphore>,
    pub signal_sema: vk::Semaphore,
}

/// In-flight translation state: the submit details recorded so far and the
/// command-buffer level being recorded at. Primary recordings submit each
/// detail as soon as the class changes; secondary recordings only collect.
pub(crate) struct Recording {
    pub details: Vec<SubmitDetail>,
    pub level: vk::CommandBufferLevel,
}

impl Recording {
    pub fn new(level: vk::CommandBufferLevel) -> Self {
        Self {
            details: Vec::new(),
            level,
        }
    }

    pub fn current_type(&self) -> Option<SubmitType> {
        self.details.last().map(|d| d.submit_type)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClassDecision {
    /// The command joins the currently open command buffer.
    Reuse,
    /// The current buffer (if any) must be flushed and a new one opened for
    /// this class.
    Open(SubmitType),
}

/// Decides whether a command of `required` class continues the current run or
/// starts a new one. Commands of `Any` class inherit the open detail's class;
/// recording one with no detail open is a caller bug.
pub(crate) fn resolve_submit_type(
    current: Option<SubmitType>,
    required: SubmitType,
) -> ClassDecision {
    match required {
        SubmitType::Any => match current {
            Some(_) => ClassDecision::Reuse,
            None => panic!("cannot infer submit type for a submit-type-independent command"),
        },
        ty => match current {
            Some(cur) if cur == ty => ClassDecision::Reuse,
            _ => ClassDecision::Open(ty),
        },
    }
}

impl Context {
    /// Returns a command buffer able to hold a command of `required` class,
    /// opening (and, at primary level, submitting the predecessor of) a new
    /// submit detail when the class changes.
    fn acquire_cmd_buf(
        &mut self,
        rec: &mut Recording,
        required: SubmitType,
    ) -> Result<vk::CommandBuffer> {
        let ty = match resolve_submit_type(rec.current_type(), required) {
            ClassDecision::Reuse => return Ok(rec.details.last().unwrap().cmd_buf),
            ClassDecision::Open(ty) => ty,
        };
        let queue = self.submit_queue(ty)?;

        if let Some(last) = rec.details.last() {
            unsafe { self.device.end_command_buffer(last.cmd_buf) }?;
            if rec.level == vk::CommandBufferLevel::PRIMARY {
                self.submit_one(last, vk::Fence::null())?;
            }
        }

        let cmd_pool = unsafe {
            self.device.create_command_pool(
                &vk::CommandPoolCreateInfo::builder()
                    .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
                    .queue_family_index(queue.qfam_idx)
                    .build(),
                None,
            )
        }?;
        let cmd_buf = unsafe {
            self.device.allocate_command_buffers(
                &vk::CommandBufferAllocateInfo::builder()
                    .command_pool(cmd_pool)
                    .level(rec.level)
                    .command_buffer_count(1)
                    .build(),
            )
        }?[0];
        let wait_sema = rec.details.last().map(|d| d.signal_sema);
        let signal_sema = unsafe {
            self.device
                .create_semaphore(&vk::SemaphoreCreateInfo::builder().build(), None)
        }?;

        let inheritance = vk::CommandBufferInheritanceInfo::default();
        let mut begin = vk::CommandBufferBeginInfo::builder();
        if rec.level == vk::CommandBufferLevel::SECONDARY {
            // Transactions may be inlined any number of times, including
            // twice into the same primary.
            let mut flags = vk::CommandBufferUsageFlags::SIMULTANEOUS_USE;
            if ty == SubmitType::Graphics {
                flags |= vk::CommandBufferUsageFlags::RENDER_PASS_CONTINUE;
            }
            begin = begin.inheritance_info(&inheritance).flags(flags);
        }
        unsafe { self.device.begin_command_buffer(cmd_buf, &begin.build()) }?;

        rec.details.push(SubmitDetail {
            submit_type: ty,
            cmd_pool,
            cmd_buf,
            wait_sema,
            signal_sema,
        });
        Ok(cmd_buf)
    }

    /// Submits one detail to its class queue, waiting on the previous
    /// detail's signal semaphore when there is one.
    pub(crate) fn submit_one(&self, detail: &SubmitDetail, fence: vk::Fence) -> Result<()> {
        let queue = self.submit_queue(detail.submit_type)?.queue;
        let cmd_bufs = [detail.cmd_buf];
        let signal_semas = [detail.signal_sema];
        let wait_semas: Vec<vk::Semaphore> = detail.wait_sema.into_iter().collect();
        let wait_stages = vec![vk::PipelineStageFlags::TOP_OF_PIPE; wait_semas.len()];
        let submit = vk::SubmitInfo::builder()
            .command_buffers(&cmd_bufs)
            .signal_semaphores(&signal_semas)
            .wait_semaphores(&wait_semas)
            .wait_dst_stage_mask(&wait_stages)
            .build();
        unsafe { self.device.queue_submit(queue, &[submit], fence) }?;
        Ok(())
    }

    /// Destroys the command pools and signal semaphores of a detail list.
    /// Only safe once the device is done with them.
    pub(crate) fn release_submit_details(&self, details: &mut Vec<SubmitDetail>) {
        for detail in details.drain(..) {
            unsafe {
                self.device.destroy_semaphore(detail.signal_sema, None);
                self.device.destroy_command_pool(detail.cmd_pool, None);
            }
        }
    }

    pub(crate) fn record_commands(&mut self, rec: &mut Recording, cmds: &[Command]) -> Result<()> {
        for cmd in cmds {
            self.record_command(rec, cmd)?;
        }
        Ok(())
    }

    fn record_command(&mut self, rec: &mut Recording, cmd: &Command) -> Result<()> {
        match cmd {
            Command::SetSubmitType(ty) => {
                self.acquire_cmd_buf(rec, *ty)?;
                if rec.level == vk::CommandBufferLevel::PRIMARY {
                    log::debug!("submit type forced to {:?}", ty);
                }
                Ok(())
            }
            Command::InlineTransaction(transaction) => {
                self.record_inline_transaction(rec, *transaction)
            }
            Command::CopyBuffer(copy) => self.record_copy_buffer(rec, copy),
            Command::CopyBufferToImage(copy) => self.record_copy_buffer_to_image(rec, copy),
            Command::CopyImageToBuffer(copy) => self.record_copy_image_to_buffer(rec, copy),
            Command::CopyImage(copy) => self.record_copy_image(rec, copy),
            Command::Dispatch(dispatch) => self.record_dispatch(rec, dispatch),
            Command::Draw(draw) => self.record_draw(rec, draw),
            Command::DrawIndexed(draw) => self.record_draw_indexed(rec, draw),
            Command::WriteTimestamp(timestamp) => self.record_write_timestamp(rec, *timestamp),
            Command::BufferBarrier(barrier) => self.record_buffer_barrier(rec, barrier),
            Command::ImageBarrier(barrier) => self.record_image_barrier(rec, barrier),
            Command::BeginRenderPass(begin) => self.record_begin_render_pass(rec, begin),
            Command::EndRenderPass => self.record_end_render_pass(rec),
        }
    }

    fn record_inline_transaction(
        &mut self,
        rec: &mut Recording,
        handle: Handle<super::Transaction>,
    ) -> Result<()> {
        assert!(
            rec.level == vk::CommandBufferLevel::PRIMARY,
            "nested inline transaction is not allowed"
        );
        let subs: Vec<(SubmitType, vk::CommandBuffer)> = self
            .transactions
            .get_ref(handle)
            .ok_or(GPUError::InvalidHandle("transaction"))?
            .details
            .iter()
            .map(|d| (d.submit_type, d.cmd_buf))
            .collect();
        for (ty, sub_cmd) in subs {
            let cmd_buf = self.acquire_cmd_buf(rec, ty)?;
            unsafe { self.device.cmd_execute_commands(cmd_buf, &[sub_cmd]) };
        }
        log::debug!("scheduled inline transaction");
        Ok(())
    }

    fn record_copy_buffer(&mut self, rec: &mut Recording, copy: &BufferCopy) -> Result<()> {
        if copy.src.size != copy.dst.size {
            return Err(GPUError::MismatchedCopySize {
                src: copy.src.size,
                dst: copy.dst.size,
            });
        }
        if copy.dst.size == 0 {
            log::warn!("ignored zero-sized buffer copy");
            return Ok(());
        }
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Any)?;
        let src = self
            .buffers
            .get_ref(copy.src.buf)
            .ok_or(GPUError::InvalidHandle("source buffer"))?;
        let dst = self
            .buffers
            .get_ref(copy.dst.buf)
            .ok_or(GPUError::InvalidHandle("destination buffer"))?;
        let region = vk::BufferCopy {
            src_offset: copy.src.offset,
            dst_offset: copy.dst.offset,
            size: copy.dst.size,
        };
        unsafe {
            self.device
                .cmd_copy_buffer(cmd_buf, src.buf, dst.buf, &[region])
        };
        if rec.level == vk::CommandBufferLevel::PRIMARY {
            log::debug!(
                "scheduled copy from buffer '{}' to buffer '{}'",
                src.debug_name,
                dst.debug_name
            );
        }
        Ok(())
    }

    fn record_copy_buffer_to_image(
        &mut self,
        rec: &mut Recording,
        copy: &BufferImageCopy,
    ) -> Result<()> {
        if copy.dst.width == 0 || copy.dst.height == 0 {
            log::warn!("ignored zero-sized buffer-to-image copy");
            return Ok(());
        }
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Any)?;
        let src = self
            .buffers
            .get_ref(copy.src.buf)
            .ok_or(GPUError::InvalidHandle("source buffer"))?;
        let dst = self
            .images
            .get_ref(copy.dst.img)
            .ok_or(GPUError::InvalidHandle("destination image"))?;
        // Rows are tightly packed; the destination must already be in
        // transfer-dst layout.
        let region = vk::BufferImageCopy {
            buffer_offset: copy.src.offset,
            buffer_row_length: 0,
            buffer_image_height: dst.height,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D {
                x: copy.dst.x as i32,
                y: copy.dst.y as i32,
                z: 0,
            },
            image_extent: vk::Extent3D {
                width: copy.dst.width,
                height: copy.dst.height,
                depth: 1,
            },
        };
        unsafe {
            self.device.cmd_copy_buffer_to_image(
                cmd_buf,
                src.buf,
                dst.img,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            )
        };
        if rec.level == vk::CommandBufferLevel::PRIMARY {
            log::debug!(
                "scheduled copy from buffer '{}' to image '{}'",
                src.debug_name,
                dst.debug_name
            );
        }
        Ok(())
    }

    fn record_copy_image_to_buffer(
        &mut self,
        rec: &mut Recording,
        copy: &ImageBufferCopy,
    ) -> Result<()> {
        if copy.src.width == 0 || copy.src.height == 0 {
            log::warn!("ignored zero-sized image-to-buffer copy");
            return Ok(());
        }
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Any)?;
        let src = self
            .images
            .get_ref(copy.src.img)
            .ok_or(GPUError::InvalidHandle("source image"))?;
        let dst = self
            .buffers
            .get_ref(copy.dst.buf)
            .ok_or(GPUError::InvalidHandle("destination buffer"))?;
        let region = vk::BufferImageCopy {
            buffer_offset: copy.dst.offset,
            buffer_row_length: 0,
            buffer_image_height: src.height,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D {
                x: copy.src.x as i32,
                y: copy.src.y as i32,
                z: 0,
            },
            image_extent: vk::Extent3D {
                width: copy.src.width,
                height: copy.src.height,
                depth: 1,
            },
        };
        unsafe {
            self.device.cmd_copy_image_to_buffer(
                cmd_buf,
                src.img,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst.buf,
                &[region],
            )
        };
        if rec.level == vk::CommandBufferLevel::PRIMARY {
            log::debug!(
                "scheduled copy from image '{}' to buffer '{}'",
                src.debug_name,
                dst.debug_name
            );
        }
        Ok(())
    }

    fn record_copy_image(&mut self, rec: &mut Recording, copy: &ImageCopy) -> Result<()> {
        if copy.src.width != copy.dst.width || copy.src.height != copy.dst.height {
            return Err(GPUError::MismatchedCopyExtent {
                src: [copy.src.width, copy.src.height],
                dst: [copy.dst.width, copy.dst.height],
            });
        }
        if copy.dst.width == 0 || copy.dst.height == 0 {
            log::warn!("ignored zero-sized image copy");
            return Ok(());
        }
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Any)?;
        let src = self
            .images
            .get_ref(copy.src.img)
            .ok_or(GPUError::InvalidHandle("source image"))?;
        let dst = self
            .images
            .get_ref(copy.dst.img)
            .ok_or(GPUError::InvalidHandle("destination image"))?;
        let subresource = vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        };
        let region = vk::ImageCopy {
            src_subresource: subresource,
            src_offset: vk::Offset3D {
                x: copy.src.x as i32,
                y: copy.src.y as i32,
                z: 0,
            },
            dst_subresource: subresource,
            dst_offset: vk::Offset3D {
                x: copy.dst.x as i32,
                y: copy.dst.y as i32,
                z: 0,
            },
            extent: vk::Extent3D {
                width: copy.dst.width,
                height: copy.dst.height,
                depth: 1,
            },
        };
        unsafe {
            self.device.cmd_copy_image(
                cmd_buf,
                src.img,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst.img,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            )
        };
        if rec.level == vk::CommandBufferLevel::PRIMARY {
            log::debug!(
                "scheduled copy from image '{}' to image '{}'",
                src.debug_name,
                dst.debug_name
            );
        }
        Ok(())
    }

    fn record_dispatch(&mut self, rec: &mut Recording, dispatch: &Dispatch) -> Result<()> {
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Compute)?;
        let task = self
            .tasks
            .get_ref(dispatch.task)
            .ok_or(GPUError::InvalidHandle("task"))?;
        let pool = self
            .resource_pools
            .get_ref(dispatch.pool)
            .ok_or(GPUError::InvalidHandle("resource pool"))?;
        unsafe {
            self.device
                .cmd_bind_pipeline(cmd_buf, vk::PipelineBindPoint::COMPUTE, task.pipeline);
            if pool.desc_set != vk::DescriptorSet::null() {
                self.device.cmd_bind_descriptor_sets(
                    cmd_buf,
                    vk::PipelineBindPoint::COMPUTE,
                    task.pipe_layout,
                    0,
                    &[pool.desc_set],
                    &[],
                );
            }
            self.device.cmd_dispatch(
                cmd_buf,
                dispatch.workgroups[0],
                dispatch.workgroups[1],
                dispatch.workgroups[2],
            );
        }
        if rec.level == vk::CommandBufferLevel::PRIMARY {
            log::debug!("scheduled compute task '{}' for execution", task.debug_name);
        }
        Ok(())
    }

    fn record_draw(&mut self, rec: &mut Recording, draw: &Draw) -> Result<()> {
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Graphics)?;
        let task = self
            .tasks
            .get_ref(draw.task)
            .ok_or(GPUError::InvalidHandle("task"))?;
        let pool = self
            .resource_pools
            .get_ref(draw.pool)
            .ok_or(GPUError::InvalidHandle("resource pool"))?;
        let verts = self
            .buffers
            .get_ref(draw.vertices.buf)
            .ok_or(GPUError::InvalidHandle("vertex buffer"))?;
        unsafe {
            self.device
                .cmd_bind_pipeline(cmd_buf, vk::PipelineBindPoint::GRAPHICS, task.pipeline);
            if pool.desc_set != vk::DescriptorSet::null() {
                self.device.cmd_bind_descriptor_sets(
                    cmd_buf,
                    vk::PipelineBindPoint::GRAPHICS,
                    task.pipe_layout,
                    0,
                    &[pool.desc_set],
                    &[],
                );
            }
            self.device
                .cmd_bind_vertex_buffers(cmd_buf, 0, &[verts.buf], &[draw.vertices.offset]);
            self.device
                .cmd_draw(cmd_buf, draw.vertex_count, draw.instance_count, 0, 0);
        }
        if rec.level == vk::CommandBufferLevel::PRIMARY {
            log::debug!(
                "scheduled graphics task '{}' for execution",
                task.debug_name
            );
        }
        Ok(())
    }

    fn record_draw_indexed(&mut self, rec: &mut Recording, draw: &DrawIndexed) -> Result<()> {
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Graphics)?;
        let task = self
            .tasks
            .get_ref(draw.task)
            .ok_or(GPUError::InvalidHandle("task"))?;
        let pool = self
            .resource_pools
            .get_ref(draw.pool)
            .ok_or(GPUError::InvalidHandle("resource pool"))?;
        let verts = self
            .buffers
            .get_ref(draw.vertices.buf)
            .ok_or(GPUError::InvalidHandle("vertex buffer"))?;
        let idxs = self
            .buffers
            .get_ref(draw.indices.buf)
            .ok_or(GPUError::InvalidHandle("index buffer"))?;
        unsafe {
            self.device
                .cmd_bind_pipeline(cmd_buf, vk::PipelineBindPoint::GRAPHICS, task.pipeline);
            if pool.desc_set != vk::DescriptorSet::null() {
                self.device.cmd_bind_descriptor_sets(
                    cmd_buf,
                    vk::PipelineBindPoint::GRAPHICS,
                    task.pipe_layout,
                    0,
                    &[pool.desc_set],
                    &[],
                );
            }
            self.device
                .cmd_bind_vertex_buffers(cmd_buf, 0, &[verts.buf], &[draw.vertices.offset]);
            self.device.cmd_bind_index_buffer(
                cmd_buf,
                idxs.buf,
                draw.indices.offset,
                vk::IndexType::UINT16,
            );
            self.device
                .cmd_draw_indexed(cmd_buf, draw.index_count, draw.instance_count, 0, 0, 0);
        }
        if rec.level == vk::CommandBufferLevel::PRIMARY {
            log::debug!(
                "scheduled graphics task '{}' for execution",
                task.debug_name
            );
        }
        Ok(())
    }

    fn record_write_timestamp(
        &mut self,
        rec: &mut Recording,
        timestamp: Handle<super::Timestamp>,
    ) -> Result<()> {
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Any)?;
        let query_pool = self
            .timestamps
            .get_ref(timestamp)
            .ok_or(GPUError::InvalidHandle("timestamp"))?
            .query_pool;
        unsafe {
            self.device.cmd_reset_query_pool(cmd_buf, query_pool, 0, 1);
            self.device.cmd_write_timestamp(
                cmd_buf,
                vk::PipelineStageFlags::ALL_COMMANDS,
                query_pool,
                0,
            );
        }
        if rec.level == vk::CommandBufferLevel::PRIMARY {
            log::debug!("scheduled timestamp write");
        }
        Ok(())
    }

    fn record_buffer_barrier(&mut self, rec: &mut Recording, barrier: &BufferBarrier) -> Result<()> {
        let (src_access, src_stage) =
            buffer_barrier_params(barrier.src_usage, barrier.src_access, BarrierSide::Source)?;
        let (dst_access, dst_stage) = buffer_barrier_params(
            barrier.dst_usage,
            barrier.dst_access,
            BarrierSide::Destination,
        )?;
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Any)?;
        let buf = self
            .buffers
            .get_ref(barrier.buf)
            .ok_or(GPUError::InvalidHandle("buffer"))?;

        let mem_barrier = vk::BufferMemoryBarrier::builder()
            .buffer(buf.buf)
            .src_access_mask(src_access)
            .dst_access_mask(dst_access)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .offset(0)
            .size(vk::WHOLE_SIZE)
            .build();
        unsafe {
            self.device.cmd_pipeline_barrier(
                cmd_buf,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[mem_barrier],
                &[],
            )
        };
        if rec.level == vk::CommandBufferLevel::PRIMARY {
            log::debug!("scheduled buffer barrier");
        }
        Ok(())
    }

    fn record_image_barrier(&mut self, rec: &mut Recording, barrier: &ImageBarrier) -> Result<()> {
        let (src_access, src_stage, old_layout) =
            image_barrier_params(barrier.src_usage, barrier.src_access, BarrierSide::Source)?;
        let (dst_access, dst_stage, new_layout) = image_barrier_params(
            barrier.dst_usage,
            barrier.dst_access,
            BarrierSide::Destination,
        )?;
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Any)?;
        let img = self
            .images
            .get_ref(barrier.img)
            .ok_or(GPUError::InvalidHandle("image"))?;

        let mem_barrier = vk::ImageMemoryBarrier::builder()
            .image(img.img)
            .src_access_mask(src_access)
            .dst_access_mask(dst_access)
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .subresource_range(
                vk::ImageSubresourceRange::builder()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_array_layer(0)
                    .layer_count(vk::REMAINING_ARRAY_LAYERS)
                    .base_mip_level(0)
                    .level_count(vk::REMAINING_MIP_LEVELS)
                    .build(),
            )
            .build();
        unsafe {
            self.device.cmd_pipeline_barrier(
                cmd_buf,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[mem_barrier],
            )
        };
        if rec.level == vk::CommandBufferLevel::PRIMARY {
            log::debug!("scheduled image barrier");
        }
        Ok(())
    }

    fn record_begin_render_pass(
        &mut self,
        rec: &mut Recording,
        begin: &BeginRenderPass,
    ) -> Result<()> {
        assert!(
            rec.level == vk::CommandBufferLevel::PRIMARY,
            "render pass commands must be recorded at primary level"
        );
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Graphics)?;
        let pass = self
            .render_passes
            .get_ref(begin.pass)
            .ok_or(GPUError::InvalidHandle("render pass"))?;
        let clear_values = [pass.clear_value];
        let begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(pass.raw)
            .framebuffer(pass.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: pass.extent,
            })
            .clear_values(&clear_values)
            .build();
        let contents = if begin.draw_inline {
            vk::SubpassContents::INLINE
        } else {
            vk::SubpassContents::SECONDARY_COMMAND_BUFFERS
        };
        unsafe {
            self.device
                .cmd_begin_render_pass(cmd_buf, &begin_info, contents)
        };
        log::debug!("scheduled render pass begin");
        Ok(())
    }

    fn record_end_render_pass(&mut self, rec: &mut Recording) -> Result<()> {
        assert!(
            rec.level == vk::CommandBufferLevel::PRIMARY,
            "render pass commands must be recorded at primary level"
        );
        let cmd_buf = self.acquire_cmd_buf(rec, SubmitType::Graphics)?;
        unsafe { self.device.cmd_end_render_pass(cmd_buf) };
        log::debug!("scheduled render pass end");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drives the class-resolution logic over a command-class sequence and
    /// returns the classes of the details that would be opened.
    fn simulate(required: &[SubmitType]) -> Vec<SubmitType> {
        let mut opened = Vec::new();
        for &req in required {
            match resolve_submit_type(opened.last().copied(), req) {
                ClassDecision::Reuse => {}
                ClassDecision::Open(ty) => opened.push(ty),
            }
        }
        opened
    }

    #[test]
    fn contiguous_runs_share_one_detail() {
        use SubmitType::*;
        let opened = simulate(&[Compute, Any, Any, Compute, Any]);
        assert_eq!(opened, vec![Compute]);
    }

    #[test]
    fn class_changes_open_new_details() {
        use SubmitType::*;
        let opened = simulate(&[Compute, Any, Graphics, Graphics, Any, Compute]);
        assert_eq!(opened, vec![Compute, Graphics, Compute]);
    }

    #[test]
    fn adjacent_runs_always_have_distinct_classes() {
        use SubmitType::*;
        // Whatever the input order, two neighbouring opened details never
        // share a class: sharing one would have been a reuse.
        let seqs: &[&[SubmitType]] = &[
            &[Graphics, Compute, Graphics, Compute],
            &[Compute, Compute, Graphics, Any, Graphics, Compute, Any],
            &[Graphics, Any, Any, Any, Compute],
        ];
        for seq in seqs {
            let opened = simulate(seq);
            for pair in opened.windows(2) {
                assert_ne!(pair[0], pair[1]);
            }
        }
    }

    #[test]
    #[should_panic(expected = "cannot infer submit type")]
    fn any_class_without_open_detail_is_a_bug() {
        resolve_submit_type(None, SubmitType::Any);
    }

    #[test]
    fn set_submit_type_is_idempotent_for_the_open_class() {
        assert_eq!(
            resolve_submit_type(Some(SubmitType::Compute), SubmitType::Compute),
            ClassDecision::Reuse
        );
        assert_eq!(
            resolve_submit_type(Some(SubmitType::Compute), SubmitType::Graphics),
            ClassDecision::Open(SubmitType::Graphics)
        );
    }
}

use super::{
    BufferUsage, BufferView, ImageUsage, ImageView, MemoryAccess, RenderPass, ResourcePool,
    SubmitType, Task, Timestamp, Transaction,
};
use crate::utils::Handle;
use super::{Buffer, Image};

#[derive(Clone, Copy, Debug, Default)]
pub struct BufferCopy {
    pub src: BufferView,
    pub dst: BufferView,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BufferImageCopy {
    pub src: BufferView,
    pub dst: ImageView,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ImageBufferCopy {
    pub src: ImageView,
    pub dst: BufferView,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ImageCopy {
    pub src: ImageView,
    pub dst: ImageView,
}

#[derive(Clone, Copy, Debug)]
pub struct Dispatch {
    pub task: Handle<Task>,
    pub pool: Handle<ResourcePool>,
    pub workgroups: [u32; 3],
}

impl Default for Dispatch {
    fn default() -> Self {
        Self {
            task: Default::default(),
            pool: Default::default(),
            workgroups: [1, 1, 1],
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Draw {
    pub task: Handle<Task>,
    pub pool: Handle<ResourcePool>,
    pub vertices: BufferView,
    pub vertex_count: u32,
    pub instance_count: u32,
}

impl Default for Draw {
    fn default() -> Self {
        Self {
            task: Default::default(),
            pool: Default::default(),
            vertices: Default::default(),
            vertex_count: 0,
            instance_count: 1,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DrawIndexed {
    pub task: Handle<Task>,
    pub pool: Handle<ResourcePool>,
    pub vertices: BufferView,
    pub indices: BufferView,
    pub index_count: u32,
    pub instance_count: u32,
}

impl Default for DrawIndexed {
    fn default() -> Self {
        Self {
            task: Default::default(),
            pool: Default::default(),
            vertices: Default::default(),
            indices: Default::default(),
            index_count: 0,
            instance_count: 1,
        }
    }
}

/// Transition a buffer between two usage/device-access states. The source and
/// destination pairs are looked up in the barrier translation table; the
/// barrier always covers the whole buffer.
#[derive(Clone, Copy, Debug)]
pub struct BufferBarrier {
    pub buf: Handle<Buffer>,
    pub src_usage: BufferUsage,
    pub src_access: MemoryAccess,
    pub dst_usage: BufferUsage,
    pub dst_access: MemoryAccess,
}

/// Same as [`BufferBarrier`], plus the implied old/new image layouts. Covers
/// every array layer and mip level of the color aspect.
#[derive(Clone, Copy, Debug)]
pub struct ImageBarrier {
    pub img: Handle<Image>,
    pub src_usage: ImageUsage,
    pub src_access: MemoryAccess,
    pub dst_usage: ImageUsage,
    pub dst_access: MemoryAccess,
}

#[derive(Clone, Copy, Debug)]
pub struct BeginRenderPass {
    pub pass: Handle<RenderPass>,
    pub draw_inline: bool,
}

/// A device-agnostic command. A sequence of these is translated into one or
/// more queue-family-bound command buffers by the recording engine.
#[derive(Clone, Copy, Debug)]
pub enum Command {
    SetSubmitType(SubmitType),
    InlineTransaction(Handle<Transaction>),
    CopyBuffer(BufferCopy),
    CopyBufferToImage(BufferImageCopy),
    CopyImageToBuffer(ImageBufferCopy),
    CopyImage(ImageCopy),
    Dispatch(Dispatch),
    Draw(Draw),
    DrawIndexed(DrawIndexed),
    WriteTimestamp(Handle<Timestamp>),
    BufferBarrier(BufferBarrier),
    ImageBarrier(ImageBarrier),
    BeginRenderPass(BeginRenderPass),
    EndRenderPass,
}

impl Command {
    /// The submit class this command requires. `Any` inherits the class of
    /// whatever command buffer is currently open.
    pub fn submit_type(&self) -> SubmitType {
        match self {
            Command::SetSubmitType(ty) => *ty,
            Command::Dispatch(_) => SubmitType::Compute,
            Command::Draw(_)
            | Command::DrawIndexed(_)
            | Command::BeginRenderPass(_)
            | Command::EndRenderPass => SubmitType::Graphics,
            _ => SubmitType::Any,
        }
    }
}

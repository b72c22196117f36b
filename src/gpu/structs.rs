use super::{Buffer, Image, RenderPass};
use crate::utils::Handle;
use bitflags::bitflags;

#[cfg(feature = "koji-serde")]
use serde::{Deserialize, Serialize};

/// Intended traffic pattern against a resource. Used both for the host side
/// (memory-type selection) and the device side (barrier translation).
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "koji-serde", derive(Serialize, Deserialize))]
pub enum MemoryAccess {
    #[default]
    None,
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Coarse partition of device work. Selects the queue family a command
/// buffer is bound to.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "koji-serde", derive(Serialize, Deserialize))]
pub enum SubmitType {
    #[default]
    Any,
    Graphics,
    Compute,
}

bitflags! {
    #[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BufferUsage: u32 {
        const STAGING = 0b00001;
        const UNIFORM = 0b00010;
        const STORAGE = 0b00100;
        const VERTEX  = 0b01000;
        const INDEX   = 0b10000;
    }
}

bitflags! {
    #[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ImageUsage: u32 {
        const SAMPLED    = 0b00001;
        const STORAGE    = 0b00010;
        const ATTACHMENT = 0b00100;
        const PRESENT    = 0b01000;
        const STAGING    = 0b10000;
    }
}

/// Kinds of resources a shader binding can name.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "koji-serde", derive(Serialize, Deserialize))]
pub enum ResourceType {
    UniformBuffer,
    StorageBuffer,
    SampledImage,
    StorageImage,
}

impl ResourceType {
    pub fn is_buffer(&self) -> bool {
        matches!(self, ResourceType::UniformBuffer | ResourceType::StorageBuffer)
    }
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "koji-serde", derive(Serialize, Deserialize))]
pub enum Topology {
    PointList,
    LineList,
    #[default]
    TriangleList,
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "koji-serde", derive(Serialize, Deserialize))]
pub enum VertexRate {
    #[default]
    Vertex,
    Instance,
}

/// Structural pixel format descriptor. `int_exp2` is the log2 byte width of
/// an integer component (1 = 8 bit, 2 = 16 bit, 3 = 32 bit).
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "koji-serde", derive(Serialize, Deserialize))]
pub struct PixelFormat {
    pub ncomp: u32,
    pub int_exp2: u32,
    pub is_signed: bool,
    pub is_single: bool,
    pub is_half: bool,
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::rgba8()
    }
}

impl PixelFormat {
    pub const fn rgba8() -> Self {
        Self {
            ncomp: 4,
            int_exp2: 1,
            is_signed: false,
            is_single: false,
            is_half: false,
        }
    }

    pub const fn r32f() -> Self {
        Self {
            ncomp: 1,
            int_exp2: 3,
            is_signed: true,
            is_single: true,
            is_half: false,
        }
    }

    pub const fn rgba32f() -> Self {
        Self {
            ncomp: 4,
            int_exp2: 3,
            is_signed: true,
            is_single: true,
            is_half: false,
        }
    }

    /// Byte size of one pixel.
    pub fn size(&self) -> u32 {
        if self.is_single {
            4 * self.ncomp
        } else if self.is_half {
            2 * self.ncomp
        } else {
            (1 << (self.int_exp2 - 1)) * self.ncomp
        }
    }
}

/// Non-owning byte range of a buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferView {
    pub buf: Handle<Buffer>,
    pub offset: u64,
    pub size: u64,
}

impl BufferView {
    pub fn new(buf: Handle<Buffer>, offset: u64, size: u64) -> Self {
        Self { buf, offset, size }
    }
}

/// Non-owning 2D region of an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageView {
    pub img: Handle<Image>,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageView {
    pub fn new(img: Handle<Image>, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            img,
            x,
            y,
            width,
            height,
        }
    }
}

pub struct ContextInfo<'a> {
    pub debug_name: &'a str,
    pub device_index: usize,
}

impl<'a> Default for ContextInfo<'a> {
    fn default() -> Self {
        Self {
            debug_name: "",
            device_index: 0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BufferInfo<'a> {
    pub debug_name: &'a str,
    pub byte_size: u64,
    pub host_access: MemoryAccess,
    pub usage: BufferUsage,
}

impl<'a> Default for BufferInfo<'a> {
    fn default() -> Self {
        Self {
            debug_name: "",
            byte_size: 1024,
            host_access: MemoryAccess::None,
            usage: BufferUsage::STORAGE,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ImageInfo<'a> {
    pub debug_name: &'a str,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub host_access: MemoryAccess,
    pub usage: ImageUsage,
}

impl<'a> Default for ImageInfo<'a> {
    fn default() -> Self {
        Self {
            debug_name: "",
            width: 1,
            height: 1,
            format: PixelFormat::rgba8(),
            host_access: MemoryAccess::None,
            usage: ImageUsage::SAMPLED,
        }
    }
}

/// One vertex attribute, laid out contiguously in declaration order.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "koji-serde", derive(Serialize, Deserialize))]
pub struct VertexInput {
    pub format: PixelFormat,
    pub rate: VertexRate,
}

pub struct ComputeTaskInfo<'a> {
    pub debug_name: &'a str,
    pub spirv: &'a [u32],
    pub entry: &'a str,
    pub resources: &'a [ResourceType],
    pub workgroup_size: [u32; 3],
}

impl<'a> Default for ComputeTaskInfo<'a> {
    fn default() -> Self {
        Self {
            debug_name: "",
            spirv: &[],
            entry: "main",
            resources: &[],
            workgroup_size: [1, 1, 1],
        }
    }
}

pub struct GraphicsTaskInfo<'a> {
    pub debug_name: &'a str,
    pub pass: Handle<RenderPass>,
    pub vertex_spirv: &'a [u32],
    pub vertex_entry: &'a str,
    pub fragment_spirv: &'a [u32],
    pub fragment_entry: &'a str,
    pub resources: &'a [ResourceType],
    pub vertex_inputs: &'a [VertexInput],
    pub topology: Topology,
}

impl<'a> Default for GraphicsTaskInfo<'a> {
    fn default() -> Self {
        Self {
            debug_name: "",
            pass: Default::default(),
            vertex_spirv: &[],
            vertex_entry: "main",
            fragment_spirv: &[],
            fragment_entry: "main",
            resources: &[],
            vertex_inputs: &[],
            topology: Topology::TriangleList,
        }
    }
}

pub struct RenderPassInfo<'a> {
    pub debug_name: &'a str,
    pub attachment: Handle<Image>,
    pub clear_color: [f32; 4],
}

impl<'a> Default for RenderPassInfo<'a> {
    fn default() -> Self {
        Self {
            debug_name: "",
            attachment: Default::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

pub struct TransactionInfo<'a> {
    pub debug_name: &'a str,
    pub commands: &'a [super::Command],
}

impl<'a> Default for TransactionInfo<'a> {
    fn default() -> Self {
        Self {
            debug_name: "",
            commands: &[],
        }
    }
}

/// Read-only view of one recorded submit detail. Semaphore identities are the
/// raw handle values so tests can verify the device-side dependency chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitSummary {
    pub submit_type: SubmitType,
    pub wait_sema: Option<u64>,
    pub signal_sema: u64,
}

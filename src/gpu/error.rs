use super::structs::{BufferUsage, ImageUsage, MemoryAccess, PixelFormat, ResourceType};
use ash::vk;
use std::fmt;

#[derive(Debug)]
pub struct VulkanError {
    res: ash::vk::Result,
}

impl VulkanError {
    pub fn result(&self) -> vk::Result {
        self.res
    }

    /// Device loss is fatal for any in-flight drain; callers may want to
    /// distinguish it from recoverable errors.
    pub fn is_device_lost(&self) -> bool {
        self.res == vk::Result::ERROR_DEVICE_LOST
    }
}

impl fmt::Display for VulkanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vulkan Error: {}", self.res)
    }
}

#[derive(Debug)]
pub enum GPUError {
    VulkanError(VulkanError),
    LoadingError(ash::LoadingError),
    SlotError(),
    Unsupported(&'static str),
    NoSuchDevice {
        requested: usize,
        available: usize,
    },
    NoSuitableMemoryType(MemoryAccess),
    UnsupportedPixelFormat(PixelFormat),
    StagingUsageConflict,
    MismatchedCopySize {
        src: u64,
        dst: u64,
    },
    MismatchedCopyExtent {
        src: [u32; 2],
        dst: [u32; 2],
    },
    InvalidBufferBarrier {
        usage: BufferUsage,
        access: MemoryAccess,
    },
    InvalidImageBarrier {
        usage: ImageUsage,
        access: MemoryAccess,
    },
    EmptyResourcePool,
    BindingOutOfRange {
        binding: u32,
        count: u32,
    },
    BindingTypeMismatch {
        binding: u32,
        expected: ResourceType,
    },
    InvalidHandle(&'static str),
}

/// Convenient crate-wide result type.
pub type Result<T, E = GPUError> = std::result::Result<T, E>;

impl std::error::Error for GPUError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl fmt::Display for GPUError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GPUError::VulkanError(e) => write!(f, "{}", e),
            GPUError::LoadingError(e) => write!(f, "{}", e),
            GPUError::SlotError() => write!(f, "Ran out of slots!"),
            GPUError::Unsupported(what) => write!(f, "Unsupported on this device: {}", what),
            GPUError::NoSuchDevice {
                requested,
                available,
            } => write!(
                f,
                "Wanted device #{} does not exist ({} available)",
                requested, available
            ),
            GPUError::NoSuitableMemoryType(access) => write!(
                f,
                "Host access pattern {:?} cannot be satisfied by any memory type",
                access
            ),
            GPUError::UnsupportedPixelFormat(fmt_desc) => {
                write!(f, "Unrecognized pixel format: {:?}", fmt_desc)
            }
            GPUError::StagingUsageConflict => {
                write!(f, "A staging image can only be used for transfer")
            }
            GPUError::MismatchedCopySize { src, dst } => {
                write!(f, "Buffer copy size mismatched: src {} vs dst {}", src, dst)
            }
            GPUError::MismatchedCopyExtent { src, dst } => write!(
                f,
                "Image copy extent mismatched: src {}x{} vs dst {}x{}",
                src[0], src[1], dst[0], dst[1]
            ),
            GPUError::InvalidBufferBarrier { usage, access } => write!(
                f,
                "Cannot make buffer barrier with usage {:?} and access {:?}",
                usage, access
            ),
            GPUError::InvalidImageBarrier { usage, access } => write!(
                f,
                "Cannot make image barrier with usage {:?} and access {:?}",
                usage, access
            ),
            GPUError::EmptyResourcePool => write!(f, "Cannot bind to an empty resource pool"),
            GPUError::BindingOutOfRange { binding, count } => write!(
                f,
                "Binding #{} is out of range (task declares {} resources)",
                binding, count
            ),
            GPUError::BindingTypeMismatch { binding, expected } => write!(
                f,
                "Binding #{} expects a {:?} resource",
                binding, expected
            ),
            GPUError::InvalidHandle(what) => write!(f, "Stale or invalid handle: {}", what),
        }
    }
}

impl From<ash::vk::Result> for GPUError {
    fn from(res: ash::vk::Result) -> Self {
        GPUError::VulkanError(VulkanError { res })
    }
}

impl<T> From<(T, ash::vk::Result)> for GPUError {
    fn from(res: (T, ash::vk::Result)) -> Self {
        GPUError::VulkanError(VulkanError { res: res.1 })
    }
}

impl From<ash::LoadingError> for GPUError {
    fn from(res: ash::LoadingError) -> Self {
        GPUError::LoadingError(res)
    }
}

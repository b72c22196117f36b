use super::{BufferUsage, GPUError, ImageUsage, MemoryAccess, PixelFormat, ResourceType, Result,
    SubmitType, Topology, VertexRate};
use ash::vk;

/// Which end of a barrier a usage/access pair describes. The two ends get
/// different fallback stages and, for attachments, different access flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BarrierSide {
    Source,
    Destination,
}

pub(crate) fn pixel_format_to_vk(fmt: &PixelFormat) -> Result<vk::Format> {
    let unknown = || GPUError::UnsupportedPixelFormat(*fmt);
    if fmt.is_single {
        return match fmt.ncomp {
            1 => Ok(vk::Format::R32_SFLOAT),
            2 => Ok(vk::Format::R32G32_SFLOAT),
            3 => Ok(vk::Format::R32G32B32_SFLOAT),
            4 => Ok(vk::Format::R32G32B32A32_SFLOAT),
            _ => Err(unknown()),
        };
    }
    if fmt.is_half {
        return match fmt.ncomp {
            1 => Ok(vk::Format::R16_SFLOAT),
            2 => Ok(vk::Format::R16G16_SFLOAT),
            3 => Ok(vk::Format::R16G16B16_SFLOAT),
            4 => Ok(vk::Format::R16G16B16A16_SFLOAT),
            _ => Err(unknown()),
        };
    }
    if fmt.is_signed {
        match fmt.int_exp2 {
            1 => match fmt.ncomp {
                1 => Ok(vk::Format::R8_SNORM),
                2 => Ok(vk::Format::R8G8_SNORM),
                3 => Ok(vk::Format::R8G8B8_SNORM),
                4 => Ok(vk::Format::R8G8B8A8_SNORM),
                _ => Err(unknown()),
            },
            2 => match fmt.ncomp {
                1 => Ok(vk::Format::R16_SINT),
                2 => Ok(vk::Format::R16G16_SINT),
                3 => Ok(vk::Format::R16G16B16_SINT),
                4 => Ok(vk::Format::R16G16B16A16_SINT),
                _ => Err(unknown()),
            },
            3 => match fmt.ncomp {
                1 => Ok(vk::Format::R32_SINT),
                2 => Ok(vk::Format::R32G32_SINT),
                3 => Ok(vk::Format::R32G32B32_SINT),
                4 => Ok(vk::Format::R32G32B32A32_SINT),
                _ => Err(unknown()),
            },
            _ => Err(unknown()),
        }
    } else {
        match fmt.int_exp2 {
            1 => match fmt.ncomp {
                1 => Ok(vk::Format::R8_UNORM),
                2 => Ok(vk::Format::R8G8_UNORM),
                3 => Ok(vk::Format::R8G8B8_UNORM),
                4 => Ok(vk::Format::R8G8B8A8_UNORM),
                _ => Err(unknown()),
            },
            2 => match fmt.ncomp {
                1 => Ok(vk::Format::R16_UINT),
                2 => Ok(vk::Format::R16G16_UINT),
                3 => Ok(vk::Format::R16G16B16_UINT),
                4 => Ok(vk::Format::R16G16B16A16_UINT),
                _ => Err(unknown()),
            },
            3 => match fmt.ncomp {
                1 => Ok(vk::Format::R32_UINT),
                2 => Ok(vk::Format::R32G32_UINT),
                3 => Ok(vk::Format::R32G32B32_UINT),
                4 => Ok(vk::Format::R32G32B32A32_UINT),
                _ => Err(unknown()),
            },
            _ => Err(unknown()),
        }
    }
}

/// Buffers are always copy-capable: every role unions in the transfer bits it
/// can legally carry.
pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut flags = vk::BufferUsageFlags::empty();
    if usage.contains(BufferUsage::STAGING) {
        flags |= vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST;
    }
    if usage.contains(BufferUsage::UNIFORM) {
        flags |= vk::BufferUsageFlags::UNIFORM_BUFFER | vk::BufferUsageFlags::TRANSFER_DST;
    }
    if usage.contains(BufferUsage::STORAGE) {
        flags |= vk::BufferUsageFlags::STORAGE_BUFFER
            | vk::BufferUsageFlags::TRANSFER_SRC
            | vk::BufferUsageFlags::TRANSFER_DST;
    }
    if usage.contains(BufferUsage::VERTEX) {
        flags |= vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST;
    }
    if usage.contains(BufferUsage::INDEX) {
        flags |= vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST;
    }
    flags
}

pub(crate) fn image_usage_to_vk(usage: ImageUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(ImageUsage::SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST;
    }
    if usage.contains(ImageUsage::STORAGE) {
        flags |= vk::ImageUsageFlags::STORAGE
            | vk::ImageUsageFlags::TRANSFER_SRC
            | vk::ImageUsageFlags::TRANSFER_DST;
    }
    if usage.contains(ImageUsage::ATTACHMENT) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC
            | vk::ImageUsageFlags::TRANSFER_DST
            | vk::ImageUsageFlags::SAMPLED
            | vk::ImageUsageFlags::COLOR_ATTACHMENT
            | vk::ImageUsageFlags::INPUT_ATTACHMENT;
    }
    if usage.contains(ImageUsage::STAGING) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST;
    }
    flags
}

pub(crate) fn topology_to_vk(topo: Topology) -> vk::PrimitiveTopology {
    match topo {
        Topology::PointList => vk::PrimitiveTopology::POINT_LIST,
        Topology::LineList => vk::PrimitiveTopology::LINE_LIST,
        Topology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
    }
}

pub(crate) fn vertex_rate_to_vk(rate: VertexRate) -> vk::VertexInputRate {
    match rate {
        VertexRate::Vertex => vk::VertexInputRate::VERTEX,
        VertexRate::Instance => vk::VertexInputRate::INSTANCE,
    }
}

pub(crate) fn resource_type_to_vk(ty: ResourceType) -> vk::DescriptorType {
    match ty {
        ResourceType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        ResourceType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        ResourceType::SampledImage => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        ResourceType::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
    }
}

pub(crate) fn submit_type_queue_flags(ty: SubmitType) -> vk::QueueFlags {
    match ty {
        SubmitType::Graphics => vk::QueueFlags::GRAPHICS,
        SubmitType::Compute => vk::QueueFlags::COMPUTE,
        SubmitType::Any => vk::QueueFlags::empty(),
    }
}

fn shader_rw_stages() -> vk::PipelineStageFlags {
    vk::PipelineStageFlags::ALL_GRAPHICS | vk::PipelineStageFlags::COMPUTE_SHADER
}

fn image_shader_stages() -> vk::PipelineStageFlags {
    vk::PipelineStageFlags::FRAGMENT_SHADER | vk::PipelineStageFlags::COMPUTE_SHADER
}

fn side_default_stage(side: BarrierSide) -> vk::PipelineStageFlags {
    match side {
        BarrierSide::Source => vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        BarrierSide::Destination => vk::PipelineStageFlags::TOP_OF_PIPE,
    }
}

/// Looks up the access mask and pipeline stages implied by one end of a
/// buffer barrier. `MemoryAccess::None` means "no prior/subsequent device
/// access": no access bits, end-of-pipe stage.
pub(crate) fn buffer_barrier_params(
    usage: BufferUsage,
    access: MemoryAccess,
    side: BarrierSide,
) -> Result<(vk::AccessFlags, vk::PipelineStageFlags)> {
    if access == MemoryAccess::None {
        return Ok((vk::AccessFlags::empty(), side_default_stage(side)));
    }
    let illegal = || GPUError::InvalidBufferBarrier { usage, access };

    if usage == BufferUsage::STAGING {
        match access {
            MemoryAccess::ReadOnly => Ok((
                vk::AccessFlags::TRANSFER_READ,
                vk::PipelineStageFlags::TRANSFER,
            )),
            MemoryAccess::WriteOnly => Ok((
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::TRANSFER,
            )),
            _ => Err(illegal()),
        }
    } else if usage == BufferUsage::VERTEX {
        match access {
            MemoryAccess::ReadOnly => Ok((
                vk::AccessFlags::VERTEX_ATTRIBUTE_READ,
                vk::PipelineStageFlags::VERTEX_INPUT,
            )),
            _ => Err(illegal()),
        }
    } else if usage == BufferUsage::INDEX {
        match access {
            MemoryAccess::ReadOnly => Ok((
                vk::AccessFlags::INDEX_READ,
                vk::PipelineStageFlags::VERTEX_INPUT,
            )),
            _ => Err(illegal()),
        }
    } else if usage == BufferUsage::UNIFORM {
        match access {
            MemoryAccess::ReadOnly => Ok((
                vk::AccessFlags::UNIFORM_READ,
                vk::PipelineStageFlags::VERTEX_SHADER
                    | vk::PipelineStageFlags::FRAGMENT_SHADER
                    | vk::PipelineStageFlags::COMPUTE_SHADER,
            )),
            _ => Err(illegal()),
        }
    } else if usage == BufferUsage::STORAGE {
        match access {
            MemoryAccess::ReadOnly => Ok((vk::AccessFlags::SHADER_READ, shader_rw_stages())),
            MemoryAccess::WriteOnly => Ok((vk::AccessFlags::SHADER_WRITE, shader_rw_stages())),
            MemoryAccess::ReadWrite => Ok((
                vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
                shader_rw_stages(),
            )),
            MemoryAccess::None => unreachable!(),
        }
    } else {
        // A barrier needs exactly one role to translate deterministically.
        Err(illegal())
    }
}

/// Buffer-table analog for images, with the implied layout added. An empty
/// usage means the image has never been touched (or its contents may be
/// discarded): layout `UNDEFINED`.
pub(crate) fn image_barrier_params(
    usage: ImageUsage,
    access: MemoryAccess,
    side: BarrierSide,
) -> Result<(vk::AccessFlags, vk::PipelineStageFlags, vk::ImageLayout)> {
    if access == MemoryAccess::None {
        return Ok((
            vk::AccessFlags::empty(),
            side_default_stage(side),
            vk::ImageLayout::UNDEFINED,
        ));
    }
    let illegal = || GPUError::InvalidImageBarrier { usage, access };

    if usage.is_empty() {
        return Ok((
            vk::AccessFlags::empty(),
            side_default_stage(side),
            vk::ImageLayout::UNDEFINED,
        ));
    }
    if usage == ImageUsage::STAGING {
        match access {
            MemoryAccess::ReadOnly => Ok((
                vk::AccessFlags::TRANSFER_READ,
                vk::PipelineStageFlags::TRANSFER,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            )),
            MemoryAccess::WriteOnly => Ok((
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::TRANSFER,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            )),
            _ => Err(illegal()),
        }
    } else if usage == ImageUsage::ATTACHMENT {
        match (access, side) {
            (MemoryAccess::ReadOnly, _) => Ok((
                vk::AccessFlags::INPUT_ATTACHMENT_READ,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            )),
            (_, BarrierSide::Source) => Ok((
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            )),
            (_, BarrierSide::Destination) => Ok((
                vk::AccessFlags::COLOR_ATTACHMENT_READ,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            )),
        }
    } else if usage == ImageUsage::SAMPLED {
        match access {
            MemoryAccess::ReadOnly => Ok((
                vk::AccessFlags::SHADER_READ,
                image_shader_stages(),
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            )),
            _ => Err(illegal()),
        }
    } else if usage == ImageUsage::STORAGE {
        let access_flags = match access {
            MemoryAccess::ReadOnly => vk::AccessFlags::SHADER_READ,
            MemoryAccess::WriteOnly => vk::AccessFlags::SHADER_WRITE,
            MemoryAccess::ReadWrite => vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
            MemoryAccess::None => unreachable!(),
        };
        Ok((access_flags, image_shader_stages(), vk::ImageLayout::GENERAL))
    } else if usage == ImageUsage::PRESENT {
        match access {
            MemoryAccess::ReadOnly => Ok((
                vk::AccessFlags::empty(),
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                vk::ImageLayout::PRESENT_SRC_KHR,
            )),
            _ => Err(illegal()),
        }
    } else {
        Err(illegal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_table_covers_every_descriptor() {
        for &signed in &[false, true] {
            for exp in 1..=3u32 {
                for ncomp in 1..=4u32 {
                    let fmt = PixelFormat {
                        ncomp,
                        int_exp2: exp,
                        is_signed: signed,
                        is_single: false,
                        is_half: false,
                    };
                    assert!(pixel_format_to_vk(&fmt).is_ok(), "{:?}", fmt);
                }
            }
        }
        for ncomp in 1..=4u32 {
            let single = PixelFormat {
                ncomp,
                int_exp2: 3,
                is_signed: true,
                is_single: true,
                is_half: false,
            };
            assert!(pixel_format_to_vk(&single).is_ok());
            let half = PixelFormat {
                ncomp,
                int_exp2: 2,
                is_signed: true,
                is_single: false,
                is_half: true,
            };
            assert!(pixel_format_to_vk(&half).is_ok());
        }
    }

    #[test]
    fn format_table_spot_checks() {
        assert_eq!(
            pixel_format_to_vk(&PixelFormat::rgba8()).unwrap(),
            vk::Format::R8G8B8A8_UNORM
        );
        assert_eq!(
            pixel_format_to_vk(&PixelFormat::rgba32f()).unwrap(),
            vk::Format::R32G32B32A32_SFLOAT
        );
        let r16i = PixelFormat {
            ncomp: 1,
            int_exp2: 2,
            is_signed: true,
            is_single: false,
            is_half: false,
        };
        assert_eq!(pixel_format_to_vk(&r16i).unwrap(), vk::Format::R16_SINT);
    }

    #[test]
    fn format_rejects_out_of_range_descriptors() {
        let bad = PixelFormat {
            ncomp: 5,
            int_exp2: 1,
            is_signed: false,
            is_single: false,
            is_half: false,
        };
        assert!(matches!(
            pixel_format_to_vk(&bad),
            Err(GPUError::UnsupportedPixelFormat(_))
        ));
        let bad_exp = PixelFormat {
            ncomp: 1,
            int_exp2: 4,
            is_signed: false,
            is_single: false,
            is_half: false,
        };
        assert!(pixel_format_to_vk(&bad_exp).is_err());
    }

    #[test]
    fn pixel_format_sizes() {
        assert_eq!(PixelFormat::rgba8().size(), 4);
        assert_eq!(PixelFormat::rgba32f().size(), 16);
        assert_eq!(PixelFormat::r32f().size(), 4);
    }

    #[test]
    fn buffer_usage_always_includes_transfer_capability() {
        for usage in [
            BufferUsage::STAGING,
            BufferUsage::UNIFORM,
            BufferUsage::STORAGE,
            BufferUsage::VERTEX,
            BufferUsage::INDEX,
        ] {
            let flags = buffer_usage_to_vk(usage);
            assert!(
                flags.contains(vk::BufferUsageFlags::TRANSFER_DST)
                    || flags.contains(vk::BufferUsageFlags::TRANSFER_SRC),
                "{:?} has no transfer bits",
                usage
            );
        }
    }

    #[test]
    fn multi_usage_buffers_union_their_flags() {
        let flags = buffer_usage_to_vk(BufferUsage::VERTEX | BufferUsage::STORAGE);
        assert!(flags.contains(vk::BufferUsageFlags::VERTEX_BUFFER));
        assert!(flags.contains(vk::BufferUsageFlags::STORAGE_BUFFER));
        assert!(flags.contains(vk::BufferUsageFlags::TRANSFER_SRC));
        assert!(flags.contains(vk::BufferUsageFlags::TRANSFER_DST));
    }

    #[test]
    fn buffer_barrier_table_totality() {
        use MemoryAccess::*;
        let legal: &[(BufferUsage, MemoryAccess)] = &[
            (BufferUsage::STAGING, ReadOnly),
            (BufferUsage::STAGING, WriteOnly),
            (BufferUsage::VERTEX, ReadOnly),
            (BufferUsage::INDEX, ReadOnly),
            (BufferUsage::UNIFORM, ReadOnly),
            (BufferUsage::STORAGE, ReadOnly),
            (BufferUsage::STORAGE, WriteOnly),
            (BufferUsage::STORAGE, ReadWrite),
        ];
        for &(usage, access) in legal {
            for side in [BarrierSide::Source, BarrierSide::Destination] {
                assert!(
                    buffer_barrier_params(usage, access, side).is_ok(),
                    "{:?}/{:?} should be legal",
                    usage,
                    access
                );
            }
        }

        let illegal: &[(BufferUsage, MemoryAccess)] = &[
            (BufferUsage::STAGING, ReadWrite),
            (BufferUsage::VERTEX, WriteOnly),
            (BufferUsage::VERTEX, ReadWrite),
            (BufferUsage::INDEX, WriteOnly),
            (BufferUsage::UNIFORM, WriteOnly),
            (BufferUsage::UNIFORM, ReadWrite),
            (BufferUsage::VERTEX | BufferUsage::STORAGE, ReadOnly),
        ];
        for &(usage, access) in illegal {
            assert!(
                matches!(
                    buffer_barrier_params(usage, access, BarrierSide::Source),
                    Err(GPUError::InvalidBufferBarrier { .. })
                ),
                "{:?}/{:?} should be rejected",
                usage,
                access
            );
        }
    }

    #[test]
    fn buffer_barrier_spot_checks() {
        let (access, stage) = buffer_barrier_params(
            BufferUsage::STAGING,
            MemoryAccess::WriteOnly,
            BarrierSide::Destination,
        )
        .unwrap();
        assert_eq!(access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(stage, vk::PipelineStageFlags::TRANSFER);

        let (access, stage) = buffer_barrier_params(
            BufferUsage::UNIFORM,
            MemoryAccess::ReadOnly,
            BarrierSide::Destination,
        )
        .unwrap();
        assert_eq!(access, vk::AccessFlags::UNIFORM_READ);
        assert!(stage.contains(vk::PipelineStageFlags::VERTEX_SHADER));
        assert!(stage.contains(vk::PipelineStageFlags::FRAGMENT_SHADER));
        assert!(stage.contains(vk::PipelineStageFlags::COMPUTE_SHADER));
    }

    #[test]
    fn none_access_has_no_hazard() {
        let (access, stage) = buffer_barrier_params(
            BufferUsage::STORAGE,
            MemoryAccess::None,
            BarrierSide::Source,
        )
        .unwrap();
        assert_eq!(access, vk::AccessFlags::empty());
        assert_eq!(stage, vk::PipelineStageFlags::BOTTOM_OF_PIPE);

        let (_, stage) = buffer_barrier_params(
            BufferUsage::STORAGE,
            MemoryAccess::None,
            BarrierSide::Destination,
        )
        .unwrap();
        assert_eq!(stage, vk::PipelineStageFlags::TOP_OF_PIPE);
    }

    #[test]
    fn image_barrier_layout_table() {
        // Fresh image promoted to transfer destination.
        let (_, _, src_layout) = image_barrier_params(
            ImageUsage::empty(),
            MemoryAccess::None,
            BarrierSide::Source,
        )
        .unwrap();
        assert_eq!(src_layout, vk::ImageLayout::UNDEFINED);
        let (_, _, dst_layout) = image_barrier_params(
            ImageUsage::STAGING,
            MemoryAccess::WriteOnly,
            BarrierSide::Destination,
        )
        .unwrap();
        assert_eq!(dst_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);

        // Transfer destination handed to a sampler.
        let (_, _, src_layout) = image_barrier_params(
            ImageUsage::STAGING,
            MemoryAccess::WriteOnly,
            BarrierSide::Source,
        )
        .unwrap();
        assert_eq!(src_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        let (access, _, dst_layout) = image_barrier_params(
            ImageUsage::SAMPLED,
            MemoryAccess::ReadOnly,
            BarrierSide::Destination,
        )
        .unwrap();
        assert_eq!(access, vk::AccessFlags::SHADER_READ);
        assert_eq!(dst_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);

        // Storage images live in GENERAL whichever way they are accessed.
        for access in [
            MemoryAccess::ReadOnly,
            MemoryAccess::WriteOnly,
            MemoryAccess::ReadWrite,
        ] {
            let (_, _, layout) =
                image_barrier_params(ImageUsage::STORAGE, access, BarrierSide::Source).unwrap();
            assert_eq!(layout, vk::ImageLayout::GENERAL);
        }

        // Present: no access, bottom of pipe.
        let (access, stage, layout) = image_barrier_params(
            ImageUsage::PRESENT,
            MemoryAccess::ReadOnly,
            BarrierSide::Destination,
        )
        .unwrap();
        assert_eq!(access, vk::AccessFlags::empty());
        assert_eq!(stage, vk::PipelineStageFlags::BOTTOM_OF_PIPE);
        assert_eq!(layout, vk::ImageLayout::PRESENT_SRC_KHR);
    }

    #[test]
    fn image_barrier_rejects_illegal_pairs() {
        for (usage, access) in [
            (ImageUsage::SAMPLED, MemoryAccess::WriteOnly),
            (ImageUsage::SAMPLED, MemoryAccess::ReadWrite),
            (ImageUsage::STAGING, MemoryAccess::ReadWrite),
            (ImageUsage::PRESENT, MemoryAccess::WriteOnly),
            (
                ImageUsage::SAMPLED | ImageUsage::STORAGE,
                MemoryAccess::ReadOnly,
            ),
        ] {
            assert!(
                matches!(
                    image_barrier_params(usage, access, BarrierSide::Source),
                    Err(GPUError::InvalidImageBarrier { .. })
                ),
                "{:?}/{:?} should be rejected",
                usage,
                access
            );
        }
    }

    #[test]
    fn attachment_barrier_sides_differ() {
        let (src_access, src_stage, _) = image_barrier_params(
            ImageUsage::ATTACHMENT,
            MemoryAccess::WriteOnly,
            BarrierSide::Source,
        )
        .unwrap();
        assert_eq!(src_access, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
        assert_eq!(src_stage, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);

        let (dst_access, dst_stage, _) = image_barrier_params(
            ImageUsage::ATTACHMENT,
            MemoryAccess::ReadOnly,
            BarrierSide::Destination,
        )
        .unwrap();
        assert_eq!(dst_access, vk::AccessFlags::INPUT_ATTACHMENT_READ);
        assert_eq!(dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    }
}

use super::{
    pixel_format_to_vk, resource_type_to_vk, topology_to_vk, vertex_rate_to_vk, ComputeTaskInfo,
    Context, GPUError, GraphicsTaskInfo, ResourceType, Result,
};
use crate::utils::Handle;
use ash::vk;
use std::ffi::CString;

/// A compiled pipeline bundle: descriptor-set layout, pipeline layout,
/// pipeline, shader modules, and the ordered resource-type list a resource
/// pool binds against.
pub struct Task {
    pub(crate) desc_set_layout: vk::DescriptorSetLayout,
    pub(crate) pipe_layout: vk::PipelineLayout,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) shader_mods: Vec<vk::ShaderModule>,
    pub(crate) resources: Vec<ResourceType>,
    pub(crate) pool_sizes: Vec<vk::DescriptorPoolSize>,
    pub(crate) bind_point: vk::PipelineBindPoint,
    pub(crate) debug_name: String,
}

impl Task {
    pub(crate) fn destroy(self, device: &ash::Device) {
        unsafe {
            device.destroy_pipeline(self.pipeline, None);
            for shader_mod in self.shader_mods {
                device.destroy_shader_module(shader_mod, None);
            }
            device.destroy_pipeline_layout(self.pipe_layout, None);
            device.destroy_descriptor_set_layout(self.desc_set_layout, None);
        }
        log::debug!("destroyed task '{}'", self.debug_name);
    }
}

impl Context {
    /// Builds the descriptor-set layout for a resource-type list: one binding
    /// per type at sequential indices, visible to every graphics stage and
    /// compute. Sampled-image bindings get the context's default sampler as
    /// an immutable sampler. Also derives the descriptor-pool size vector.
    fn create_task_layout(
        &self,
        resources: &[ResourceType],
    ) -> Result<(
        vk::DescriptorSetLayout,
        vk::PipelineLayout,
        Vec<vk::DescriptorPoolSize>,
    )> {
        let immutable_samplers = [self.default_sampler];
        let mut bindings = Vec::with_capacity(resources.len());
        let mut pool_sizes: Vec<vk::DescriptorPoolSize> = Vec::new();
        for (i, &rsc_ty) in resources.iter().enumerate() {
            let desc_ty = resource_type_to_vk(rsc_ty);
            let mut binding = vk::DescriptorSetLayoutBinding::builder()
                .binding(i as u32)
                .descriptor_count(1)
                .descriptor_type(desc_ty)
                .stage_flags(vk::ShaderStageFlags::ALL_GRAPHICS | vk::ShaderStageFlags::COMPUTE);
            if rsc_ty == ResourceType::SampledImage {
                binding = binding.immutable_samplers(&immutable_samplers);
            }
            bindings.push(binding.build());
            match pool_sizes.iter_mut().find(|ps| ps.ty == desc_ty) {
                Some(ps) => ps.descriptor_count += 1,
                None => pool_sizes.push(vk::DescriptorPoolSize {
                    ty: desc_ty,
                    descriptor_count: 1,
                }),
            }
        }

        let desc_set_layout = unsafe {
            self.device.create_descriptor_set_layout(
                &vk::DescriptorSetLayoutCreateInfo::builder()
                    .bindings(&bindings)
                    .build(),
                None,
            )
        }?;

        let set_layouts = [desc_set_layout];
        let pipe_layout = unsafe {
            self.device.create_pipeline_layout(
                &vk::PipelineLayoutCreateInfo::builder()
                    .set_layouts(&set_layouts)
                    .build(),
                None,
            )
        }?;

        Ok((desc_set_layout, pipe_layout, pool_sizes))
    }

    fn create_shader_module(&self, spirv: &[u32]) -> Result<vk::ShaderModule> {
        let module = unsafe {
            self.device.create_shader_module(
                &vk::ShaderModuleCreateInfo::builder().code(spirv).build(),
                None,
            )
        }?;
        Ok(module)
    }

    pub fn make_compute_task(&mut self, info: &ComputeTaskInfo) -> Result<Handle<Task>> {
        // Dispatch requires a compute queue; surface that at build time.
        self.submit_queue(super::SubmitType::Compute)?;

        let (desc_set_layout, pipe_layout, pool_sizes) = self.create_task_layout(info.resources)?;
        let shader_mod = self.create_shader_module(info.spirv)?;

        // Workgroup size is injected through specialization constants 0/1/2.
        let spec_entries = [
            vk::SpecializationMapEntry {
                constant_id: 0,
                offset: 0,
                size: 4,
            },
            vk::SpecializationMapEntry {
                constant_id: 1,
                offset: 4,
                size: 4,
            },
            vk::SpecializationMapEntry {
                constant_id: 2,
                offset: 8,
                size: 4,
            },
        ];
        let spec_data: &[u8] = bytemuck::cast_slice(&info.workgroup_size);
        let spec_info = vk::SpecializationInfo::builder()
            .map_entries(&spec_entries)
            .data(spec_data)
            .build();

        let entry = CString::new(info.entry).unwrap();
        let stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(shader_mod)
            .name(&entry)
            .specialization_info(&spec_info)
            .build();

        let pipeline = unsafe {
            self.device.create_compute_pipelines(
                vk::PipelineCache::null(),
                &[vk::ComputePipelineCreateInfo::builder()
                    .stage(stage)
                    .layout(pipe_layout)
                    .build()],
                None,
            )
        }
        .map_err(GPUError::from)?[0];

        log::debug!("created compute task '{}'", info.debug_name);
        self.tasks
            .insert(Task {
                desc_set_layout,
                pipe_layout,
                pipeline,
                shader_mods: vec![shader_mod],
                resources: info.resources.to_vec(),
                pool_sizes,
                bind_point: vk::PipelineBindPoint::COMPUTE,
                debug_name: info.debug_name.to_string(),
            })
            .ok_or(GPUError::SlotError())
    }

    pub fn make_graphics_task(&mut self, info: &GraphicsTaskInfo) -> Result<Handle<Task>> {
        self.submit_queue(super::SubmitType::Graphics)?;

        let (raw_pass, extent) = {
            let pass = self
                .render_passes
                .get_ref(info.pass)
                .ok_or(GPUError::InvalidHandle("render pass"))?;
            (pass.raw, pass.extent)
        };

        let (desc_set_layout, pipe_layout, pool_sizes) = self.create_task_layout(info.resources)?;
        let vert_mod = self.create_shader_module(info.vertex_spirv)?;
        let frag_mod = self.create_shader_module(info.fragment_spirv)?;

        let vert_entry = CString::new(info.vertex_entry).unwrap();
        let frag_entry = CString::new(info.fragment_entry).unwrap();
        let stages = [
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vert_mod)
                .name(&vert_entry)
                .build(),
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(frag_mod)
                .name(&frag_entry)
                .build(),
        ];

        // One vertex binding; attributes are packed contiguously in
        // declaration order and the stride is their total size.
        let mut attributes = Vec::with_capacity(info.vertex_inputs.len());
        let mut offset = 0u32;
        let mut rate = vk::VertexInputRate::VERTEX;
        for (location, input) in info.vertex_inputs.iter().enumerate() {
            attributes.push(
                vk::VertexInputAttributeDescription::builder()
                    .location(location as u32)
                    .binding(0)
                    .format(pixel_format_to_vk(&input.format)?)
                    .offset(offset)
                    .build(),
            );
            offset += input.format.size();
            rate = vertex_rate_to_vk(input.rate);
        }
        let vertex_bindings = [vk::VertexInputBindingDescription {
            binding: 0,
            stride: offset,
            input_rate: rate,
        }];
        let vertex_input = if attributes.is_empty() {
            vk::PipelineVertexInputStateCreateInfo::builder().build()
        } else {
            vk::PipelineVertexInputStateCreateInfo::builder()
                .vertex_binding_descriptions(&vertex_bindings)
                .vertex_attribute_descriptions(&attributes)
                .build()
        };

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(topology_to_vk(info.topology))
            .primitive_restart_enable(false)
            .build();

        let viewports = [vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }];
        let scissors = [vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        }];
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(&viewports)
            .scissors(&scissors)
            .build();

        let rasterization = vk::PipelineRasterizationStateCreateInfo::builder()
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .build();

        let multisample = vk::PipelineMultisampleStateCreateInfo::builder()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1)
            .build();

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS)
            .min_depth_bounds(0.0)
            .max_depth_bounds(1.0)
            .build();

        let blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .blend_enable(false)
            .color_write_mask(
                vk::ColorComponentFlags::R
                    | vk::ColorComponentFlags::G
                    | vk::ColorComponentFlags::B
                    | vk::ColorComponentFlags::A,
            )
            .build()];
        let color_blend = vk::PipelineColorBlendStateCreateInfo::builder()
            .attachments(&blend_attachments)
            .build();

        let pipeline = unsafe {
            self.device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[vk::GraphicsPipelineCreateInfo::builder()
                    .stages(&stages)
                    .vertex_input_state(&vertex_input)
                    .input_assembly_state(&input_assembly)
                    .viewport_state(&viewport_state)
                    .rasterization_state(&rasterization)
                    .multisample_state(&multisample)
                    .depth_stencil_state(&depth_stencil)
                    .color_blend_state(&color_blend)
                    .layout(pipe_layout)
                    .render_pass(raw_pass)
                    .subpass(0)
                    .build()],
                None,
            )
        }
        .map_err(GPUError::from)?[0];

        log::debug!("created graphics task '{}'", info.debug_name);
        self.tasks
            .insert(Task {
                desc_set_layout,
                pipe_layout,
                pipeline,
                shader_mods: vec![vert_mod, frag_mod],
                resources: info.resources.to_vec(),
                pool_sizes,
                bind_point: vk::PipelineBindPoint::GRAPHICS,
                debug_name: info.debug_name.to_string(),
            })
            .ok_or(GPUError::SlotError())
    }

    /// Destroying a handle twice is a no-op.
    pub fn destroy_task(&mut self, handle: Handle<Task>) {
        match self.tasks.take(handle) {
            Some(task) => task.destroy(&self.device),
            None => log::warn!("ignored destroy of dead task handle"),
        }
    }
}

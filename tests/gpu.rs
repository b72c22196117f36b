mod common;

use common::test_context;
use inline_spirv::inline_spirv;
use koji::*;
use serial_test::serial;

const INCREMENT_COMP: &[u32] = inline_spirv!(
    r#"
#version 450
layout(local_size_x_id = 0, local_size_y_id = 1, local_size_z_id = 2) in;
layout(binding = 0) buffer Data {
    uint values[];
};
void main() {
    values[gl_GlobalInvocationID.x] += 1;
}
"#,
    comp
);

#[test]
#[serial]
fn compute_roundtrip_increments_every_element() {
    let Some(mut ctx) = test_context("compute_roundtrip") else {
        return;
    };
    if !ctx.supports(SubmitType::Compute) {
        eprintln!("Skipping compute test: no compute queue");
        ctx.destroy();
        return;
    }

    const COUNT: u64 = 256;
    let buf = ctx
        .make_buffer(&BufferInfo {
            debug_name: "counters",
            byte_size: COUNT * 4,
            host_access: MemoryAccess::ReadWrite,
            usage: BufferUsage::STORAGE,
        })
        .unwrap();
    let init: Vec<u8> = (0..COUNT as u32)
        .flat_map(|i| i.to_le_bytes())
        .collect();
    ctx.copy_host_to_buffer(ctx.whole_buffer(buf).unwrap(), &init)
        .unwrap();

    let task = ctx
        .make_compute_task(&ComputeTaskInfo {
            debug_name: "increment",
            spirv: INCREMENT_COMP,
            resources: &[ResourceType::StorageBuffer],
            workgroup_size: [1, 1, 1],
            ..Default::default()
        })
        .unwrap();
    let pool = ctx.make_resource_pool(task).unwrap();
    ctx.bind_buffer(pool, 0, ctx.whole_buffer(buf).unwrap())
        .unwrap();

    let drain = ctx.make_command_drain().unwrap();
    ctx.submit_commands(
        drain,
        &[
            Command::SetSubmitType(SubmitType::Compute),
            Command::Dispatch(Dispatch {
                task,
                pool,
                workgroups: [COUNT as u32, 1, 1],
            }),
        ],
    )
    .unwrap();
    ctx.wait_drain(drain).unwrap();

    let values: Vec<u32> = ctx
        .map_buffer::<u32>(ctx.whole_buffer(buf).unwrap())
        .unwrap()
        .to_vec();
    ctx.unmap_buffer(buf).unwrap();
    for (i, value) in values.iter().enumerate() {
        assert_eq!(*value, i as u32 + 1);
    }

    ctx.destroy_command_drain(drain);
    ctx.destroy_resource_pool(pool);
    ctx.destroy_task(task);
    ctx.destroy_buffer(buf);
    ctx.destroy();
}

#[test]
#[serial]
fn inline_transaction_executes_each_time() {
    let Some(mut ctx) = test_context("inline_transaction") else {
        return;
    };
    if !ctx.supports(SubmitType::Compute) {
        ctx.destroy();
        return;
    }

    const COUNT: u64 = 64;
    let buf = ctx
        .make_buffer(&BufferInfo {
            debug_name: "counters",
            byte_size: COUNT * 4,
            host_access: MemoryAccess::ReadWrite,
            usage: BufferUsage::STORAGE,
        })
        .unwrap();
    ctx.copy_host_to_buffer(
        ctx.whole_buffer(buf).unwrap(),
        &vec![0u8; (COUNT * 4) as usize],
    )
    .unwrap();

    let task = ctx
        .make_compute_task(&ComputeTaskInfo {
            debug_name: "increment",
            spirv: INCREMENT_COMP,
            resources: &[ResourceType::StorageBuffer],
            workgroup_size: [1, 1, 1],
            ..Default::default()
        })
        .unwrap();
    let pool = ctx.make_resource_pool(task).unwrap();
    ctx.bind_buffer(pool, 0, ctx.whole_buffer(buf).unwrap())
        .unwrap();

    let dispatch = Command::Dispatch(Dispatch {
        task,
        pool,
        workgroups: [COUNT as u32, 1, 1],
    });
    let barrier = Command::BufferBarrier(BufferBarrier {
        buf,
        src_usage: BufferUsage::STORAGE,
        src_access: MemoryAccess::ReadWrite,
        dst_usage: BufferUsage::STORAGE,
        dst_access: MemoryAccess::ReadWrite,
    });
    let transaction = ctx
        .make_transaction(&TransactionInfo {
            debug_name: "bump",
            commands: &[dispatch, barrier],
        })
        .unwrap();

    let drain = ctx.make_command_drain().unwrap();
    ctx.submit_commands(
        drain,
        &[
            Command::SetSubmitType(SubmitType::Compute),
            Command::InlineTransaction(transaction),
            Command::InlineTransaction(transaction),
        ],
    )
    .unwrap();
    ctx.wait_drain(drain).unwrap();

    let values: Vec<u32> = ctx
        .map_buffer::<u32>(ctx.whole_buffer(buf).unwrap())
        .unwrap()
        .to_vec();
    ctx.unmap_buffer(buf).unwrap();
    for value in values {
        assert_eq!(value, 2);
    }

    ctx.destroy_command_drain(drain);
    ctx.destroy_transaction(transaction);
    ctx.destroy_resource_pool(pool);
    ctx.destroy_task(task);
    ctx.destroy_buffer(buf);
    ctx.destroy();
}

#[test]
#[serial]
fn binding_signature_is_enforced() {
    let Some(mut ctx) = test_context("binding_signature") else {
        return;
    };
    if !ctx.supports(SubmitType::Compute) {
        ctx.destroy();
        return;
    }

    let buf = ctx
        .make_buffer(&BufferInfo {
            debug_name: "storage",
            byte_size: 64,
            usage: BufferUsage::STORAGE,
            ..Default::default()
        })
        .unwrap();
    let img = ctx.make_image(&ImageInfo::default()).unwrap();

    let task = ctx
        .make_compute_task(&ComputeTaskInfo {
            debug_name: "one_binding",
            spirv: INCREMENT_COMP,
            resources: &[ResourceType::StorageBuffer],
            workgroup_size: [1, 1, 1],
            ..Default::default()
        })
        .unwrap();
    let pool = ctx.make_resource_pool(task).unwrap();

    // An image where the signature says buffer.
    let err = ctx.bind_image(pool, 0, ctx.whole_image(img).unwrap());
    assert!(matches!(err, Err(GPUError::BindingTypeMismatch { .. })));

    // Past the end of the signature.
    let err = ctx.bind_buffer(pool, 1, ctx.whole_buffer(buf).unwrap());
    assert!(matches!(err, Err(GPUError::BindingOutOfRange { .. })));

    // Rebinding the same index overwrites without complaint.
    ctx.bind_buffer(pool, 0, ctx.whole_buffer(buf).unwrap())
        .unwrap();
    ctx.bind_buffer(pool, 0, ctx.whole_buffer(buf).unwrap())
        .unwrap();

    ctx.destroy_resource_pool(pool);
    ctx.destroy_task(task);
    ctx.destroy_image(img);
    ctx.destroy_buffer(buf);
    ctx.destroy();
}

#[test]
#[serial]
fn empty_resource_pool_rejects_binds() {
    let Some(mut ctx) = test_context("empty_pool") else {
        return;
    };
    if !ctx.supports(SubmitType::Compute) {
        ctx.destroy();
        return;
    }

    const NOOP_COMP: &[u32] = inline_spirv!(
        r#"
#version 450
layout(local_size_x_id = 0, local_size_y_id = 1, local_size_z_id = 2) in;
void main() {}
"#,
        comp
    );

    let task = ctx
        .make_compute_task(&ComputeTaskInfo {
            debug_name: "noop",
            spirv: NOOP_COMP,
            resources: &[],
            workgroup_size: [1, 1, 1],
            ..Default::default()
        })
        .unwrap();
    let pool = ctx.make_resource_pool(task).unwrap();
    let buf = ctx
        .make_buffer(&BufferInfo {
            debug_name: "unbound",
            byte_size: 16,
            usage: BufferUsage::UNIFORM,
            ..Default::default()
        })
        .unwrap();

    let err = ctx.bind_buffer(pool, 0, ctx.whole_buffer(buf).unwrap());
    assert!(matches!(err, Err(GPUError::EmptyResourcePool)));

    ctx.destroy_buffer(buf);
    ctx.destroy_resource_pool(pool);
    ctx.destroy_task(task);
    ctx.destroy();
}

#[test]
#[serial]
fn draw_covers_the_attachment() {
    let Some(mut ctx) = test_context("draw") else {
        return;
    };
    if !ctx.supports(SubmitType::Graphics) {
        eprintln!("Skipping draw test: no graphics queue");
        ctx.destroy();
        return;
    }

    const W: u32 = 64;
    const H: u32 = 64;

    let attachment = ctx
        .make_image(&ImageInfo {
            debug_name: "color",
            width: W,
            height: H,
            format: PixelFormat::rgba8(),
            host_access: MemoryAccess::None,
            usage: ImageUsage::ATTACHMENT,
        })
        .unwrap();
    let pass = ctx
        .make_render_pass(&RenderPassInfo {
            debug_name: "clear_and_draw",
            attachment,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        })
        .unwrap();

    let vert = inline_spirv!(
        r#"
#version 450
layout(location = 0) in vec2 pos;
void main() { gl_Position = vec4(pos, 0.0, 1.0); }
"#,
        vert
    );
    let frag = inline_spirv!(
        r#"
#version 450
layout(location = 0) out vec4 color;
void main() { color = vec4(0.0, 1.0, 0.0, 1.0); }
"#,
        frag
    );

    let vec2f = PixelFormat {
        ncomp: 2,
        int_exp2: 3,
        is_signed: true,
        is_single: true,
        is_half: false,
    };
    let task = ctx
        .make_graphics_task(&GraphicsTaskInfo {
            debug_name: "fullscreen",
            pass,
            vertex_spirv: vert,
            fragment_spirv: frag,
            resources: &[],
            vertex_inputs: &[VertexInput {
                format: vec2f,
                rate: VertexRate::Vertex,
            }],
            topology: Topology::TriangleList,
            ..Default::default()
        })
        .unwrap();
    let pool = ctx.make_resource_pool(task).unwrap();

    // One triangle large enough to cover the whole viewport.
    let positions: [f32; 6] = [-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];
    let vbuf = ctx
        .make_buffer(&BufferInfo {
            debug_name: "fullscreen_verts",
            byte_size: std::mem::size_of_val(&positions) as u64,
            host_access: MemoryAccess::WriteOnly,
            usage: BufferUsage::VERTEX,
        })
        .unwrap();
    ctx.copy_host_to_buffer(
        ctx.whole_buffer(vbuf).unwrap(),
        bytemuck::cast_slice(&positions),
    )
    .unwrap();

    let readback = ctx
        .make_buffer(&BufferInfo {
            debug_name: "readback",
            byte_size: (W * H * 4) as u64,
            host_access: MemoryAccess::ReadOnly,
            usage: BufferUsage::STAGING,
        })
        .unwrap();

    let drain = ctx.make_command_drain().unwrap();
    ctx.submit_commands(
        drain,
        &[
            Command::SetSubmitType(SubmitType::Graphics),
            Command::ImageBarrier(ImageBarrier {
                img: attachment,
                src_usage: ImageUsage::empty(),
                src_access: MemoryAccess::None,
                dst_usage: ImageUsage::ATTACHMENT,
                dst_access: MemoryAccess::WriteOnly,
            }),
            Command::BeginRenderPass(BeginRenderPass {
                pass,
                draw_inline: true,
            }),
            Command::Draw(Draw {
                task,
                pool,
                vertices: ctx.whole_buffer(vbuf).unwrap(),
                vertex_count: 3,
                instance_count: 1,
            }),
            Command::EndRenderPass,
            Command::ImageBarrier(ImageBarrier {
                img: attachment,
                src_usage: ImageUsage::ATTACHMENT,
                src_access: MemoryAccess::WriteOnly,
                dst_usage: ImageUsage::STAGING,
                dst_access: MemoryAccess::ReadOnly,
            }),
            Command::CopyImageToBuffer(ImageBufferCopy {
                src: ctx.whole_image(attachment).unwrap(),
                dst: ctx.whole_buffer(readback).unwrap(),
            }),
        ],
    )
    .unwrap();
    ctx.wait_drain(drain).unwrap();

    let mut pixels = vec![0u8; (W * H * 4) as usize];
    ctx.copy_buffer_to_host(ctx.whole_buffer(readback).unwrap(), &mut pixels)
        .unwrap();
    // Every pixel should be the fragment shader's green.
    assert_eq!(&pixels[0..4], &[0, 255, 0, 255]);
    let last = pixels.len() - 4;
    assert_eq!(&pixels[last..], &[0, 255, 0, 255]);

    ctx.destroy_command_drain(drain);
    ctx.destroy_buffer(readback);
    ctx.destroy_buffer(vbuf);
    ctx.destroy_resource_pool(pool);
    ctx.destroy_task(task);
    ctx.destroy_render_pass(pass);
    ctx.destroy_image(attachment);
    ctx.destroy();
}

use super::*;
use crate::bind::BindingKind;
use crate::scene::Camera;
use crate::test_support::{
    read_buffer, read_rgba8, solid_texture, test_targets, try_create_test_device, TEST_COLOR_FORMAT, TEST_DEPTH_FORMAT,
};
use assert_fs::prelude::*;
use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use serial_test::serial;

fn builtin_cache(device: &wgpu::Device) -> ShaderCache {
    let mut cache = ShaderCache::new();
    cache.load_builtins(device).expect("builtin shaders compile");
    cache
}

const SOLID_COLOR: [u8; 4] = [40, 90, 200, 255];

fn read_constants<T>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    sky: &SkySphere,
    handle: ConstantBufferHandle<T>,
) -> Vec<u8> {
    let buffer = sky.bindings().constant_buffer(handle).expect("constant buffer");
    read_buffer(device, queue, &buffer.buffer, buffer.size)
}

/// Draws `sky` alone into a fresh 64x64 target whose depth is cleared to the
/// far plane, returning the color pixels.
fn render_offscreen(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    sky: &mut SkySphere,
    scene: &mut SceneTree,
) -> Vec<[u8; 4]> {
    let size = wgpu::Extent3d {
        width: 64,
        height: 64,
        depth_or_array_layers: 1,
    };
    let target = |label, format, usage| {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    };
    let color = target(
        "Offscreen Color",
        TEST_COLOR_FORMAT,
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
    );
    let depth = target("Offscreen Depth", TEST_DEPTH_FORMAT, wgpu::TextureUsages::RENDER_ATTACHMENT);
    let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    sky.pre_render(scene, queue).expect("pre_render");
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Offscreen Encoder"),
    });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Offscreen Sky Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        sky.render(&mut render_pass);
    }
    queue.submit(Some(encoder.finish()));
    sky.post_render(scene).expect("post_render");

    read_rgba8(device, queue, &color)
}

fn small_config() -> SkyConfig {
    SkyConfig {
        radius: 10.0,
        slice_count: 8,
        stack_count: 6,
        ..Default::default()
    }
}

#[test]
fn test_default_config() {
    let config = SkyConfig::default();
    assert_eq!(config.radius, 5000.0);
    assert_eq!(config.slice_count, 30);
    assert_eq!(config.stack_count, 30);
    assert_eq!(config.vertex_shader, SKY_VERTEX_SHADER);
    assert_eq!(config.pixel_shader, SKY_PIXEL_SHADER);
}

#[test]
fn test_sky_fixed_function_state() {
    let depth = sky_depth_stencil()
        .to_wgpu(wgpu::TextureFormat::Depth24PlusStencil8)
        .expect("stencil format");
    assert!(depth.depth_write_enabled);
    assert_eq!(depth.depth_compare, wgpu::CompareFunction::LessEqual);
    assert_eq!(depth.stencil.read_mask, 0xFF);
    assert_eq!(depth.stencil.write_mask, 0xFF);
    assert_eq!(depth.stencil.front.depth_fail_op, wgpu::StencilOperation::IncrementClamp);
    assert_eq!(depth.stencil.back.depth_fail_op, wgpu::StencilOperation::DecrementClamp);
    assert_eq!(depth.stencil.front.compare, wgpu::CompareFunction::Always);

    let primitive = sky_rasterizer().primitive_state(Topology::default());
    assert_eq!(primitive.cull_mode, None);
    assert_eq!(primitive.polygon_mode, wgpu::PolygonMode::Fill);
    assert_eq!(primitive.front_face, wgpu::FrontFace::Cw);
    assert!(!primitive.unclipped_depth);
}

#[test]
fn test_sky_stencil_rejects_depth_only_target() {
    assert!(sky_depth_stencil().to_wgpu(wgpu::TextureFormat::Depth32Float).is_err());
}

#[test_log::test]
#[serial]
fn test_sky_binding_order() {
    let Some((device, queue)) = try_create_test_device() else {
        return;
    };
    let cache = builtin_cache(&device);
    let texture = solid_texture(&device, &queue);
    let sky = SkySphere::from_texture(&device, &cache, test_targets(), texture, &small_config())
        .expect("sky sphere");

    assert_eq!(
        sky.bindings().kinds(),
        vec![
            BindingKind::VertexBuffer,
            BindingKind::IndexBuffer,
            BindingKind::VertexShader,
            BindingKind::PixelShader,
            BindingKind::ShaderResource,
            BindingKind::InputLayout,
            BindingKind::Topology,
            BindingKind::Sampler,
            BindingKind::DepthStencil,
            BindingKind::Rasterizer,
            BindingKind::Blend,
            BindingKind::ConstantBuffer,
            BindingKind::ConstantBuffer,
            BindingKind::ConstantBuffer,
        ]
    );
    assert_eq!(sky.baked().bind_groups.len(), 4);
    assert_eq!(sky.bindings().index_count(), Some(create_sphere(10.0, 8, 6).indices.len() as u32));
    assert_eq!(*sky.object_constants(), ObjectConstants::identity());
    assert_eq!(sky.properties().name, "Sky Sphere");
}

#[test_log::test]
#[serial]
fn test_default_sky_index_count() {
    let Some((device, queue)) = try_create_test_device() else {
        return;
    };
    let cache = builtin_cache(&device);
    let texture = solid_texture(&device, &queue);
    let sky = SkySphere::from_texture(&device, &cache, test_targets(), texture, &SkyConfig::default())
        .expect("sky sphere");

    assert_eq!(sky.bindings().index_count(), Some(5220));
}

#[test_log::test]
#[serial]
fn test_pre_render_uploads_scene_matrices() {
    let Some((device, queue)) = try_create_test_device() else {
        return;
    };
    let cache = builtin_cache(&device);
    let texture = solid_texture(&device, &queue);
    let mut sky = SkySphere::from_texture(&device, &cache, test_targets(), texture, &small_config())
        .expect("sky sphere");
    sky.properties_mut().transform.position = Vec3::new(0.0, 3.0, 0.0);

    let mut scene = SceneTree::new(Camera::new(Vec3::new(0.0, 1.0, 2.0), 16.0 / 9.0));
    scene.push_and_set_matrix(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
    let expected = ObjectConstants::from_scene(Mat4::from_translation(Vec3::new(1.0, 3.0, 0.0)), scene.camera());

    for _ in 0..2 {
        sky.on_update(&mut scene, 16.0).expect("update");
        sky.pre_render(&mut scene, &queue).expect("pre_render");
        sky.post_render(&mut scene).expect("post_render");
        assert_eq!(scene.depth(), 1);
    }

    assert_eq!(*sky.object_constants(), expected);
    assert_eq!(read_constants(&device, &queue, &sky, sky.vs_object), bytemuck::bytes_of(&expected));
    assert_eq!(read_constants(&device, &queue, &sky, sky.ps_object), bytemuck::bytes_of(&expected));
    assert_eq!(
        read_constants(&device, &queue, &sky, sky.ps_frame),
        bytemuck::bytes_of(&FrameConstants::default())
    );
}

#[test_log::test]
#[serial]
fn test_sky_covers_every_pixel_from_inside() {
    let Some((device, queue)) = try_create_test_device() else {
        return;
    };
    let cache = builtin_cache(&device);
    let texture = solid_texture(&device, &queue);
    let mut sky = SkySphere::from_texture(&device, &cache, test_targets(), texture, &small_config())
        .expect("sky sphere");
    let mut scene = SceneTree::new(Camera::new(Vec3::ZERO, 1.0));

    for (dx, dy) in [(0.0, 0.0), (450.0, 0.0), (0.0, -400.0), (225.0, 300.0)] {
        scene.process_mouse(dx, dy);
        let pixels = render_offscreen(&device, &queue, &mut sky, &mut scene);

        assert_eq!(pixels.len(), 64 * 64);
        for (i, pixel) in pixels.iter().enumerate() {
            let close = pixel.iter().zip(SOLID_COLOR).all(|(&got, want)| got.abs_diff(want) <= 2);
            assert!(
                close,
                "pixel ({}, {}) is {:?} looking yaw {} pitch {}",
                i % 64,
                i / 64,
                pixel,
                scene.camera().yaw,
                scene.camera().pitch
            );
        }
        assert_eq!(scene.depth(), 0);
    }
}

#[test]
fn test_inner_faces_are_back_faces() {
    assert_eq!(sky_rasterizer().front_face, wgpu::FrontFace::Cw);

    let mesh = create_sphere(10.0, 8, 6);
    let mut camera = Camera::new(Vec3::ZERO, 1.0);
    let mut checked = 0;

    for (dx, dy) in [(0.0, 0.0), (450.0, 0.0), (0.0, -400.0), (0.0, 800.0)] {
        camera.rotate(dx, dy);
        let view_projection = camera.projection_matrix() * camera.view_matrix();

        for tri in mesh.indices.chunks_exact(3) {
            let clip = [tri[0], tri[1], tri[2]].map(|i| view_projection * mesh.vertices[i as usize].position.extend(1.0));
            if clip.iter().any(|p| p.w <= camera.near) {
                continue;
            }
            let [a, b, c]: [Vec2; 3] = clip.map(|p| p.xy() / p.w);
            let area = (b - a).perp_dot(c - a);
            assert!(area > 0.0, "triangle {:?} faces the camera as a front face", tri);
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test_log::test]
#[serial]
fn test_sky_from_texture_file() {
    let Some((device, queue)) = try_create_test_device() else {
        return;
    };
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("sky.png");
    image::RgbaImage::from_pixel(8, 4, image::Rgba([120, 160, 220, 255]))
        .save(file.path())
        .unwrap();

    let cache = builtin_cache(&device);
    let sky = SkySphere::with_config(&device, &queue, &cache, test_targets(), file.path(), &small_config());
    assert!(sky.is_ok(), "{:?}", sky.err());
}

#[test_log::test]
#[serial]
fn test_oversized_texture_fails() {
    let Some((device, queue)) = try_create_test_device() else {
        return;
    };
    let max = device.limits().max_texture_dimension_2d;
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("wide.png");
    image::RgbaImage::from_pixel(max + 1, 2, image::Rgba(SOLID_COLOR))
        .save(file.path())
        .unwrap();

    let cache = builtin_cache(&device);
    let result = SkySphere::with_config(&device, &queue, &cache, test_targets(), file.path(), &small_config());
    let error = result.err().expect("texture wider than the device limit must fail");
    assert!(format!("{:#}", error).contains("wide.png"), "{:#}", error);
}

#[test_log::test]
#[serial]
fn test_missing_texture_fails() {
    let Some((device, queue)) = try_create_test_device() else {
        return;
    };
    let temp = assert_fs::TempDir::new().unwrap();
    let cache = builtin_cache(&device);

    let result = SkySphere::new(&device, &queue, &cache, test_targets(), &temp.path().join("missing.dds"));
    let error = result.err().expect("missing texture must fail");
    assert!(error.to_string().contains("missing.dds"));
}

#[test_log::test]
#[serial]
fn test_missing_shader_fails() {
    let Some((device, queue)) = try_create_test_device() else {
        return;
    };
    let texture = solid_texture(&device, &queue);
    let result = SkySphere::from_texture(&device, &ShaderCache::new(), test_targets(), texture, &small_config());
    assert!(result.is_err());
}

#[test_log::test]
#[serial]
fn test_depth_only_target_fails() {
    let Some((device, queue)) = try_create_test_device() else {
        return;
    };
    let cache = builtin_cache(&device);
    let texture = solid_texture(&device, &queue);
    let targets = RenderTargets {
        color_format: TEST_COLOR_FORMAT,
        depth_stencil_format: Some(wgpu::TextureFormat::Depth32Float),
    };

    let result = SkySphere::from_texture(&device, &cache, targets, texture, &small_config());
    assert!(result.is_err());
}

use std::path::Path;
use anyhow::{bail, Context, Result};
use image::GenericImageView;

/// A sampled 2D texture and its default view.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        label: Option<&str>,
    ) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("Failed to load sky texture {}", path.display()))?;
        let dimensions = img.dimensions();
        log::debug!("Loaded {} ({}x{})", path.display(), dimensions.0, dimensions.1);

        Self::from_rgba8(device, queue, &img.to_rgba8(), label)
            .with_context(|| format!("Failed to upload sky texture {}", path.display()))
    }

    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &image::RgbaImage,
        label: Option<&str>,
    ) -> Result<Self> {
        let dimensions = rgba.dimensions();
        let max = device.limits().max_texture_dimension_2d;
        if dimensions.0 == 0 || dimensions.1 == 0 || dimensions.0 > max || dimensions.1 > max {
            bail!(
                "Texture is {}x{}, the device supports 1..={} per side",
                dimensions.0,
                dimensions.1,
                max
            );
        }
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self { texture, view })
    }

    /// Vertical horizon-to-zenith gradient, used when no sky image is supplied.
    pub fn gradient(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        zenith: [u8; 3],
        horizon: [u8; 3],
        height: u32,
    ) -> Result<Self> {
        let height = height.max(2);
        let half = (height - 1) as f32 / 2.0;
        let rgba = image::RgbaImage::from_fn(1, height, |_, y| {
            // v = 0 at the north pole, 0.5 at the equator
            let t = (1.0 - (y as f32 - half).abs() / half).clamp(0.0, 1.0);
            let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
            image::Rgba([
                mix(zenith[0], horizon[0]),
                mix(zenith[1], horizon[1]),
                mix(zenith[2], horizon[2]),
                255,
            ])
        });
        Self::from_rgba8(device, queue, &rgba, Some("Sky Gradient Texture"))
    }
}

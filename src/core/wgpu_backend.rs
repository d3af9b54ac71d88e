use std::sync::Arc;
use wgpu::{BindGroup, BindGroupLayout, Buffer, RenderPipeline, Sampler, Surface, SurfaceConfiguration, Texture};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::traits::{DrawParams, RenderBackend};

use super::error::{Result, SurfaceError};
use super::gpu_context::GpuContext;
use super::pixel_buffer::{PixelBuffer, PixelFormat, TextureKey};
use super::viewport::{Bounds, Quad};

/// Quad placement uniform for the display shader
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadUniform {
    position_scale: [f32; 2],
    uv_scale: [f32; 2],
    uv_offset: [f32; 2],
    luma: u32,
    _pad: u32,
}

impl QuadUniform {
    fn new(quad: &Quad, format: PixelFormat) -> Self {
        Self {
            position_scale: quad.position_scale.to_array(),
            uv_scale: quad.uv_scale.to_array(),
            uv_offset: quad.uv_offset.to_array(),
            luma: u32::from(format == PixelFormat::Gray8),
            _pad: 0,
        }
    }
}

/// Device-side settings fixed at context creation
#[derive(Debug, Clone, Copy)]
pub struct BackendSettings {
    pub power_preference: wgpu::PowerPreference,
    pub vsync: bool,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::default(),
            vsync: true,
        }
    }
}

/// Render backend drawing into a winit window through wgpu
pub struct WgpuBackend {
    window: Arc<Window>,
    settings: BackendSettings,
}

/// Everything tied to one device: dropped together on reset
pub struct WgpuContext {
    gpu: GpuContext,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    render_pipeline: RenderPipeline,
    bind_group_layout: BindGroupLayout,
    sampler: Sampler,
    uniform_buffer: Buffer,
}

pub struct WgpuTexture {
    key: TextureKey,
    texture: Texture,
    bind_group: BindGroup,
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>, settings: BackendSettings) -> Self {
        Self { window, settings }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn texture_format(format: PixelFormat) -> Option<wgpu::TextureFormat> {
        match format {
            PixelFormat::Bgra8 => Some(wgpu::TextureFormat::Bgra8Unorm),
            PixelFormat::Rgba8 => Some(wgpu::TextureFormat::Rgba8Unorm),
            PixelFormat::Gray8 => Some(wgpu::TextureFormat::R8Unorm),
            PixelFormat::Other(_) => None,
        }
    }

    fn create_render_pipeline(
        context: &GpuContext,
        surface_format: wgpu::TextureFormat,
    ) -> (RenderPipeline, BindGroupLayout) {
        let device = context.device();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Pixel Buffer Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/pixel_buffer.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Pixel Buffer Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Pixel Buffer Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Pixel Buffer Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        (pipeline, bind_group_layout)
    }

    fn reconfigure(context: &mut WgpuContext, bounds: Bounds) {
        context.surface_config.width = bounds.width;
        context.surface_config.height = bounds.height;
        context
            .surface
            .configure(context.gpu.device(), &context.surface_config);
    }
}

impl RenderBackend for WgpuBackend {
    type Context = WgpuContext;
    type Texture = WgpuTexture;

    fn create_context(&mut self, bounds: Bounds) -> Result<WgpuContext> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(self.window.clone())
            .map_err(|e| SurfaceError::ContextCreation(format!("failed to create surface: {}", e)))?;

        let (gpu, adapter) = GpuContext::for_surface(&instance, &surface, self.settings.power_preference)?;

        let caps = surface.get_capabilities(&adapter);
        // Frames are already gamma encoded, so sample and write them untouched
        let surface_format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| SurfaceError::ContextCreation("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: bounds.width,
            height: bounds.height,
            present_mode: if self.settings.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &surface_config);

        let (render_pipeline, bind_group_layout) = Self::create_render_pipeline(&gpu, surface_format);

        let sampler = gpu.device().create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Pixel Buffer Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buffer = gpu.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Uniform Buffer"),
            contents: bytemuck::bytes_of(&QuadUniform::new(&Quad::FULL, PixelFormat::Bgra8)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        log::debug!("surface format {:?}", surface_format);

        Ok(WgpuContext {
            gpu,
            surface,
            surface_config,
            render_pipeline,
            bind_group_layout,
            sampler,
            uniform_buffer,
        })
    }

    fn create_texture(&mut self, context: &mut WgpuContext, key: TextureKey) -> Result<WgpuTexture> {
        let format = Self::texture_format(key.format).ok_or_else(|| {
            SurfaceError::TextureAllocation(format!("no texture format for {}", key.format))
        })?;

        let max = context.gpu.max_texture_dimension();
        if key.width > max || key.height > max {
            return Err(SurfaceError::TextureAllocation(format!(
                "{}x{} exceeds device limit of {}",
                key.width, key.height, max
            )));
        }

        let device = context.gpu.device();
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pixel Buffer Texture"),
            size: wgpu::Extent3d {
                width: key.width,
                height: key.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            texture.destroy();
            return Err(SurfaceError::TextureAllocation(err.to_string()));
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Pixel Buffer Bind Group"),
            layout: &context.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&context.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: context.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        Ok(WgpuTexture {
            key,
            texture,
            bind_group,
        })
    }

    fn upload(
        &mut self,
        context: &mut WgpuContext,
        texture: &mut WgpuTexture,
        buffer: &PixelBuffer<'_>,
    ) -> Result<()> {
        if buffer.key() != texture.key {
            return Err(SurfaceError::Present(format!(
                "buffer {}x{} {} does not match texture {}x{} {}",
                buffer.width(),
                buffer.height(),
                buffer.format(),
                texture.key.width,
                texture.key.height,
                texture.key.format
            )));
        }

        context.gpu.queue().write_texture(
            texture.texture.as_image_copy(),
            buffer.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(buffer.bytes_per_row()),
                rows_per_image: Some(buffer.height()),
            },
            wgpu::Extent3d {
                width: buffer.width(),
                height: buffer.height(),
                depth_or_array_layers: 1,
            },
        );

        Ok(())
    }

    fn draw(&mut self, context: &mut WgpuContext, texture: &WgpuTexture, params: &DrawParams) -> Result<()> {
        if context.surface_config.width != params.bounds.width
            || context.surface_config.height != params.bounds.height
        {
            Self::reconfigure(context, params.bounds);
        }

        let uniform = QuadUniform::new(&params.quad, texture.key.format);
        context
            .gpu
            .queue()
            .write_buffer(&context.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        let surface_texture = match context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                Self::reconfigure(context, params.bounds);
                return Err(SurfaceError::Present("surface outdated, reconfigured".into()));
            }
            Err(e) => return Err(SurfaceError::Present(e.to_string())),
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = context
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pixel Buffer Encoder"),
            });

        {
            let [r, g, b, a] = params.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Pixel Buffer Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&context.render_pipeline);
            render_pass.set_bind_group(0, &texture.bind_group, &[]);
            render_pass.draw(0..4, 0..1);
        }

        context.gpu.queue().submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        surface_texture.present();

        Ok(())
    }

    fn release_texture(&mut self, _context: &mut WgpuContext, texture: WgpuTexture) {
        texture.texture.destroy();
    }

    fn destroy_context(&mut self, context: WgpuContext) {
        // Surface goes before the device it was configured with
        let WgpuContext { gpu, surface, .. } = context;
        drop(surface);
        gpu.device().destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_uniform_layout() {
        // Must match the WGSL struct: three vec2<f32> and two u32
        assert_eq!(std::mem::size_of::<QuadUniform>(), 32);
    }

    #[test]
    fn test_luma_flag_only_for_gray() {
        assert_eq!(QuadUniform::new(&Quad::FULL, PixelFormat::Gray8).luma, 1);
        assert_eq!(QuadUniform::new(&Quad::FULL, PixelFormat::Bgra8).luma, 0);
    }

    #[test]
    fn test_texture_formats() {
        assert_eq!(
            WgpuBackend::texture_format(PixelFormat::Bgra8),
            Some(wgpu::TextureFormat::Bgra8Unorm)
        );
        assert_eq!(
            WgpuBackend::texture_format(PixelFormat::Gray8),
            Some(wgpu::TextureFormat::R8Unorm)
        );
        assert_eq!(WgpuBackend::texture_format(PixelFormat::Other(0)), None);
    }
}

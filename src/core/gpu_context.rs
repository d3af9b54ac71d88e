use std::sync::Arc;
use wgpu::{Adapter, Device, DeviceDescriptor, Instance, Limits, PowerPreference, Queue, Surface};

use super::error::{Result, SurfaceError};

/// Device and queue behind a rendering context
///
/// Cheap to clone; the handles are reference counted.
#[derive(Clone)]
pub struct GpuContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl GpuContext {
    /// Pick an adapter able to present to `surface` and open a device on it
    ///
    /// Blocks the calling thread until the driver answers.
    pub fn for_surface(
        instance: &Instance,
        surface: &Surface<'_>,
        power_preference: PowerPreference,
    ) -> Result<(Self, Adapter)> {
        let adapter = pollster::block_on(Self::request_adapter(instance, surface, power_preference))?;
        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(Self::request_device(&adapter))?;

        Ok((
            Self {
                device: Arc::new(device),
                queue: Arc::new(queue),
            },
            adapter,
        ))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Largest texture edge the device accepts
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    async fn request_adapter(
        instance: &Instance,
        surface: &Surface<'_>,
        power_preference: PowerPreference,
    ) -> Result<Adapter> {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| SurfaceError::ContextCreation(format!("no suitable adapter: {:?}", e)))
    }

    async fn request_device(adapter: &Adapter) -> Result<(Device, Queue)> {
        // Camera frames can exceed the downlevel default of 2048
        let limits = Limits {
            max_texture_dimension_2d: adapter.limits().max_texture_dimension_2d,
            ..Limits::downlevel_defaults()
        };

        adapter
            .request_device(&DeviceDescriptor {
                label: Some("Pixel View Device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| SurfaceError::ContextCreation(format!("failed to create device: {:?}", e)))
    }
}

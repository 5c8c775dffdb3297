// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Graphics adapter enumeration and selection.
//!
//! Selection is intentionally permissive: any adapter satisfying the
//! caller's [`DeviceSelectionConfig`] is acceptable, and WGPU is left to
//! pick the platform backend. Failure to obtain any adapter surfaces as
//! `RenderError::DeviceUnavailable`.

use wgpu::{Adapter, Backend, DeviceType, Instance, RequestAdapterOptions};

use quadmark_core::renderer::{
    DeviceSelectionConfig, GraphicsAdapterInfo, GraphicsBackendType, PowerPreference,
    RenderError, RendererDeviceType,
};

/// Returns a human-readable name for a backend.
pub fn backend_name(backend: Backend) -> &'static str {
    match backend {
        Backend::Vulkan => "Vulkan",
        Backend::Metal => "Metal",
        Backend::Dx12 => "DirectX 12",
        Backend::Gl => "OpenGL",
        Backend::BrowserWebGpu => "WebGPU",
        Backend::Noop => "No-op",
    }
}

/// Discovers and selects a graphics adapter through a shared WGPU instance.
#[derive(Debug)]
pub struct WgpuBackendSelector {
    instance: Instance,
}

impl WgpuBackendSelector {
    /// Create a new selector with its own WGPU instance.
    pub fn new() -> Self {
        Self {
            instance: Instance::new(&wgpu::InstanceDescriptor::new_without_display_handle()),
        }
    }

    /// Convert WGPU Backend to our generic GraphicsBackendType.
    pub(crate) fn backend_to_type(backend: Backend) -> GraphicsBackendType {
        match backend {
            Backend::Vulkan => GraphicsBackendType::Vulkan,
            Backend::Metal => GraphicsBackendType::Metal,
            Backend::Dx12 => GraphicsBackendType::Dx12,
            Backend::Gl => GraphicsBackendType::OpenGL,
            Backend::BrowserWebGpu => GraphicsBackendType::WebGpu,
            Backend::Noop => GraphicsBackendType::Unknown,
        }
    }

    /// Converts WGPU DeviceType to our generic RendererDeviceType.
    pub(crate) fn device_type_to_type(device_type: DeviceType) -> RendererDeviceType {
        match device_type {
            DeviceType::IntegratedGpu => RendererDeviceType::IntegratedGpu,
            DeviceType::DiscreteGpu => RendererDeviceType::DiscreteGpu,
            DeviceType::VirtualGpu => RendererDeviceType::VirtualGpu,
            DeviceType::Cpu => RendererDeviceType::Cpu,
            _ => RendererDeviceType::Unknown,
        }
    }

    fn power_preference_to_wgpu(preference: PowerPreference) -> wgpu::PowerPreference {
        match preference {
            PowerPreference::None => wgpu::PowerPreference::None,
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        }
    }

    /// Convert WGPU adapter info to our generic GraphicsAdapterInfo.
    pub fn adapter_to_info(adapter: &Adapter) -> GraphicsAdapterInfo {
        let info = adapter.get_info();
        GraphicsAdapterInfo {
            name: info.name.clone(),
            backend_type: Self::backend_to_type(info.backend),
            device_type: Self::device_type_to_type(info.device_type),
        }
    }

    /// Asynchronously selects an adapter honoring the given configuration.
    pub async fn select_adapter(
        &self,
        config: &DeviceSelectionConfig,
    ) -> Result<Adapter, RenderError> {
        log::info!("Starting WGPU adapter selection ({config:?})...");

        let adapter = self
            .instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: Self::power_preference_to_wgpu(config.power_preference),
                compatible_surface: None,
                force_fallback_adapter: config.force_fallback_adapter,
            })
            .await
            .map_err(|e| {
                RenderError::DeviceUnavailable(format!("no suitable adapter found: {e}"))
            })?;

        let info = adapter.get_info();
        log::info!(
            "Selected graphics adapter: \"{}\" (Backend: {}, Device: {:?})",
            info.name,
            backend_name(info.backend),
            info.device_type
        );

        Ok(adapter)
    }
}

impl Default for WgpuBackendSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_name_mapping() {
        assert_eq!(backend_name(Backend::Vulkan), "Vulkan");
        assert_eq!(backend_name(Backend::Metal), "Metal");
        assert_eq!(backend_name(Backend::Dx12), "DirectX 12");
        assert_eq!(backend_name(Backend::Gl), "OpenGL");
    }

    #[test]
    fn backend_type_conversion() {
        assert_eq!(
            WgpuBackendSelector::backend_to_type(Backend::Vulkan),
            GraphicsBackendType::Vulkan
        );
        assert_eq!(
            WgpuBackendSelector::backend_to_type(Backend::Metal),
            GraphicsBackendType::Metal
        );
        assert_eq!(
            WgpuBackendSelector::backend_to_type(Backend::Noop),
            GraphicsBackendType::Unknown
        );
    }

    #[test]
    fn device_type_conversion() {
        assert_eq!(
            WgpuBackendSelector::device_type_to_type(DeviceType::DiscreteGpu),
            RendererDeviceType::DiscreteGpu
        );
        assert_eq!(
            WgpuBackendSelector::device_type_to_type(DeviceType::Cpu),
            RendererDeviceType::Cpu
        );
    }
}

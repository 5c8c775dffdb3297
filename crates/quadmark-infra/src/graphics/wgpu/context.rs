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

use anyhow::anyhow;
use anyhow::Result;
use wgpu::{Adapter, Features};

/// Holds the core WGPU state objects required for rendering.
///
/// This structure manages the connection to the graphics API. It is
/// initialized with a pre-selected adapter, making it a passive component;
/// no surface is created — quadmark renders into an offscreen target owned
/// by the device layer.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    #[allow(dead_code)]
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    // Store info for easy access
    pub adapter_name: String,
    pub adapter_backend: wgpu::Backend,
    pub adapter_device_type: wgpu::DeviceType,
    pub active_device_features: wgpu::Features,
    #[allow(dead_code)]
    pub device_limits: wgpu::Limits,
    /// Nanoseconds per timestamp tick on this queue.
    pub timestamp_period_ns: f32,
}

impl WgpuGraphicsContext {
    /// Asynchronously initializes the graphics context.
    ///
    /// ## Arguments
    /// * `adapter` - The pre-selected `wgpu::Adapter` to use.
    ///
    /// ## Returns
    /// * `Result<Self>` - The initialized `WgpuGraphicsContext` or an error.
    pub async fn new(adapter: Adapter) -> Result<Self> {
        log::info!("Initializing WGPU Graphics Context with pre-selected adapter...");

        let adapter_info = adapter.get_info();
        log::info!(
            "Using provided graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        // Enable timestamp queries when the adapter offers them; everything
        // else runs on default features and limits.
        let required_features_for_probe: Features = wgpu::Features::TIMESTAMP_QUERY;
        let features_to_enable: Features = adapter.features() & required_features_for_probe;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Quadmark Logical Device"),
                required_features: features_to_enable,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(std::sync::Arc::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        let active_device_features = device.features();
        let device_limits = device.limits();
        let timestamp_period_ns = queue.get_timestamp_period();
        log::info!("Active device features: {active_device_features:?}");
        log::debug!("Device limits: {device_limits:?}");
        if active_device_features.contains(wgpu::Features::TIMESTAMP_QUERY) {
            log::info!("GPU timestamp period: {timestamp_period_ns:.3} ns per tick.");
        } else {
            log::warn!(
                "TIMESTAMP_QUERY not available on \"{}\"; pass timing will use queue round-trips.",
                adapter_info.name
            );
        }

        Ok(WgpuGraphicsContext {
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            adapter_device_type: adapter_info.device_type,
            active_device_features,
            device_limits,
            timestamp_period_ns,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

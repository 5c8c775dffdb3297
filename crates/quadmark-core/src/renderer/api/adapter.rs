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

//! Adapter information and device selection policy.

/// The graphics API a device is driven through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphicsBackendType {
    /// Vulkan.
    Vulkan,
    /// Apple Metal.
    Metal,
    /// DirectX 12.
    Dx12,
    /// OpenGL / GLES.
    OpenGL,
    /// Browser WebGPU.
    WebGpu,
    /// Could not be determined.
    #[default]
    Unknown,
}

/// The physical kind of a graphics adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RendererDeviceType {
    /// A GPU sharing memory with the CPU.
    IntegratedGpu,
    /// A dedicated GPU with its own memory.
    DiscreteGpu,
    /// A virtualized GPU.
    VirtualGpu,
    /// A software rasterizer.
    Cpu,
    /// Could not be determined.
    #[default]
    Unknown,
}

/// Provides standardized, backend-agnostic information about a graphics adapter.
#[derive(Debug, Clone, Default)]
pub struct GraphicsAdapterInfo {
    /// The name of the adapter (e.g., "NVIDIA GeForce RTX 4090").
    pub name: String,
    /// The graphics API backend this adapter is associated with.
    pub backend_type: GraphicsBackendType,
    /// The physical type of the adapter.
    pub device_type: RendererDeviceType,
}

/// Power/performance preference used when selecting an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerPreference {
    /// Let the backend decide.
    #[default]
    None,
    /// Prefer an adapter that minimizes power draw.
    LowPower,
    /// Prefer the fastest available adapter.
    HighPerformance,
}

/// Configuration for device enumeration and selection.
///
/// The selection policy is deliberately loose: any adapter satisfying the
/// preference is acceptable, and backends fall back to whatever they can
/// obtain before reporting the device as unavailable.
#[derive(Debug, Clone, Default)]
pub struct DeviceSelectionConfig {
    /// Preferred power/performance profile.
    pub power_preference: PowerPreference,
    /// Force selection of a fallback (software) adapter, for tests.
    pub force_fallback_adapter: bool,
}

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

//! Conversions from the backend-agnostic API types to their WGPU equivalents.

use quadmark_core::renderer::api::{
    BufferUsage, ClearColor, PrimitiveTopology, TextureFormat, VertexFormat, VertexStepMode,
};

/// Converts an API type into the corresponding `wgpu` type.
pub(crate) trait IntoWgpu<T> {
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<wgpu::VertexFormat> for VertexFormat {
    fn into_wgpu(self) -> wgpu::VertexFormat {
        match self {
            VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
            VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

impl IntoWgpu<wgpu::VertexStepMode> for VertexStepMode {
    fn into_wgpu(self) -> wgpu::VertexStepMode {
        match self {
            VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
            VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
        }
    }
}

impl IntoWgpu<wgpu::PrimitiveTopology> for PrimitiveTopology {
    fn into_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

impl IntoWgpu<wgpu::TextureFormat> for TextureFormat {
    fn into_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        }
    }
}

impl IntoWgpu<wgpu::BufferUsages> for BufferUsage {
    fn into_wgpu(self) -> wgpu::BufferUsages {
        let mut usages = wgpu::BufferUsages::empty();
        if self.contains(BufferUsage::MAP_READ) {
            usages |= wgpu::BufferUsages::MAP_READ;
        }
        if self.contains(BufferUsage::MAP_WRITE) {
            usages |= wgpu::BufferUsages::MAP_WRITE;
        }
        if self.contains(BufferUsage::COPY_SRC) {
            usages |= wgpu::BufferUsages::COPY_SRC;
        }
        if self.contains(BufferUsage::COPY_DST) {
            usages |= wgpu::BufferUsages::COPY_DST;
        }
        if self.contains(BufferUsage::VERTEX) {
            usages |= wgpu::BufferUsages::VERTEX;
        }
        if self.contains(BufferUsage::INDEX) {
            usages |= wgpu::BufferUsages::INDEX;
        }
        if self.contains(BufferUsage::UNIFORM) {
            usages |= wgpu::BufferUsages::UNIFORM;
        }
        if self.contains(BufferUsage::QUERY_RESOLVE) {
            usages |= wgpu::BufferUsages::QUERY_RESOLVE;
        }
        usages
    }
}

impl IntoWgpu<wgpu::Color> for ClearColor {
    fn into_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_usage_flags_map_individually() {
        let usage = BufferUsage::VERTEX | BufferUsage::COPY_DST;
        let wgpu_usage: wgpu::BufferUsages = usage.into_wgpu();
        assert!(wgpu_usage.contains(wgpu::BufferUsages::VERTEX));
        assert!(wgpu_usage.contains(wgpu::BufferUsages::COPY_DST));
        assert!(!wgpu_usage.contains(wgpu::BufferUsages::MAP_READ));
    }

    #[test]
    fn clear_color_maps_channels() {
        let color = ClearColor {
            r: 0.25,
            g: 0.5,
            b: 0.75,
            a: 1.0,
        };
        let wgpu_color: wgpu::Color = color.into_wgpu();
        assert_eq!(wgpu_color.r, 0.25);
        assert_eq!(wgpu_color.g, 0.5);
        assert_eq!(wgpu_color.b, 0.75);
        assert_eq!(wgpu_color.a, 1.0);
    }
}

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

//! Render pipeline state descriptors.

use super::shader::ShaderModuleId;
use std::borrow::Cow;

/// The data format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
}

/// Whether a vertex buffer advances per vertex or per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexStepMode {
    /// Advance once per vertex.
    Vertex,
    /// Advance once per instance.
    Instance,
}

/// Describes a single attribute within a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributeDescriptor {
    /// The attribute's data format.
    pub format: VertexFormat,
    /// Byte offset of the attribute within one element.
    pub offset: u64,
    /// The `@location(..)` index the shader binds this attribute to.
    pub shader_location: u32,
}

/// Describes the memory layout of one vertex buffer.
#[derive(Debug, Clone)]
pub struct VertexBufferLayoutDescriptor<'a> {
    /// Byte distance between consecutive elements.
    pub array_stride: u64,
    /// Per-vertex or per-instance stepping.
    pub step_mode: VertexStepMode,
    /// The attributes read from this buffer.
    pub attributes: Cow<'a, [VertexAttributeDescriptor]>,
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Every three vertices form an independent triangle.
    TriangleList,
    /// Each vertex after the second forms a triangle with its two predecessors.
    TriangleStrip,
}

/// The texel format of a color render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit RGBA, linear.
    Rgba8Unorm,
    /// 8-bit RGBA, sRGB.
    Rgba8UnormSrgb,
    /// 8-bit BGRA, sRGB.
    Bgra8UnormSrgb,
}

/// A complete descriptor for a render pipeline.
///
/// This struct aggregates all the state needed by the GPU to rasterize the
/// fixed quad: shader stages, vertex layout, and the color target it renders
/// to. It is compiled once and immutable thereafter.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The compiled vertex shader module.
    pub vertex_shader_module: ShaderModuleId,
    /// The name of the entry point function in the vertex shader.
    pub vertex_entry_point: Cow<'a, str>,
    /// The compiled fragment shader module, if any.
    pub fragment_shader_module: Option<ShaderModuleId>,
    /// The name of the entry point function in the fragment shader.
    pub fragment_entry_point: Option<Cow<'a, str>>,
    /// The layout of the vertex buffers.
    pub vertex_buffers_layout: Cow<'a, [VertexBufferLayoutDescriptor<'a>]>,
    /// Primitive assembly mode.
    pub topology: PrimitiveTopology,
    /// The format of the color target this pipeline renders to.
    pub color_format: TextureFormat,
}

/// An opaque handle to a compiled render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPipelineId(pub usize);

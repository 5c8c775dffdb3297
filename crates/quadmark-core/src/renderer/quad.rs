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

//! The fixed quad: vertex data, buffer layout, and embedded shader source.
//!
//! Static for the lifetime of the process, never mutated.

use crate::renderer::api::{
    VertexAttributeDescriptor, VertexBufferLayoutDescriptor, VertexFormat, VertexStepMode,
};
use std::borrow::Cow;
use std::mem;

/// One vertex of the fixed quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    /// Position in normalized device coordinates.
    pub position: [f32; 2],
}

/// The four vertices of the unit quad, as a triangle strip (two triangles).
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-0.5, -0.5],
    },
    QuadVertex {
        position: [0.5, -0.5],
    },
    QuadVertex {
        position: [-0.5, 0.5],
    },
    QuadVertex {
        position: [0.5, 0.5],
    },
];

/// Vertex count submitted per draw.
pub const QUAD_VERTEX_COUNT: u32 = QUAD_VERTICES.len() as u32;

/// WGSL for the quad: pass-through vertex stage, solid-color fragment stage.
pub const QUAD_WGSL: &str = r#"
@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(0.85, 0.85, 0.85, 1.0);
}
"#;

impl QuadVertex {
    /// The buffer layout matching [`QUAD_WGSL`]'s vertex inputs.
    pub fn buffer_layout() -> VertexBufferLayoutDescriptor<'static> {
        VertexBufferLayoutDescriptor {
            array_stride: mem::size_of::<QuadVertex>() as u64,
            step_mode: VertexStepMode::Vertex,
            attributes: Cow::Borrowed(&[
                // @location(0) in shader: position
                VertexAttributeDescriptor {
                    shader_location: 0,
                    format: VertexFormat::Float32x2,
                    offset: 0,
                },
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_is_two_triangles_of_a_strip() {
        assert_eq!(QUAD_VERTEX_COUNT, 4);
    }

    #[test]
    fn quad_spans_a_unit_square() {
        let xs: Vec<f32> = QUAD_VERTICES.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = QUAD_VERTICES.iter().map(|v| v.position[1]).collect();
        let width = xs.iter().cloned().fold(f32::MIN, f32::max)
            - xs.iter().cloned().fold(f32::MAX, f32::min);
        let height = ys.iter().cloned().fold(f32::MIN, f32::max)
            - ys.iter().cloned().fold(f32::MAX, f32::min);
        assert_eq!(width, 1.0);
        assert_eq!(height, 1.0);
    }

    #[test]
    fn layout_matches_vertex_type() {
        let layout = QuadVertex::buffer_layout();
        assert_eq!(layout.array_stride, mem::size_of::<QuadVertex>() as u64);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[0].offset, 0);
    }

    #[test]
    fn shader_declares_both_entry_points() {
        assert!(QUAD_WGSL.contains("fn vs_main"));
        assert!(QUAD_WGSL.contains("fn fs_main"));
    }
}

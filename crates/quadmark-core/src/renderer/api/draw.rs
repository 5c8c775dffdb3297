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

//! The per-call draw submission descriptor and its completion callback.

use super::buffer::BufferId;
use super::pipeline::RenderPipelineId;
use crate::renderer::timing::PassTiming;

/// A double-precision RGBA clear color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    /// Red channel, 0.0..=1.0.
    pub r: f64,
    /// Green channel, 0.0..=1.0.
    pub g: f64,
    /// Blue channel, 0.0..=1.0.
    pub b: f64,
    /// Alpha channel, 0.0..=1.0.
    pub a: f64,
}

impl ClearColor {
    /// Opaque black.
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
}

/// Describes one timed draw submission.
///
/// Each submission is an independent unit of GPU work: its command buffer is
/// created for this call, submitted once, and discarded after the completion
/// fires.
#[derive(Debug, Clone)]
pub struct DrawDescriptor<'a> {
    /// An optional debug label for the command buffer and pass.
    pub label: Option<&'a str>,
    /// The pipeline to rasterize with.
    pub pipeline: RenderPipelineId,
    /// The vertex buffer bound at slot 0.
    pub vertex_buffer: BufferId,
    /// Number of vertices to draw.
    pub vertex_count: u32,
    /// The color the target is cleared to before the draw.
    pub clear_color: ClearColor,
}

/// Invoked exactly once when the GPU signals that a submitted draw finished.
///
/// May run on a thread other than the submitting one. Completions of
/// overlapping submissions carry no ordering guarantee.
pub type DrawCompletion = Box<dyn FnOnce(PassTiming) + Send + 'static>;

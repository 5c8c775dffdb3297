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

use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use std::fmt::Debug;

/// The contract between the renderer and a concrete graphics backend.
///
/// A `GraphicsDevice` wraps one selected GPU device and its command queue.
/// It hands out opaque IDs for the resources it creates; the renderer never
/// sees backend types. All methods take `&self` — implementations must be
/// internally synchronized, since overlapping [`submit_draw`] calls from
/// multiple threads are allowed.
///
/// [`submit_draw`]: GraphicsDevice::submit_draw
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a shader module from the provided descriptor.
    ///
    /// ## Errors
    /// * `ResourceError` - If shader compilation fails.
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError>;

    /// Creates a render pipeline from the provided descriptor.
    ///
    /// ## Errors
    /// * `ResourceError` - If the pipeline state fails to compile, or a
    ///   referenced shader module does not exist.
    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError>;

    /// Creates a new GPU buffer and initializes it with the provided data.
    ///
    /// ## Errors
    /// * `ResourceError` - If the buffer creation fails.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Records one render pass described by `descriptor` into a fresh
    /// command buffer, submits it, and returns without waiting.
    ///
    /// The `completion` callback is invoked exactly once with the measured
    /// pass timing when the device signals that the work has finished. It
    /// may run on another thread. If this method returns an error, the
    /// submission never happened and the callback is never invoked.
    ///
    /// ## Errors
    /// * `RenderError::SubmissionFailed` - If the command buffer could not
    ///   be created or submitted.
    fn submit_draw(
        &self,
        descriptor: &DrawDescriptor,
        completion: DrawCompletion,
    ) -> Result<(), RenderError>;

    /// Get the adapter information of the selected device.
    fn adapter_info(&self) -> GraphicsAdapterInfo;

    /// The format of the color target draws are recorded against.
    fn target_format(&self) -> TextureFormat;

    /// Indicate if a specific feature is supported.
    ///
    /// Recognized names include `"gpu_timestamps"`.
    fn supports_feature(&self, feature_name: &str) -> bool;
}

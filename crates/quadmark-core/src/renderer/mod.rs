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

//! Provides the public, backend-agnostic rendering contracts and the quad
//! renderer built on top of them.
//!
//! This module defines the "common language" between the renderer and a
//! graphics backend: the abstract [`GraphicsDevice`] trait, descriptor and
//! ID types in [`api`], and the error hierarchy in [`error`]. The 'how' is
//! handled by a concrete backend in the `quadmark-infra` crate, which
//! implements these traits; [`QuadRenderer`] only ever talks to the trait.

pub mod api;
pub mod error;
pub mod quad;
pub mod timing;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{PipelineError, RenderError, ResourceError, ShaderError};
pub use self::quad::{QuadVertex, QUAD_VERTEX_COUNT, QUAD_VERTICES, QUAD_WGSL};
pub use self::timing::{PassTiming, TimingSource};
pub use self::traits::GraphicsDevice;

use std::borrow::Cow;
use std::mem;
use std::sync::Arc;

/// Renders one fixed quad per call and reports the GPU time asynchronously.
///
/// Construction selects nothing itself — it takes an already-selected
/// [`GraphicsDevice`] and compiles the fixed-quad pipeline state against it,
/// so tests can substitute a fake device. The device handle and pipeline are
/// immutable afterwards; every [`render_with_completion`] call records and
/// submits an independent command buffer.
///
/// Overlapping calls are allowed and produce independent, separately-timed
/// completions with no ordering guarantee.
///
/// [`render_with_completion`]: QuadRenderer::render_with_completion
#[derive(Debug)]
pub struct QuadRenderer {
    device: Arc<dyn GraphicsDevice>,
    pipeline: RenderPipelineId,
    vertex_buffer: BufferId,
    gpu_name: String,
}

impl QuadRenderer {
    /// Builds the renderer against the given device.
    ///
    /// Compiles the quad shader module and render pipeline, and uploads the
    /// quad's vertex buffer. Any failure surfaces as
    /// [`RenderError::DeviceUnavailable`] and no renderer value is produced.
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Result<Self, RenderError> {
        let adapter_info = device.adapter_info();
        log::info!(
            "QuadRenderer: Initializing against \"{}\" ({:?}, {:?})",
            adapter_info.name,
            adapter_info.backend_type,
            adapter_info.device_type
        );

        let shader_module = device
            .create_shader_module(&ShaderModuleDescriptor {
                label: Some("Quad Shader"),
                source: ShaderSourceData::Wgsl(Cow::Borrowed(QUAD_WGSL)),
            })
            .map_err(|e| RenderError::DeviceUnavailable(e.to_string()))?;

        let pipeline = device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(Cow::Borrowed("Quad Pipeline")),
                vertex_shader_module: shader_module,
                vertex_entry_point: Cow::Borrowed("vs_main"),
                fragment_shader_module: Some(shader_module),
                fragment_entry_point: Some(Cow::Borrowed("fs_main")),
                vertex_buffers_layout: Cow::Owned(vec![QuadVertex::buffer_layout()]),
                topology: PrimitiveTopology::TriangleStrip,
                color_format: device.target_format(),
            })
            .map_err(|e| RenderError::DeviceUnavailable(e.to_string()))?;

        let vertex_buffer = device
            .create_buffer_with_data(
                &BufferDescriptor {
                    label: Some(Cow::Borrowed("Quad Vertex Buffer")),
                    size: mem::size_of_val(&QUAD_VERTICES) as u64,
                    usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
                    mapped_at_creation: false,
                },
                bytemuck::cast_slice(&QUAD_VERTICES),
            )
            .map_err(|e| RenderError::DeviceUnavailable(e.to_string()))?;

        log::debug!("QuadRenderer: pipeline {pipeline:?}, vertex buffer {vertex_buffer:?}");

        Ok(Self {
            device,
            pipeline,
            vertex_buffer,
            gpu_name: adapter_info.name,
        })
    }

    /// The selected device's human-readable name, fixed for this instance.
    pub fn gpu_name(&self) -> &str {
        &self.gpu_name
    }

    /// Submits one asynchronous quad draw.
    ///
    /// Returns as soon as the command buffer is submitted; `completion` is
    /// invoked exactly once with the measured [`PassTiming`] when the device
    /// signals that the work finished, possibly on another thread.
    ///
    /// On `Err`, nothing was submitted and `completion` will never run.
    pub fn render_with_completion<F>(&self, completion: F) -> Result<(), RenderError>
    where
        F: FnOnce(PassTiming) + Send + 'static,
    {
        self.device.submit_draw(
            &DrawDescriptor {
                label: Some("Quad Draw"),
                pipeline: self.pipeline,
                vertex_buffer: self.vertex_buffer,
                vertex_count: QUAD_VERTEX_COUNT,
                clear_color: ClearColor::BLACK,
            },
            Box::new(completion),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// A scriptable in-memory device: records submissions and fires their
    /// completions only when the test says so.
    #[derive(Default)]
    struct FakeDevice {
        fail_shader: bool,
        fail_submission: bool,
        next_id: AtomicUsize,
        pending: Mutex<Vec<DrawCompletion>>,
        submissions: AtomicUsize,
    }

    impl fmt::Debug for FakeDevice {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FakeDevice")
                .field("submissions", &self.submissions.load(Ordering::SeqCst))
                .finish()
        }
    }

    impl FakeDevice {
        fn fire_oldest(&self, timing: PassTiming) {
            let completion = self.pending.lock().unwrap().remove(0);
            completion(timing);
        }

        fn pending_count(&self) -> usize {
            self.pending.lock().unwrap().len()
        }

        fn timing(micros: u64) -> PassTiming {
            PassTiming {
                duration: Duration::from_micros(micros),
                source: TimingSource::TimestampQuery,
            }
        }
    }

    impl GraphicsDevice for FakeDevice {
        fn create_shader_module(
            &self,
            descriptor: &ShaderModuleDescriptor,
        ) -> Result<ShaderModuleId, ResourceError> {
            if self.fail_shader {
                return Err(ShaderError::CompilationError {
                    label: descriptor.label.unwrap_or_default().to_string(),
                    details: "no adapter".to_string(),
                }
                .into());
            }
            Ok(ShaderModuleId(self.next_id.fetch_add(1, Ordering::SeqCst)))
        }

        fn create_render_pipeline(
            &self,
            _descriptor: &RenderPipelineDescriptor,
        ) -> Result<RenderPipelineId, ResourceError> {
            Ok(RenderPipelineId(
                self.next_id.fetch_add(1, Ordering::SeqCst),
            ))
        }

        fn create_buffer_with_data(
            &self,
            _descriptor: &BufferDescriptor,
            _data: &[u8],
        ) -> Result<BufferId, ResourceError> {
            Ok(BufferId(self.next_id.fetch_add(1, Ordering::SeqCst)))
        }

        fn submit_draw(
            &self,
            _descriptor: &DrawDescriptor,
            completion: DrawCompletion,
        ) -> Result<(), RenderError> {
            if self.fail_submission {
                return Err(RenderError::SubmissionFailed(
                    "out of memory".to_string(),
                ));
            }
            self.submissions.fetch_add(1, Ordering::SeqCst);
            self.pending.lock().unwrap().push(completion);
            Ok(())
        }

        fn adapter_info(&self) -> GraphicsAdapterInfo {
            GraphicsAdapterInfo {
                name: "Fake GPU".to_string(),
                backend_type: GraphicsBackendType::Unknown,
                device_type: RendererDeviceType::VirtualGpu,
            }
        }

        fn target_format(&self) -> TextureFormat {
            TextureFormat::Rgba8UnormSrgb
        }

        fn supports_feature(&self, feature_name: &str) -> bool {
            feature_name == "gpu_timestamps"
        }
    }

    #[test]
    fn construction_reports_device_name() {
        let renderer = QuadRenderer::new(Arc::new(FakeDevice::default())).unwrap();
        assert_eq!(renderer.gpu_name(), "Fake GPU");
    }

    #[test]
    fn construction_failure_is_device_unavailable() {
        let device = Arc::new(FakeDevice {
            fail_shader: true,
            ..Default::default()
        });
        match QuadRenderer::new(device) {
            Err(RenderError::DeviceUnavailable(msg)) => {
                assert!(msg.contains("no adapter"), "unexpected message: {msg}");
            }
            other => panic!("expected DeviceUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn render_returns_before_completion_fires() {
        let device = Arc::new(FakeDevice::default());
        let renderer = QuadRenderer::new(device.clone()).unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_in_callback = fired.clone();
        renderer
            .render_with_completion(move |_| {
                fired_in_callback.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        // The call returned; the device is still holding the completion.
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(device.pending_count(), 1);

        device.fire_oldest(FakeDevice::timing(120));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn completion_fires_exactly_once_with_non_negative_seconds() {
        let device = Arc::new(FakeDevice::default());
        let renderer = QuadRenderer::new(device.clone()).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_callback = calls.clone();
        renderer
            .render_with_completion(move |timing| {
                assert!(timing.seconds() >= 0.0);
                calls_in_callback.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        device.fire_oldest(FakeDevice::timing(80));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(device.pending_count(), 0);
    }

    #[test]
    fn overlapping_renders_complete_independently() {
        let device = Arc::new(FakeDevice::default());
        let renderer = QuadRenderer::new(device.clone()).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..2 {
            let seen = seen.clone();
            renderer
                .render_with_completion(move |timing| {
                    seen.lock().unwrap().push(timing.duration);
                })
                .unwrap();
        }
        assert_eq!(device.pending_count(), 2);

        // Each in-flight call owns its own completion and timing value.
        device.fire_oldest(FakeDevice::timing(100));
        device.fire_oldest(FakeDevice::timing(300));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![Duration::from_micros(100), Duration::from_micros(300)]
        );
    }

    #[test]
    fn submission_failure_is_synchronous_and_skips_the_callback() {
        let device = Arc::new(FakeDevice {
            fail_submission: true,
            ..Default::default()
        });
        let renderer = QuadRenderer::new(device.clone()).unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_in_callback = fired.clone();
        let result = renderer.render_with_completion(move |_| {
            fired_in_callback.fetch_add(1, Ordering::SeqCst);
        });

        assert!(matches!(result, Err(RenderError::SubmissionFailed(_))));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(device.pending_count(), 0);
    }
}

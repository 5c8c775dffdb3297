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

//! Per-submission GPU timestamp instrumentation.
//!
//! Each timed draw owns a [`PassTimer`]: a two-entry timestamp query set
//! (pass begin / pass end), a resolve buffer, and a read-back staging
//! buffer. The resources are single-use — created with the submission,
//! mapped once, then dropped with the completion — so overlapping
//! submissions can never contaminate each other's readings.

use crate::graphics::wgpu::poller::PendingSubmission;
use quadmark_core::renderer::{DrawCompletion, PassTiming, TimingSource};
use quadmark_core::Stopwatch;
use std::sync::Arc;
use std::time::Duration;

const QUERY_COUNT: u32 = 2;
const BUFFER_SIZE: u64 = QUERY_COUNT as u64 * std::mem::size_of::<u64>() as u64;

/// Timestamp instrumentation for one submission.
#[derive(Debug)]
pub(crate) struct PassTimer {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    period_ns: f32,
}

impl PassTimer {
    /// Checks if the required features for timestamp queries are available.
    pub(crate) fn feature_available(features: wgpu::Features) -> bool {
        features.contains(wgpu::Features::TIMESTAMP_QUERY)
    }

    pub(crate) fn new(device: &wgpu::Device, period_ns: f32) -> Self {
        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("Quadmark Pass Timestamp QuerySet"),
            ty: wgpu::QueryType::Timestamp,
            count: QUERY_COUNT,
        });

        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quadmark Pass Timestamp Resolve Buffer"),
            size: BUFFER_SIZE,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quadmark Pass Timestamp Staging Buffer"),
            size: BUFFER_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            query_set,
            resolve_buffer,
            staging_buffer,
            period_ns,
        }
    }

    /// Timestamp writes bracketing the render pass: begin -> index 0, end -> index 1.
    pub(crate) fn render_pass_writes(&self) -> wgpu::RenderPassTimestampWrites<'_> {
        wgpu::RenderPassTimestampWrites {
            query_set: &self.query_set,
            beginning_of_pass_write_index: Some(0),
            end_of_pass_write_index: Some(1),
        }
    }

    /// Records the resolve + copy-to-staging into the submission's encoder.
    pub(crate) fn resolve(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.resolve_query_set(&self.query_set, 0..QUERY_COUNT, &self.resolve_buffer, 0);
        encoder.copy_buffer_to_buffer(&self.resolve_buffer, 0, &self.staging_buffer, 0, BUFFER_SIZE);
    }

    /// Schedules the read-back after the submission and hands the timer to
    /// the map callback. Must be called after `queue.submit`.
    ///
    /// `round_trip` is the stopwatch started at submission; it backs the
    /// fallback value if the timestamp read-back fails, so the completion
    /// always receives a measured duration.
    pub(crate) fn read_back(
        self,
        round_trip: Stopwatch,
        completion: DrawCompletion,
        guard: PendingSubmission,
    ) {
        let timer = Arc::new(self);
        let timer_in_callback = Arc::clone(&timer);
        timer
            .staging_buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let measured = match result {
                    Ok(()) => timer_in_callback.read_mapped(),
                    Err(e) => {
                        log::warn!("Timestamp staging map_async failed: {e:?}");
                        None
                    }
                };
                let timing = match measured {
                    Some(duration) => PassTiming {
                        duration,
                        source: TimingSource::TimestampQuery,
                    },
                    None => PassTiming {
                        duration: round_trip.elapsed().unwrap_or_default(),
                        source: TimingSource::QueueRoundTrip,
                    },
                };
                completion(timing);
                drop(guard);
            });
    }

    fn read_mapped(&self) -> Option<Duration> {
        let slice = self.staging_buffer.slice(..);
        let data = slice.get_mapped_range();
        let timestamps: [u64; 2] = bytemuck::pod_read_unaligned(&data[..BUFFER_SIZE as usize]);
        drop(data);
        self.staging_buffer.unmap();

        let [begin, end] = timestamps;
        // Some backends report zeroed or non-monotonic timestamps; those
        // readings are unusable.
        if end > begin {
            let nanos = (end - begin) as f64 * self.period_ns as f64;
            Some(Duration::from_nanos(nanos as u64))
        } else {
            log::warn!(
                "Non-monotonic GPU timestamps (begin {begin}, end {end}); \
                 falling back to queue round-trip timing."
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_gate_requires_timestamp_query() {
        assert!(PassTimer::feature_available(
            wgpu::Features::TIMESTAMP_QUERY
        ));
        assert!(!PassTimer::feature_available(wgpu::Features::empty()));
    }

    #[test]
    fn buffers_hold_two_timestamps() {
        assert_eq!(QUERY_COUNT, 2);
        assert_eq!(BUFFER_SIZE, 16);
    }
}

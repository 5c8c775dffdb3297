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

//! The measured result of one timed render pass.

use std::time::Duration;

/// Where a reported duration was measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingSource {
    /// GPU timestamp queries around the recorded pass. Pure GPU execution
    /// time, independent of CPU scheduling.
    TimestampQuery,
    /// The CPU-observed interval from queue submission to the device's
    /// completion signal. Used when timestamp queries are unavailable or a
    /// read-back failed.
    QueueRoundTrip,
}

/// The timing of one completed render pass.
///
/// Delivered to the completion callback of every accepted submission,
/// exactly once. The duration is always a real measurement; `source` tells
/// which of the two instruments produced it.
#[derive(Debug, Clone, Copy)]
pub struct PassTiming {
    /// How long the pass took.
    pub duration: Duration,
    /// Which instrument measured it.
    pub source: TimingSource,
}

impl PassTiming {
    /// The duration in seconds, as delivered to callers.
    #[inline]
    pub fn seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_is_non_negative() {
        let timing = PassTiming {
            duration: Duration::from_micros(250),
            source: TimingSource::TimestampQuery,
        };
        assert!(timing.seconds() >= 0.0);
        assert_eq!(timing.seconds(), 0.000_25);
    }
}

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

//! The background thread that drives WGPU callback delivery.
//!
//! WGPU only invokes `map_async` and `on_submitted_work_done` callbacks
//! while the device is being polled. Quadmark has no frame loop to
//! piggyback polling on, so the device owns one thread that polls blocking
//! whenever at least one submission is outstanding and parks otherwise.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

/// State shared between the poll thread and submissions.
#[derive(Debug)]
pub(crate) struct PollerShared {
    pending: Mutex<usize>,
    work_available: Condvar,
    shutdown: AtomicBool,
}

impl PollerShared {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(0),
            work_available: Condvar::new(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Registers one outstanding submission. The returned guard must be
    /// dropped exactly when the submission's completion has run.
    pub(crate) fn register(self: &Arc<Self>) -> PendingSubmission {
        let mut pending = self.pending.lock().unwrap();
        *pending += 1;
        self.work_available.notify_all();
        PendingSubmission {
            shared: Arc::clone(self),
        }
    }

    /// Tells the poll thread to exit once it is idle.
    pub(crate) fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.work_available.notify_all();
    }
}

/// RAII marker for one in-flight submission; completions own their guard so
/// the counter drops only after the callback has run.
#[derive(Debug)]
pub(crate) struct PendingSubmission {
    shared: Arc<PollerShared>,
}

impl Drop for PendingSubmission {
    fn drop(&mut self) {
        let mut pending = self.shared.pending.lock().unwrap();
        *pending = pending.saturating_sub(1);
        self.shared.work_available.notify_all();
    }
}

/// Spawns the poll thread for the given device.
pub(crate) fn spawn(
    device: wgpu::Device,
    shared: Arc<PollerShared>,
) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("quadmark-device-poll".to_string())
        .spawn(move || {
            log::debug!("Device poll thread started.");
            loop {
                {
                    let mut pending = shared.pending.lock().unwrap();
                    while *pending == 0 && !shared.shutdown.load(Ordering::SeqCst) {
                        pending = shared.work_available.wait(pending).unwrap();
                    }
                }
                if shared.shutdown.load(Ordering::SeqCst) {
                    break;
                }
                // PollType::Wait blocks until the queue is empty and runs
                // any completed map_async / on_submitted_work_done callbacks.
                if let Err(e) = device.poll(wgpu::PollType::wait_indefinitely()) {
                    log::warn!("Device poll failed: {e:?}");
                }
            }
            log::debug!("Device poll thread exiting.");
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_guard_counts_up_and_down() {
        let shared = PollerShared::new();
        assert_eq!(*shared.pending.lock().unwrap(), 0);
        {
            let _first = shared.register();
            let _second = shared.register();
            assert_eq!(*shared.pending.lock().unwrap(), 2);
        }
        assert_eq!(*shared.pending.lock().unwrap(), 0);
    }

    #[test]
    fn shutdown_flag_is_sticky() {
        let shared = PollerShared::new();
        shared.request_shutdown();
        assert!(shared.shutdown.load(Ordering::SeqCst));
    }
}

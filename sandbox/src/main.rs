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

// Quadmark Sandbox
// Selects a GPU, renders a handful of timed quads, prints the results.

use std::sync::{mpsc, Arc};

use anyhow::{Context, Result};
use quadmark_core::renderer::{DeviceSelectionConfig, GraphicsDevice, PowerPreference};
use quadmark_core::QuadRenderer;
use quadmark_infra::WgpuDevice;

const PASS_COUNT: usize = 8;

fn main() -> Result<()> {
    env_logger::init();

    let device = WgpuDevice::request(&DeviceSelectionConfig {
        power_preference: PowerPreference::HighPerformance,
        force_fallback_adapter: false,
    })
    .context("selecting a graphics device")?;
    let device: Arc<dyn GraphicsDevice> = Arc::new(device);

    let renderer = QuadRenderer::new(device).context("building the quad renderer")?;
    println!("GPU: {}", renderer.gpu_name());

    let (tx, rx) = mpsc::channel();
    for pass in 0..PASS_COUNT {
        let tx = tx.clone();
        renderer
            .render_with_completion(move |timing| {
                // Completions may arrive on the device's poll thread.
                let _ = tx.send((pass, timing));
            })
            .with_context(|| format!("submitting pass {pass}"))?;
    }
    drop(tx);

    for (pass, timing) in rx {
        println!(
            "pass {pass}: {:.6} s ({:?})",
            timing.seconds(),
            timing.source
        );
    }

    log::info!("All {PASS_COUNT} passes completed.");
    Ok(())
}

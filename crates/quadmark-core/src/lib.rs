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

//! # Quadmark Core
//!
//! Backend-agnostic contracts for the quadmark GPU timing probe: the
//! [`GraphicsDevice`](renderer::GraphicsDevice) trait, its descriptor and
//! error types, and the [`QuadRenderer`](renderer::QuadRenderer) that drives
//! one timed quad draw per call.
//!
//! Concrete backends (the WGPU one lives in `quadmark-infra`) implement the
//! traits defined here; nothing in this crate touches a graphics API.

#![warn(missing_docs)]

pub mod renderer;
pub mod utils;

pub use renderer::QuadRenderer;
pub use utils::timer::Stopwatch;

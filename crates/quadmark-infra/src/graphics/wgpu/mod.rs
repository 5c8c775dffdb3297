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

//! The WGPU graphics backend.
//!
//! [`WgpuDevice`] implements `quadmark_core`'s `GraphicsDevice` trait:
//! adapter selection ([`backend`]), device/queue acquisition ([`context`]),
//! resource registries and timed draw submission ([`device`]), per-call
//! timestamp instrumentation ([`timing`]), and the background poll thread
//! that drives completion delivery ([`poller`]).

pub mod backend;
pub mod context;
mod conversions;
pub mod device;
mod poller;
mod timing;

pub use backend::WgpuBackendSelector;
pub use context::WgpuGraphicsContext;
pub use device::WgpuDevice;

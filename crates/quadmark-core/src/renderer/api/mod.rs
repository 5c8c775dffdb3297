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

//! Backend-agnostic rendering API.
//!
//! Organized into logical sub-modules:
//!
//! - **[`adapter`]**: adapter information and device selection policy.
//! - **[`buffer`]**: GPU buffer handles, descriptors, and usage flags.
//! - **[`shader`]**: shader module sources and handles.
//! - **[`pipeline`]**: render pipeline state descriptors.
//! - **[`draw`]**: the per-call draw submission descriptor.

pub mod adapter;
pub mod buffer;
pub mod draw;
pub mod pipeline;
pub mod shader;

pub use adapter::*;
pub use buffer::*;
pub use draw::*;
pub use pipeline::*;
pub use shader::*;

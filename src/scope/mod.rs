// Copyright 2025 Dynscope Contributors
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

//! Scope management: frame chains, the per-thread head, and bind-and-run
//!
//! Three pieces cooperate here:
//!
//! - **`frame`**: immutable binding frames linked into a parent chain,
//!   consulted innermost-first during lookup.
//! - **`current`**: the per-thread slot holding the active chain head, and
//!   the install/restore guard that makes frame retirement unconditional.
//! - **`bindings`**: the public [`Bindings`] builder that validates a call's
//!   bindings, pushes the frame, runs the work, and pops.
//!
//! No state is shared between threads: each thread's head is its own, and
//! frames themselves are immutable, so the `Arc` structural sharing used by
//! snapshots is invisible to callers.

pub mod bindings;
pub(crate) mod current;
pub(crate) mod frame;

pub use bindings::Bindings;

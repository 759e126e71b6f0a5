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

//! Nested, stack-discipline propagation of immutable context values
//!
//! `dynscope` lets a caller bind values to context keys for the dynamic
//! extent of a unit of work. Any code transitively invoked within that
//! extent reads the innermost active value without parameter threading; the
//! binding is invisible and unreachable once the call completes, on every
//! exit path.
//!
//! # Architecture overview
//!
//! - [`ContextKey<T>`]: an unforgeable, typed token for one binding slot.
//!   Identity is a process-unique id; labels are diagnostic only.
//! - [`Bindings`]: collects (key, value) pairs and runs a closure
//!   ([`run`](Bindings::run)) or future ([`run_future`](Bindings::run_future))
//!   with a frame containing exactly those bindings pushed for its duration.
//! - Frames form a per-thread LIFO chain; lookup walks innermost to
//!   outermost, so an inner rebinding shadows an outer one for its extent
//!   only and the outer value reappears automatically afterwards.
//! - [`Snapshot`]: explicit capture/reinstate of a chain across threads or
//!   tasks. Nothing is inherited implicitly across concurrency boundaries.
//! - [`ScopedFuture`]: carries its own chain and installs it around every
//!   poll, making a task its own execution context.
//!
//! # Example
//!
//! ```
//! use dynscope::{Bindings, ContextKey};
//! use once_cell::sync::Lazy;
//!
//! static USER: Lazy<ContextKey<String>> =
//!     Lazy::new(|| ContextKey::with_label("user"));
//! static TXN: Lazy<ContextKey<String>> =
//!     Lazy::new(|| ContextKey::with_label("txn"));
//!
//! fn process_task() -> String {
//!     // Reads work at any call depth, no parameters threaded through.
//!     format!(
//!         "{} / {}",
//!         USER.get_cloned().unwrap(),
//!         TXN.get_cloned().unwrap()
//!     )
//! }
//!
//! let line = Bindings::new()
//!     .bind(&USER, "Alice".to_string())
//!     .bind(&TXN, "12345".to_string())
//!     .run(process_task)
//!     .unwrap();
//!
//! assert_eq!(line, "Alice / 12345");
//!
//! // Outside the extent the bindings are gone.
//! assert!(!USER.is_bound());
//! assert!(TXN.get().is_err());
//! ```
//!
//! # Failure semantics
//!
//! Reading an unbound key is a `Result`-surfaced error
//! ([`ScopeError::UnboundKey`]), never a silent default; guard with
//! [`ContextKey::is_bound`] or [`ContextKey::try_get`]. Binding the same key
//! twice in one call is rejected ([`ScopeError::DuplicateKey`]) before the
//! work runs. Failures inside the work itself, `Err` values and panics
//! alike, propagate unchanged after the frame is retired.

pub mod error;
pub mod future;
pub mod key;
pub mod scope;
pub mod snapshot;

pub use error::{Result, ScopeError};
pub use future::ScopedFuture;
pub use key::{ContextKey, KeyId};
pub use scope::Bindings;
pub use snapshot::Snapshot;

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

//! The bind-and-run surface
//!
//! [`Bindings`] collects (key, value) pairs and establishes them for the
//! dynamic extent of a unit of work:
//!
//! ```
//! use dynscope::{Bindings, ContextKey};
//!
//! let user: ContextKey<String> = ContextKey::with_label("user");
//!
//! let greeting = Bindings::new()
//!     .bind(&user, "Alice".to_string())
//!     .run(|| format!("hello, {}", user.get_cloned().unwrap()))
//!     .unwrap();
//!
//! assert_eq!(greeting, "hello, Alice");
//! assert!(!user.is_bound());
//! ```
//!
//! `run` executes the work synchronously on the calling thread; the frame it
//! pushes is popped exactly once on every exit path, so bindings never leak
//! past the call.

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::current::{self, InstallGuard};
use super::frame::{Binding, Frame};
use crate::error::{Result, ScopeError};
use crate::key::{ContextKey, KeyId};

/// One collected builder entry: key id, key label, erased value
type Entry = (KeyId, Option<Arc<str>>, Arc<dyn Any + Send + Sync>);

/// Builder for the set of bindings one frame introduces
///
/// Collecting is infallible; duplicate keys are rejected by
/// [`run`](Self::run) before any frame exists, so the unit of work provably
/// never executes for an ambiguous call. An empty `Bindings` is legal and
/// pushes an empty frame.
#[derive(Default)]
pub struct Bindings {
    entries: SmallVec<[Entry; 4]>,
}

impl Bindings {
    /// Create an empty set of bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one (key, value) pair
    ///
    /// The value is immutable for the life of the frame; shadow it with a
    /// nested bind to change the effective value within a sub-scope.
    #[must_use = "bindings do nothing until `run` is called"]
    pub fn bind<T: Send + Sync + 'static>(mut self, key: &ContextKey<T>, value: T) -> Self {
        self.entries.push((key.id(), key.label_arc(), Arc::new(value)));
        self
    }

    /// Number of collected entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries have been collected
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Establish the bindings for the dynamic extent of `work`
    ///
    /// Pushes a frame containing exactly these bindings onto the calling
    /// thread's chain, runs `work` synchronously, and pops that frame before
    /// returning. The pop happens exactly once, unconditionally: on normal
    /// return, on an `Err` produced by the work, and on unwind.
    ///
    /// During `work` (and everything it calls on this thread), lookups for
    /// the bound keys resolve to the values given here, shadowing any outer
    /// binding for the same key; other keys fall through to outer frames.
    /// Whatever `work` returns is propagated unchanged inside `Ok`.
    ///
    /// # Errors
    ///
    /// [`ScopeError::DuplicateKey`] when the same key was bound more than
    /// once in this call; the frame is never created and `work` never runs.
    pub fn run<R>(self, work: impl FnOnce() -> R) -> Result<R> {
        let frame = self.into_frame()?;
        let _guard = InstallGuard::install(Some(Arc::new(frame)));
        Ok(work())
    }

    /// Build the frame, rejecting duplicate keys, parented by the calling
    /// thread's current head
    pub(crate) fn into_frame(self) -> Result<Frame> {
        let mut bindings =
            FxHashMap::with_capacity_and_hasher(self.entries.len(), Default::default());
        for (id, label, value) in self.entries {
            let key = id.describe(label.as_deref());
            if bindings.insert(id, Binding { value, label }).is_some() {
                return Err(ScopeError::DuplicateKey { key });
            }
        }
        Ok(Frame::new(bindings, current::head()))
    }
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self
            .entries
            .iter()
            .map(|(id, label, _)| id.describe(label.as_deref()))
            .collect();
        f.debug_struct("Bindings").field("keys", &keys).finish()
    }
}

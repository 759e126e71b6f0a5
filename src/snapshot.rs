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

//! Explicit propagation of bindings across execution contexts
//!
//! Bindings are never inherited implicitly: a spawned thread or task starts
//! with an empty chain. When a child context should observe the parent's
//! bindings, capture a [`Snapshot`] at fork time, move it into the child,
//! and reinstate it there:
//!
//! ```
//! use dynscope::{Bindings, ContextKey, Snapshot};
//!
//! let user: ContextKey<String> = ContextKey::with_label("user");
//!
//! Bindings::new()
//!     .bind(&user, "Alice".to_string())
//!     .run(|| {
//!         let snapshot = Snapshot::capture();
//!         std::thread::spawn(move || {
//!             // Without the snapshot the key is unbound here.
//!             assert!(!user.is_bound());
//!             let name = snapshot.run(|| user.get_cloned().unwrap());
//!             assert_eq!(name, "Alice");
//!         })
//!         .join()
//!         .unwrap();
//!     })
//!     .unwrap();
//! ```
//!
//! Frames are immutable, so a snapshot is a cheap `Arc` clone of the chain
//! head and is safe to send across threads.

use std::fmt;
use std::sync::Arc;

use crate::scope::current::{self, InstallGuard};
use crate::scope::frame::Frame;

/// A captured frame chain, reinstatable in another execution context
///
/// Capture is intended at fork time, within the extent whose bindings the
/// child should observe. Reinstating installs the captured chain as the
/// running thread's head for the duration of the closure (or future, via
/// [`wrap`](Self::wrap)), shadowing nothing and leaking nothing: the
/// previous head is guard-restored.
#[derive(Clone)]
pub struct Snapshot {
    head: Option<Arc<Frame>>,
}

impl Snapshot {
    /// Capture the calling thread's current chain
    pub fn capture() -> Self {
        Self {
            head: current::head(),
        }
    }

    pub(crate) fn from_head(head: Option<Arc<Frame>>) -> Self {
        Self { head }
    }

    pub(crate) fn head(&self) -> Option<Arc<Frame>> {
        self.head.clone()
    }

    /// Whether the captured chain has no frames at all
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of frames in the captured chain
    pub fn depth(&self) -> usize {
        self.head.as_deref().map_or(0, Frame::depth)
    }

    /// Run `work` with the captured chain installed as the current head
    ///
    /// The calling thread's own chain is invisible to `work` and restored
    /// unconditionally afterwards, including on unwind.
    pub fn run<R>(&self, work: impl FnOnce() -> R) -> R {
        let _guard = InstallGuard::install(self.head.clone());
        work()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot").field("depth", &self.depth()).finish()
    }
}

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

//! Binding frames and the parent-linked chain
//!
//! A [`Frame`] records the bindings introduced by one bind call plus a link
//! to the next-outer frame, forming a chain rooted at "no bindings". The
//! chain is strictly LIFO per execution context: lookup starts at the
//! innermost frame and walks outward through parent links until a match is
//! found or the chain ends.
//!
//! Frames are immutable after construction. A frame's lifecycle is realized
//! structurally rather than as a stored state: constructed but not yet
//! installed (pending), reachable as a thread's chain head (active), and
//! unlinked when the head is restored (retired). Retired frames are
//! unreachable unless a [`Snapshot`](crate::Snapshot) deliberately extended
//! the chain's lifetime.

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::key::KeyId;

/// Type-erased bound value
///
/// `Send + Sync` so that chains can cross threads inside snapshots and
/// scoped futures.
pub(crate) type BoundValue = Arc<dyn Any + Send + Sync>;

/// One (key, value) pair active within a frame
///
/// The value is fixed when the frame is created; changing the effective
/// value within a sub-scope requires a new nested bind.
pub(crate) struct Binding {
    pub(crate) value: BoundValue,
    /// Label of the binding key, carried for diagnostics only
    #[allow(dead_code)]
    pub(crate) label: Option<Arc<str>>,
}

/// The bindings introduced by one bind call, linked to the next-outer frame
pub(crate) struct Frame {
    bindings: FxHashMap<KeyId, Binding>,
    parent: Option<Arc<Frame>>,
}

impl Frame {
    pub(crate) fn new(bindings: FxHashMap<KeyId, Binding>, parent: Option<Arc<Frame>>) -> Self {
        Self { bindings, parent }
    }

    /// Innermost-first lookup: this frame, then outward through parents
    pub(crate) fn lookup(&self, id: KeyId) -> Option<&Binding> {
        let mut frame = self;
        loop {
            if let Some(binding) = frame.bindings.get(&id) {
                return Some(binding);
            }
            match &frame.parent {
                Some(parent) => frame = parent,
                None => return None,
            }
        }
    }

    pub(crate) fn contains(&self, id: KeyId) -> bool {
        self.lookup(id).is_some()
    }

    /// Number of bindings introduced at this level (parents excluded)
    pub(crate) fn local_len(&self) -> usize {
        self.bindings.len()
    }

    /// Chain length counting this frame and all parents
    pub(crate) fn depth(&self) -> usize {
        let mut depth = 1;
        let mut frame = self;
        while let Some(parent) = &frame.parent {
            depth += 1;
            frame = parent;
        }
        depth
    }
}

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

//! Per-thread active chain head
//!
//! Each OS thread owns one slot holding the head of its active frame chain.
//! The slot is only ever touched by its own thread, so no locking is
//! involved anywhere in the mechanism.
//!
//! [`InstallGuard`] is the single way the head changes: it swaps a new head
//! in and restores the previous one when dropped. Because the restore lives
//! in `Drop`, it runs on every exit path of the installing call, including
//! `?`-propagated errors and panics. A frame can therefore never outlive the
//! dynamic extent of the call that installed it.

use std::cell::RefCell;
use std::sync::Arc;

use super::frame::{BoundValue, Frame};
use crate::key::KeyId;

thread_local! {
    static ACTIVE_HEAD: RefCell<Option<Arc<Frame>>> = const { RefCell::new(None) };
}

/// Clone of the calling thread's current chain head
pub(crate) fn head() -> Option<Arc<Frame>> {
    ACTIVE_HEAD.with(|head| head.borrow().clone())
}

/// Innermost-first lookup on the calling thread's chain
pub(crate) fn lookup(id: KeyId) -> Option<BoundValue> {
    ACTIVE_HEAD.with(|head| {
        head.borrow()
            .as_deref()
            .and_then(|frame| frame.lookup(id))
            .map(|binding| binding.value.clone())
    })
}

/// Whether any active frame on the calling thread binds `id`
pub(crate) fn contains(id: KeyId) -> bool {
    ACTIVE_HEAD.with(|head| {
        head.borrow()
            .as_deref()
            .is_some_and(|frame| frame.contains(id))
    })
}

/// Guard that installs a chain head and restores the previous one on drop
pub(crate) struct InstallGuard {
    previous: Option<Arc<Frame>>,
}

impl InstallGuard {
    /// Swap `new_head` in as the calling thread's chain head
    ///
    /// The previous head is held by the guard and restored when the guard
    /// drops, which is the Active → Retired transition for every frame
    /// `new_head` introduced.
    pub(crate) fn install(new_head: Option<Arc<Frame>>) -> Self {
        if log::log_enabled!(log::Level::Trace) {
            match &new_head {
                Some(frame) => log::trace!(
                    "installing scope head: depth {}, {} local bindings",
                    frame.depth(),
                    frame.local_len()
                ),
                None => log::trace!("installing empty scope head"),
            }
        }
        let previous = ACTIVE_HEAD.with(|head| head.replace(new_head));
        Self { previous }
    }
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        ACTIVE_HEAD.with(|head| head.replace(self.previous.take()));
        log::trace!("scope head restored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ContextKey;
    use rustc_hash::FxHashMap;

    use super::super::frame::Binding;

    fn single_binding_frame(id: KeyId, value: &str) -> Arc<Frame> {
        let mut bindings = FxHashMap::default();
        bindings.insert(
            id,
            Binding {
                value: Arc::new(value.to_string()),
                label: None,
            },
        );
        Arc::new(Frame::new(bindings, head()))
    }

    #[test]
    fn install_and_restore() {
        let key: ContextKey<String> = ContextKey::new();
        assert!(!contains(key.id()));

        {
            let _guard = InstallGuard::install(Some(single_binding_frame(key.id(), "v")));
            assert!(contains(key.id()));
        }

        assert!(!contains(key.id()));
        assert!(lookup(key.id()).is_none());
    }

    #[test]
    fn restore_happens_on_unwind() {
        let key: ContextKey<String> = ContextKey::new();

        let result = std::panic::catch_unwind(|| {
            let _guard = InstallGuard::install(Some(single_binding_frame(key.id(), "v")));
            panic!("work failed");
        });

        assert!(result.is_err());
        assert!(!contains(key.id()));
    }

    #[test]
    fn nested_installs_restore_in_lifo_order() {
        let key: ContextKey<String> = ContextKey::new();

        let _outer = InstallGuard::install(Some(single_binding_frame(key.id(), "outer")));
        {
            let _inner = InstallGuard::install(Some(single_binding_frame(key.id(), "inner")));
            let value = lookup(key.id()).unwrap();
            assert_eq!(value.downcast_ref::<String>().unwrap(), "inner");
        }
        let value = lookup(key.id()).unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "outer");
    }
}

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

//! Context keys: unforgeable, typed lookup tokens
//!
//! A [`ContextKey<T>`] identifies one named binding slot. Identity is a
//! process-unique id allocated from a global counter; the optional label is
//! diagnostic only and never participates in lookup, so two keys created
//! with the same label are never interchangeable.
//!
//! Keys are typically created once per logical purpose and held for the life
//! of the process, e.g. behind `once_cell::sync::Lazy`:
//!
//! ```
//! use dynscope::ContextKey;
//! use once_cell::sync::Lazy;
//!
//! static CURRENT_USER: Lazy<ContextKey<String>> =
//!     Lazy::new(|| ContextKey::with_label("current_user"));
//! ```
//!
//! The read surface (`get`, `try_get`, `get_cloned`, `is_bound`) lives on
//! the key itself and consults the calling thread's active frame chain.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, ScopeError};
use crate::scope::current;

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a [`ContextKey`]
///
/// Allocated from a relaxed global counter; never reused within a process.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyId(u64);

impl KeyId {
    fn next() -> Self {
        KeyId(NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Diagnostic description combining an optional label with the id
    pub(crate) fn describe(self, label: Option<&str>) -> String {
        match label {
            Some(label) => format!("{label} ({self})"),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An unforgeable token identifying one binding slot for values of type `T`
///
/// Equality, ordering into frame tables, and lookup all key off the id:
/// clones of a key share identity (they are the same logical slot), while
/// two separate creations never compare equal even with identical labels.
///
/// The key carries no value of its own and is `Send + Sync` regardless of
/// `T`, so it can live in a static and be consulted from any thread. Each
/// thread sees only its own bindings.
pub struct ContextKey<T> {
    id: KeyId,
    label: Option<Arc<str>>,
    _value: PhantomData<fn(T) -> T>,
}

impl<T> ContextKey<T> {
    /// Create a new key with a fresh, process-unique identity
    pub fn new() -> Self {
        Self {
            id: KeyId::next(),
            label: None,
            _value: PhantomData,
        }
    }

    /// Create a new key carrying a human-readable label for diagnostics
    ///
    /// The label shows up in error messages and `Debug` output only; it has
    /// no effect on identity or lookup.
    pub fn with_label(label: impl Into<Arc<str>>) -> Self {
        Self {
            id: KeyId::next(),
            label: Some(label.into()),
            _value: PhantomData,
        }
    }

    /// The key's process-unique identity
    pub fn id(&self) -> KeyId {
        self.id
    }

    /// The diagnostic label, if one was given at creation
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn label_arc(&self) -> Option<Arc<str>> {
        self.label.clone()
    }

    pub(crate) fn describe(&self) -> String {
        self.id.describe(self.label())
    }
}

impl<T: Send + Sync + 'static> ContextKey<T> {
    /// Read the innermost active binding for this key on the calling thread
    ///
    /// Walks the thread's frame chain from innermost to outermost and
    /// returns the value from the first frame that binds this key. Cost is
    /// proportional to nesting depth.
    ///
    /// # Errors
    ///
    /// [`ScopeError::UnboundKey`] when no active frame binds the key.
    pub fn get(&self) -> Result<Arc<T>> {
        let value = current::lookup(self.id).ok_or_else(|| ScopeError::UnboundKey {
            key: self.describe(),
        })?;
        downcast(value).ok_or_else(|| ScopeError::ValueTypeMismatch {
            key: self.describe(),
        })
    }

    /// Like [`get`](Self::get), but returns `None` instead of an error when
    /// the key is unbound
    pub fn try_get(&self) -> Option<Arc<T>> {
        current::lookup(self.id).and_then(downcast)
    }

    /// Read and clone the innermost active value
    ///
    /// # Errors
    ///
    /// [`ScopeError::UnboundKey`] when no active frame binds the key.
    pub fn get_cloned(&self) -> Result<T>
    where
        T: Clone,
    {
        self.get().map(|value| (*value).clone())
    }

    /// Whether any active frame on the calling thread binds this key
    ///
    /// Same walk as [`get`](Self::get); never fails.
    pub fn is_bound(&self) -> bool {
        current::contains(self.id)
    }
}

fn downcast<T: Send + Sync + 'static>(value: Arc<dyn Any + Send + Sync>) -> Option<Arc<T>> {
    value.downcast::<T>().ok()
}

impl<T> Default for ContextKey<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            label: self.label.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> PartialEq for ContextKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ContextKey<T> {}

impl<T> Hash for ContextKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextKey")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

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

//! Error types for scoped binding operations
//!
//! This module defines the error types surfaced by the binding and lookup
//! operations. Every error is reported to the caller of the offending
//! operation directly; the mechanism never substitutes a default value and
//! never wraps failures produced by the unit of work itself.

use thiserror::Error;

/// Result type alias for scoped binding operations
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Error type for scoped binding operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// A key was read while no active frame on the current execution
    /// context binds it.
    ///
    /// Recoverable: guard reads with [`ContextKey::is_bound`] or use
    /// [`ContextKey::try_get`] when absence is an expected state.
    ///
    /// [`ContextKey::is_bound`]: crate::ContextKey::is_bound
    /// [`ContextKey::try_get`]: crate::ContextKey::try_get
    #[error("no active binding for context key {key}")]
    UnboundKey {
        /// Diagnostic description of the key (label when present, plus id)
        key: String,
    },

    /// The same key appeared more than once in a single bind call.
    ///
    /// The intent of such a call is ambiguous, so it is rejected before any
    /// frame is created and the unit of work never runs. Rebinding a key in
    /// a *nested* bind call is not an error; that is the supported
    /// shadowing mechanism.
    #[error("context key {key} appears more than once in a single bind call")]
    DuplicateKey {
        /// Diagnostic description of the offending key
        key: String,
    },

    /// A bound value failed to downcast to the key's value type.
    ///
    /// Unreachable through the typed public API: a `KeyId` can only ever be
    /// associated with values inserted through the one `ContextKey<T>` that
    /// owns it. Kept as an error variant rather than a panic so the
    /// invariant is checked without unwinding.
    #[error("bound value for context key {key} does not match the key's value type")]
    ValueTypeMismatch {
        /// Diagnostic description of the key whose value failed to downcast
        key: String,
    },
}

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

//! Scoped futures: a task as its own execution context
//!
//! The frame chain lives in thread-local storage, which a future polled by a
//! work-stealing runtime cannot rely on: it may resume on a different thread
//! after every `.await`. [`ScopedFuture`] solves this by carrying its chain
//! in the future itself. Each `poll` installs that chain as the polling
//! thread's head and restores the previous head on exit, so:
//!
//! - the body observes its bindings across `.await` points and thread
//!   migrations;
//! - the polling thread's own bindings are never visible to the body, and
//!   the body's bindings never leak to the polling thread;
//! - a `ScopedFuture` created inside another scoped extent captures that
//!   extent as its parent, so nesting behaves exactly as in synchronous
//!   code.
//!
//! Dropping a `ScopedFuture` mid-flight leaks nothing: the chain is owned by
//! the future and each poll's install is guard-restored.
//!
//! The inner future is boxed so that polling needs no pin projection; the
//! one allocation per scoped future is the accepted cost.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::error::Result;
use crate::scope::Bindings;
use crate::scope::current::InstallGuard;
use crate::scope::frame::Frame;
use crate::snapshot::Snapshot;

/// A future that runs with its own frame chain installed around every poll
pub struct ScopedFuture<F> {
    chain: Option<Arc<Frame>>,
    inner: Pin<Box<F>>,
}

impl<F: Future> ScopedFuture<F> {
    pub(crate) fn new(chain: Option<Arc<Frame>>, inner: F) -> Self {
        Self {
            chain,
            inner: Box::pin(inner),
        }
    }
}

impl<F: Future> Future for ScopedFuture<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<F::Output> {
        // All fields are Unpin (the inner future is boxed), so projection
        // is plain field access.
        let this = self.get_mut();
        let _guard = InstallGuard::install(this.chain.clone());
        this.inner.as_mut().poll(cx)
    }
}

impl Bindings {
    /// Establish the bindings for the dynamic extent of a future
    ///
    /// The returned future owns a frame containing exactly these bindings,
    /// parented by the calling thread's chain head at this moment. Polling
    /// it installs that chain around the inner poll, so the body of `fut`
    /// observes the bindings at any depth, across `.await` points, on
    /// whichever thread the runtime resumes it.
    ///
    /// # Errors
    ///
    /// [`ScopeError::DuplicateKey`](crate::ScopeError::DuplicateKey) when
    /// the same key was bound more than once in this call; the future is
    /// never constructed.
    pub fn run_future<F: Future>(self, fut: F) -> Result<ScopedFuture<F>> {
        let frame = self.into_frame()?;
        Ok(ScopedFuture::new(Some(Arc::new(frame)), fut))
    }
}

impl Snapshot {
    /// Wrap a future so it runs with this captured chain installed
    ///
    /// The async counterpart of [`Snapshot::run`]: move the snapshot into a
    /// spawned task to propagate the capturing context's bindings there.
    pub fn wrap<F: Future>(&self, fut: F) -> ScopedFuture<F> {
        ScopedFuture::new(self.head(), fut)
    }
}

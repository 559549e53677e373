//! Completion handle of an `ensure` call

use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use toolfetch_core::{Result, ToolError};
use tracing::debug;

/// Outcome of a successful `ensure` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInstance {
    /// Command to run: a bare name resolved on `PATH`, or the cached path
    pub command: String,
    /// `true` only when this call installed the tool
    pub downloaded: bool,
}

impl ToolInstance {
    pub fn existing(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            downloaded: false,
        }
    }

    pub fn downloaded(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            downloaded: true,
        }
    }
}

/// Pending result of an `ensure` call
///
/// Resolves exactly once, either to a [`ToolInstance`] or to a
/// [`ToolError`]. Await it from async code or call [`ToolHandle::wait`].
#[derive(Debug)]
#[must_use = "a ToolHandle does nothing unless waited on or polled"]
pub struct ToolHandle {
    tool: String,
    receiver: oneshot::Receiver<Result<ToolInstance>>,
}

/// Write side of a [`ToolHandle`], consumed by completing it
#[derive(Debug)]
pub struct Completer {
    tool: String,
    sender: oneshot::Sender<Result<ToolInstance>>,
}

impl ToolHandle {
    /// Handle still waiting for its [`Completer`]
    pub fn pending(tool: &str) -> (Completer, ToolHandle) {
        let (sender, receiver) = oneshot::channel();
        let completer = Completer {
            tool: tool.to_string(),
            sender,
        };
        let handle = ToolHandle {
            tool: tool.to_string(),
            receiver,
        };
        (completer, handle)
    }

    /// Handle that is already resolved
    pub fn ready(tool: &str, result: Result<ToolInstance>) -> ToolHandle {
        let (completer, handle) = Self::pending(tool);
        completer.complete(result);
        handle
    }

    /// Blocks the calling thread until the handle resolves
    pub fn wait(self) -> Result<ToolInstance> {
        futures::executor::block_on(self)
    }

    /// Result if already available, without blocking
    ///
    /// Once this returns `Some`, the result has been taken; later calls and
    /// polls report [`ToolError::Interrupted`].
    pub fn try_result(&mut self) -> Option<Result<ToolInstance>> {
        match self.receiver.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(self.interrupted())),
        }
    }

    fn interrupted(&self) -> ToolError {
        ToolError::Interrupted {
            tool: self.tool.clone(),
        }
    }
}

impl Future for ToolHandle {
    type Output = Result<ToolInstance>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(this.interrupted())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Completer {
    pub fn complete(self, result: Result<ToolInstance>) {
        if self.sender.send(result).is_err() {
            debug!(tool = %self.tool, "handle dropped before completion");
        }
    }
}

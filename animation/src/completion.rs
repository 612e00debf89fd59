//! The result handle of a started clock.
//!
//! A [`Completer`] is held by the clock that owns it and resolves exactly once. Callers only get
//! the read side, a [`Completion`] future.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use anyhow::{Result, anyhow};
use tokio::sync::oneshot;

pub(crate) fn completion() -> (Completer, Completion) {
    let (sender, receiver) = oneshot::channel();
    (Completer { sender }, Completion { receiver })
}

#[derive(Debug)]
pub(crate) struct Completer {
    sender: oneshot::Sender<Result<()>>,
}

impl Completer {
    pub fn complete(self) {
        // The receiver might be gone, nobody is interested in the result then.
        let _ = self.sender.send(Ok(()));
    }

    pub fn fail(self, error: anyhow::Error) {
        let _ = self.sender.send(Err(error));
    }
}

/// Resolves when an animation finishes or is stopped, and fails when it could not run.
#[derive(Debug)]
#[must_use = "a completion does nothing unless awaited or polled"]
pub struct Completion {
    receiver: oneshot::Receiver<Result<()>>,
}

impl Completion {
    /// A completion that has already failed.
    pub fn failed(error: anyhow::Error) -> Self {
        let (completer, completion) = completion();
        completer.fail(error);
        completion
    }
}

impl Future for Completion {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err(anyhow!("Animation dropped before it completed")))
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    #[test]
    fn pending_until_completed() {
        let (completer, mut completion) = completion();
        assert!((&mut completion).now_or_never().is_none());
        completer.complete();
        assert!(completion.now_or_never().unwrap().is_ok());
    }

    #[test]
    fn failure_is_delivered() {
        let completion = Completion::failed(anyhow!("no ticker"));
        let error = completion.now_or_never().unwrap().unwrap_err();
        assert_eq!(error.to_string(), "no ticker");
    }

    #[test]
    fn dropped_completer_fails_the_completion() {
        let (completer, completion) = completion();
        drop(completer);
        assert!(completion.now_or_never().unwrap().is_err());
    }
}

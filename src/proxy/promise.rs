use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use super::ProxyError;

enum PromiseState<O> {
    Settled(O),
    Pending(Receiver<O>),
    Disconnected,
}

/// Handle to the eventual outcome of a proxy call.
///
/// Settles exactly once, always with the operation that was passed to the
/// proxy; success or failure is read from the operation itself. There is no
/// cancellation: dropping the promise discards the result while any transport
/// work keeps running.
pub struct ProxyPromise<O> {
    state: PromiseState<O>,
}

impl<O: Send + 'static> ProxyPromise<O> {
    /// A promise that is already settled.
    pub fn resolved(operation: O) -> Self {
        ProxyPromise {
            state: PromiseState::Settled(operation),
        }
    }

    /// Run `work` on a background thread and settle with its result.
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce() -> O + Send + 'static,
    {
        let (tx, rx) = channel();
        thread::spawn(move || {
            let _ = tx.send(work());
        });
        ProxyPromise {
            state: PromiseState::Pending(rx),
        }
    }

    /// Check without blocking whether the promise has settled.
    pub fn is_settled(&mut self) -> bool {
        if let PromiseState::Pending(rx) = &self.state {
            match rx.try_recv() {
                Ok(operation) => self.state = PromiseState::Settled(operation),
                Err(TryRecvError::Disconnected) => self.state = PromiseState::Disconnected,
                Err(TryRecvError::Empty) => return false,
            }
        }
        matches!(self.state, PromiseState::Settled(_))
    }

    /// Block for up to `timeout`; returns whether the promise has settled.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<bool, ProxyError> {
        if let PromiseState::Pending(rx) = &self.state {
            match rx.recv_timeout(timeout) {
                Ok(operation) => self.state = PromiseState::Settled(operation),
                Err(RecvTimeoutError::Disconnected) => self.state = PromiseState::Disconnected,
                Err(RecvTimeoutError::Timeout) => return Ok(false),
            }
        }
        match self.state {
            PromiseState::Disconnected => Err(ProxyError::Disconnected),
            _ => Ok(true),
        }
    }

    /// Block until settled and return the operation.
    pub fn wait(self) -> Result<O, ProxyError> {
        match self.state {
            PromiseState::Settled(operation) => Ok(operation),
            PromiseState::Pending(rx) => rx.recv().map_err(|_| ProxyError::Disconnected),
            PromiseState::Disconnected => Err(ProxyError::Disconnected),
        }
    }

    /// Chain a continuation that runs once the operation settles.
    pub fn then<U, F>(self, f: F) -> ProxyPromise<U>
    where
        U: Send + 'static,
        F: FnOnce(O) -> U + Send + 'static,
    {
        match self.state {
            PromiseState::Settled(operation) => ProxyPromise::resolved(f(operation)),
            PromiseState::Pending(rx) => {
                let (tx, next) = channel();
                thread::spawn(move || {
                    if let Ok(operation) = rx.recv() {
                        let _ = tx.send(f(operation));
                    }
                });
                ProxyPromise {
                    state: PromiseState::Pending(next),
                }
            }
            PromiseState::Disconnected => ProxyPromise {
                state: PromiseState::Disconnected,
            },
        }
    }
}

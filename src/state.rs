//! The synchronization core joining a promise, its future, and at most one
//! continuation.
//!
//! A `Shared<T>` is reference-counted between the write side, the read side,
//! and any closure a combinator parked on it. Its state machine transitions
//! out of `Pending`/`Subscribed` exactly once, ever; the mutex establishes
//! the happens-before edge, so any observer of completion sees the fully
//! written result.

use std::mem;
use std::sync::{Arc, Condvar, Mutex};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use log::trace;

use crate::attempt::Attempt;
use crate::Error;

pub(crate) type Continuation<T> = Box<dyn FnOnce(Attempt<T>) + Send>;

pub(crate) struct Shared<T> {
    inner: Mutex<Inner<T>>,
    ready: Condvar,
}

struct Inner<T> {
    state: State<T>,
    waker: Option<Waker>,
}

enum State<T> {
    /// No result yet, no continuation parked.
    Pending,
    /// A continuation waits for the completing thread to invoke it.
    Subscribed(Continuation<T>),
    /// The result is stored for blocking waiters and repeated `get` calls.
    Completed(Attempt<T>),
    /// The result was handed to a continuation or taken by the async poll.
    Consumed,
}

impl<T> State<T> {
    fn is_completed(&self) -> bool {
        matches!(self, State::Completed(_) | State::Consumed)
    }
}

impl<T> Shared<T> {
    pub fn new() -> Arc<Self> {
        Shared::with_state(State::Pending)
    }

    /// A shared state born completed, with no promise counterpart.
    pub fn completed(result: Attempt<T>) -> Arc<Self> {
        Shared::with_state(State::Completed(result))
    }

    fn with_state(state: State<T>) -> Arc<Self> {
        Arc::new(Shared {
            inner: Mutex::new(Inner { state, waker: None }),
            ready: Condvar::new(),
        })
    }

    /// Stores the result, waking blocked waiters and firing a parked
    /// continuation. The continuation is invoked after the lock is released,
    /// so it can touch this or another shared state without deadlocking.
    ///
    /// # Panics
    ///
    /// Panics on a second completion; the transition happens once, ever.
    pub fn complete(&self, result: Attempt<T>) {
        let mut inner = self.inner.lock().unwrap();
        match mem::replace(&mut inner.state, State::Consumed) {
            State::Pending => {
                trace!("shared state completed, storing result");
                inner.state = State::Completed(result);
                let waker = inner.waker.take();
                drop(inner);
                self.ready.notify_all();
                if let Some(waker) = waker {
                    waker.wake();
                }
            }
            State::Subscribed(continuation) => {
                // The future was consumed when the continuation was parked,
                // so nothing can be blocked or polling on this state.
                trace!("shared state completed, invoking parked continuation");
                drop(inner);
                continuation(result);
            }
            State::Completed(_) | State::Consumed => {
                panic!("shared state completed twice");
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.inner.lock().unwrap().state.is_completed()
    }

    /// Blocks until completion. Loops around the condvar to absorb spurious
    /// wakeups.
    pub fn wait(&self) {
        let mut inner = self.inner.lock().unwrap();
        while !inner.state.is_completed() {
            inner = self.ready.wait(inner).unwrap();
        }
    }

    /// Blocks until completion or until `timeout` elapses. Already-completed
    /// states return `Ok` whatever the timeout, including zero.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<(), Error> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock().unwrap();
        while !inner.state.is_completed() {
            let now = Instant::now();
            if now >= deadline {
                trace!("gave up waiting for completion after {:?}", timeout);
                return Err(Error::Timeout);
            }
            let (guard, _) = self.ready.wait_timeout(inner, deadline - now).unwrap();
            inner = guard;
        }
        Ok(())
    }

    /// Blocks until completion, then clones the value out or re-delivers the
    /// stored error. The result stays in place for repeated calls.
    pub fn get(&self) -> Result<T, Error>
    where
        T: Clone,
    {
        let mut inner = self.inner.lock().unwrap();
        loop {
            match &inner.state {
                State::Completed(result) => return result.get(),
                State::Consumed => return Err(Error::BadFuture),
                _ => {}
            }
            inner = self.ready.wait(inner).unwrap();
        }
    }

    /// Parks the continuation for the completing thread, or invokes it right
    /// away when the result is already in. Either way it runs outside the
    /// lock and exactly once.
    ///
    /// # Panics
    ///
    /// Panics if a consumer already claimed this state; the move-only future
    /// makes that unreachable through the public API.
    pub fn subscribe(&self, continuation: Continuation<T>) {
        let mut inner = self.inner.lock().unwrap();
        match mem::replace(&mut inner.state, State::Consumed) {
            State::Pending => {
                trace!("continuation parked on pending shared state");
                inner.state = State::Subscribed(continuation);
            }
            State::Completed(result) => {
                drop(inner);
                continuation(result);
            }
            State::Subscribed(_) | State::Consumed => {
                panic!("shared state already has a consumer");
            }
        }
    }

    /// Async-side consumption: takes the result once ready, parking the task
    /// waker otherwise. Polling again after `Ready` yields `BadFuture`.
    pub fn poll_take(&self, cx: &mut Context<'_>) -> Poll<Result<T, Error>> {
        let mut inner = self.inner.lock().unwrap();
        match mem::replace(&mut inner.state, State::Consumed) {
            State::Completed(result) => Poll::Ready(result.into_result()),
            State::Consumed => Poll::Ready(Err(Error::BadFuture)),
            pending => {
                inner.state = pending;
                inner.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn wait_sees_completion_from_other_thread() {
        let shared = Shared::new();
        let completer = shared.clone();
        let child = thread::spawn(move || {
            thread::sleep(Duration::from_millis(25));
            completer.complete(Attempt::value(7u32));
        });
        shared.wait();
        assert_eq!(shared.get().unwrap(), 7);
        child.join().unwrap();
    }

    #[test]
    fn wait_timeout_expires_on_pending_state() {
        let shared = Shared::<u32>::new();
        assert!(matches!(
            shared.wait_timeout(Duration::from_millis(10)),
            Err(Error::Timeout)
        ));
    }

    #[test]
    fn subscribe_before_completion_fires_on_completer() {
        let shared = Shared::new();
        let (tx, rx) = mpsc::channel();
        shared.subscribe(Box::new(move |attempt: Attempt<u32>| {
            tx.send(attempt.into_result()).unwrap();
        }));
        shared.complete(Attempt::value(7));
        assert_eq!(rx.try_recv().unwrap().unwrap(), 7);
    }

    #[test]
    fn subscribe_after_completion_fires_inline() {
        let shared = Shared::new();
        shared.complete(Attempt::value(7u32));
        let (tx, rx) = mpsc::channel();
        shared.subscribe(Box::new(move |attempt: Attempt<u32>| {
            tx.send(attempt.into_result()).unwrap();
        }));
        assert_eq!(rx.try_recv().unwrap().unwrap(), 7);
    }

    #[test]
    #[should_panic(expected = "completed twice")]
    fn double_completion_panics() {
        let shared = Shared::new();
        shared.complete(Attempt::value(1u32));
        shared.complete(Attempt::value(2u32));
    }
}

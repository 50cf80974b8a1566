use std::fmt;
use std::sync::Arc;

use crate::attempt::Attempt;
use crate::future::Future;
use crate::state::Shared;
use crate::{BoxError, Error};

/// Write side of a future/promise pair.
///
/// `set_value` and `set_failure` consume the promise, so completing twice is
/// unrepresentable. Completion happens on the calling thread: it unblocks
/// every waiter on the bound [`Future`] and synchronously invokes a parked
/// continuation.
///
/// # Examples
///
/// ```
/// use handoff::Promise;
/// use std::thread;
///
/// let mut promise = Promise::new();
/// let future = promise.get_future();
/// thread::spawn(move || promise.set_value("🍓"));
/// assert_eq!(future.get().unwrap(), "🍓");
/// ```
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
    future_taken: bool,
}

impl<T: Send + 'static> Promise<T> {
    pub fn new() -> Self {
        Promise {
            shared: Shared::new(),
            future_taken: false,
        }
    }

    /// Binds the future that observes this promise.
    ///
    /// # Panics
    ///
    /// Panics on a second call; one promise feeds exactly one future.
    pub fn get_future(&mut self) -> Future<T> {
        assert!(
            !self.future_taken,
            "future already taken from this promise"
        );
        self.future_taken = true;
        Future::from_shared(self.shared.clone())
    }

    /// Completes the shared state with a success value.
    pub fn set_value(self, value: T) {
        self.shared.complete(Attempt::value(value));
    }

    /// Completes the shared state with a failure, re-delivered verbatim to
    /// whoever consumes the future.
    pub fn set_failure(self, error: impl Into<BoxError>) {
        self.shared.complete(Attempt::failure(error));
    }
}

impl<T: Send + 'static> Default for Promise<T> {
    fn default() -> Self {
        Promise::new()
    }
}

impl<T> Drop for Promise<T> {
    /// An abandoned promise still completes, with [`Error::BrokenPromise`],
    /// so waiters and parked continuations are not left hanging.
    fn drop(&mut self) {
        if !self.shared.is_completed() {
            self.shared.complete(Attempt::from_error(Error::BrokenPromise));
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("completed", &self.shared.is_completed())
            .field("future_taken", &self.future_taken)
            .finish()
    }
}

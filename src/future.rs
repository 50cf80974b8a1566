use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use crate::attempt::Attempt;
use crate::state::Shared;
use crate::{BoxError, Error};

/// Read side of a future/promise pair.
///
/// Futures are move-only: [`then`](Future::then), [`next`](Future::next) and
/// [`finally`](Future::finally) consume the handle, and a default-constructed
/// instance is invalid, yielding [`Error::BadFuture`] from every operation.
/// Blocking reads (`get`, `wait`, `wait_timeout`) borrow the handle, so a
/// completed future can be read repeatedly.
///
/// The handle can also be awaited; see the crate docs.
pub struct Future<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T: Send + 'static> Future<T> {
    pub(crate) fn from_shared(shared: Arc<Shared<T>>) -> Self {
        Future {
            shared: Some(shared),
        }
    }

    /// An already-completed future holding `value`, with no promise side.
    pub fn success(value: T) -> Self {
        Future {
            shared: Some(Shared::completed(Attempt::value(value))),
        }
    }

    /// An already-failed future.
    pub fn failure(error: impl Into<BoxError>) -> Self {
        Future {
            shared: Some(Shared::completed(Attempt::failure(error))),
        }
    }

    /// True iff this instance holds a shared state.
    pub fn valid(&self) -> bool {
        self.shared.is_some()
    }

    fn shared(&self) -> Result<&Arc<Shared<T>>, Error> {
        self.shared.as_ref().ok_or(Error::BadFuture)
    }

    /// Non-blocking completion check.
    pub fn is_completed(&self) -> Result<bool, Error> {
        Ok(self.shared()?.is_completed())
    }

    /// Blocks until the promise side completes.
    pub fn wait(&self) -> Result<(), Error> {
        self.shared()?.wait();
        Ok(())
    }

    /// Blocks until completion or until `timeout` elapses, whichever comes
    /// first. An already-completed future returns `Ok` immediately, even for
    /// a zero timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<(), Error> {
        self.shared()?.wait_timeout(timeout)
    }

    /// Blocks until completion, then returns the value or re-delivers the
    /// stored failure. The result stays in the shared state, so `get` can be
    /// called again.
    pub fn get(&self) -> Result<T, Error>
    where
        T: Clone,
    {
        self.shared()?.get()
    }

    /// Maps the eventual value through `func`, yielding a future for the
    /// outcome. Consumes this future.
    ///
    /// A source failure skips `func` and moves downstream untouched; an `Err`
    /// from `func` becomes the chained future's failure. If the source is
    /// already completed, `func` runs on this thread before `then` returns;
    /// otherwise it runs on the completing thread.
    ///
    /// ```
    /// use handoff::Future;
    ///
    /// let length = Future::success(String::from("Hello!")).then(|s| Ok(s.len()));
    /// assert_eq!(length.get().unwrap(), 6);
    /// ```
    pub fn then<U, F>(self, func: F) -> Future<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, BoxError> + Send + 'static,
    {
        let target = Shared::new();
        let chained = Future::from_shared(target.clone());
        match self.shared {
            None => target.complete(Attempt::from_error(Error::BadFuture)),
            Some(source) => source.subscribe(Box::new(move |attempt| {
                let outcome = match attempt.into_result() {
                    Ok(value) => Attempt::from(func(value)),
                    Err(error) => Attempt::from_error(error),
                };
                target.complete(outcome);
            })),
        }
        chained
    }

    /// Monadic bind: like [`then`](Future::then), but `func` returns another
    /// future, whose eventual result is flattened into the returned one.
    /// Consumes this future.
    ///
    /// `Err` from `func` is the synchronous-failure path; a failure inside
    /// the inner future is forwarded once that future completes.
    pub fn next<U, F>(self, func: F) -> Future<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<Future<U>, BoxError> + Send + 'static,
    {
        let target = Shared::new();
        let chained = Future::from_shared(target.clone());
        match self.shared {
            None => target.complete(Attempt::from_error(Error::BadFuture)),
            Some(source) => source.subscribe(Box::new(move |attempt| {
                match attempt.into_result() {
                    Ok(value) => match func(value) {
                        Ok(inner) => match inner.shared {
                            Some(inner_state) => {
                                inner_state.subscribe(Box::new(move |result| {
                                    target.complete(result);
                                }));
                            }
                            None => {
                                target.complete(Attempt::from_error(Error::BadFuture));
                            }
                        },
                        Err(error) => target.complete(Attempt::failure(error)),
                    },
                    Err(error) => target.complete(Attempt::from_error(error)),
                }
            })),
        }
        chained
    }

    /// Terminal sink: delivers the completed [`Attempt`] to `func`, success
    /// and failure alike. Consumes this future; no new future is produced.
    pub fn finally<F>(self, func: F)
    where
        F: FnOnce(Attempt<T>) + Send + 'static,
    {
        match self.shared {
            None => func(Attempt::from_error(Error::BadFuture)),
            Some(source) => source.subscribe(Box::new(func)),
        }
    }
}

impl<T> Default for Future<T> {
    /// An invalid future; every operation on it yields [`Error::BadFuture`].
    fn default() -> Self {
        Future { shared: None }
    }
}

impl<T: Send + 'static> std::future::Future for Future<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &self.get_mut().shared {
            Some(shared) => shared.poll_take(cx),
            None => Poll::Ready(Err(Error::BadFuture)),
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("valid", &self.shared.is_some())
            .finish()
    }
}

//! Thread-crossing future/promise pairs with blocking waits and chained
//! continuations.
//!
//! A [`Promise`] supplies a value or a failure exactly once; the [`Future`]
//! bound to it can block for the result ([`Future::get`], [`Future::wait`],
//! [`Future::wait_timeout`]), poll it ([`Future::is_completed`]), or attach a
//! continuation ([`Future::then`], [`Future::next`], [`Future::finally`])
//! that runs on whichever thread produces the result. Futures are move-only:
//! every combinator consumes its handle, so each shared state has exactly one
//! consumer and continuations fire exactly once.
//!
//! There is no executor underneath. Continuations run inline, either on the
//! thread registering them (when the result is already in) or on the thread
//! completing the promise. The handles can also be awaited: [`Future`]
//! implements [`std::future::Future`].
//!
//! # Examples
//!
//! ```
//! use handoff::promise;
//! use std::thread;
//!
//! let (promise, future) = promise::<usize>();
//! thread::spawn(move || promise.set_value("Hello!".len()));
//! assert_eq!(future.get().unwrap(), 6);
//! ```
//!
//! Chaining transforms, with failures relayed untouched through every stage:
//!
//! ```
//! use handoff::Future;
//!
//! let chained = Future::success(String::from("Hello!"))
//!     .then(|s| Ok(s.len()))
//!     .next(|n| Ok(Future::success(n * 2)));
//! assert_eq!(chained.get().unwrap(), 12);
//! ```

mod attempt;
mod future;
mod promise;
mod state;

pub use attempt::Attempt;
pub use future::Future;
pub use promise::Promise;

use std::sync::Arc;

/// User failures enter the crate as boxed errors and travel through chains as
/// [`Error::Failed`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Operation on a future with no shared state: default-constructed, or
    /// already consumed by a combinator.
    #[error("future has no shared state")]
    BadFuture,
    /// [`Future::wait_timeout`] elapsed before the promise completed.
    #[error("timed out waiting for completion")]
    Timeout,
    /// An [`Attempt`] was read before being populated.
    #[error("attempt holds no result")]
    EmptyAttempt,
    /// The promise was dropped without ever completing.
    #[error("promise dropped before completion")]
    BrokenPromise,
    /// A failure supplied via [`Promise::set_failure`] or returned by a
    /// continuation, relayed verbatim to whoever consumes the future.
    #[error(transparent)]
    Failed(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn failed(error: BoxError) -> Self {
        Error::Failed(Arc::from(error))
    }
}

/// Creates a connected promise/future pair.
pub fn promise<T: Send + 'static>() -> (Promise<T>, Future<T>) {
    let mut promise = Promise::new();
    let future = promise.get_future();
    (promise, future)
}

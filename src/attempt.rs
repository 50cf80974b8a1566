use crate::{BoxError, Error};

/// Tagged result of a completed future: a success value, a failure, or
/// nothing yet.
///
/// An attempt is how [`Future::finally`](crate::Future::finally) hands the
/// outcome to its callback without re-delivering the error itself; the
/// callback branches on the wrapper instead.
#[derive(Debug, Clone)]
pub struct Attempt<T> {
    result: Option<Result<T, Error>>,
}

impl<T> Attempt<T> {
    /// An empty wrapper; reading it yields [`Error::EmptyAttempt`].
    pub fn new() -> Self {
        Attempt { result: None }
    }

    /// A populated success.
    pub fn value(value: T) -> Self {
        Attempt {
            result: Some(Ok(value)),
        }
    }

    /// A populated failure carrying a user error.
    pub fn failure(error: impl Into<BoxError>) -> Self {
        Attempt {
            result: Some(Err(Error::failed(error.into()))),
        }
    }

    pub(crate) fn from_error(error: Error) -> Self {
        Attempt {
            result: Some(Err(error)),
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self.result, Some(Ok(_)))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.result, Some(Err(_)))
    }

    /// Returns the stored value, or re-delivers the stored error.
    pub fn get(&self) -> Result<T, Error>
    where
        T: Clone,
    {
        match &self.result {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(error)) => Err(error.clone()),
            None => Err(Error::EmptyAttempt),
        }
    }

    /// Consuming extraction; no `Clone` bound needed.
    pub fn into_result(self) -> Result<T, Error> {
        self.result.unwrap_or(Err(Error::EmptyAttempt))
    }
}

impl<T> Default for Attempt<T> {
    fn default() -> Self {
        Attempt::new()
    }
}

impl<T> From<Result<T, BoxError>> for Attempt<T> {
    fn from(result: Result<T, BoxError>) -> Self {
        match result {
            Ok(value) => Attempt::value(value),
            Err(error) => Attempt::failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn empty_attempt_yields_error() {
        let attempt = Attempt::<u32>::new();
        assert!(!attempt.is_value());
        assert!(!attempt.is_failure());
        assert!(matches!(attempt.get(), Err(Error::EmptyAttempt)));
    }

    #[test]
    fn value_attempt_round_trips() {
        let attempt = Attempt::value(7u32);
        assert!(attempt.is_value());
        assert_eq!(attempt.get().unwrap(), 7);
        assert_eq!(attempt.into_result().unwrap(), 7);
    }

    #[test]
    fn failure_attempt_redelivers_error() {
        let attempt = Attempt::<u32>::failure(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(attempt.is_failure());
        match attempt.get() {
            Err(Error::Failed(error)) => assert_eq!(error.to_string(), "boom"),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}

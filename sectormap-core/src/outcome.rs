//! Tagged result for stages that can fall back to a safe default.
//!
//! A stage either completes, completes with a substituted default (and keeps
//! the cause so it can be reported), or fails with nothing usable.

/// Result of a stage that may degrade instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T, E> {
    /// The stage produced its full result.
    Complete(T),
    /// The stage hit `cause` and substituted a default in `value`.
    Degraded { value: T, cause: E },
    /// No safe default exists.
    Fatal(E),
}

impl<T, E> Outcome<T, E> {
    pub fn degraded(value: T, cause: E) -> Self {
        Outcome::Degraded { value, cause }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    /// The usable value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Complete(v) | Outcome::Degraded { value: v, .. } => Some(v),
            Outcome::Fatal(_) => None,
        }
    }

    /// The failure cause for degraded and fatal outcomes.
    pub fn cause(&self) -> Option<&E> {
        match self {
            Outcome::Complete(_) => None,
            Outcome::Degraded { cause, .. } | Outcome::Fatal(cause) => Some(cause),
        }
    }

    /// Split into the usable value plus an optional degradation cause, or the
    /// fatal error.
    pub fn into_result(self) -> Result<(T, Option<E>), E> {
        match self {
            Outcome::Complete(v) => Ok((v, None)),
            Outcome::Degraded { value, cause } => Ok((value, Some(cause))),
            Outcome::Fatal(e) => Err(e),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(r: Result<T, E>) -> Self {
        match r {
            Ok(v) => Outcome::Complete(v),
            Err(e) => Outcome::Fatal(e),
        }
    }
}

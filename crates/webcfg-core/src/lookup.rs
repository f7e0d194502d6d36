//! # Present / Absent Lookups
//!
//! Store reads return `Result<Lookup<T>, E>`. The three outcomes are
//! distinct:
//!
//! | Outcome                  | Meaning                                  |
//! |--------------------------|------------------------------------------|
//! | `Ok(Lookup::Present(v))` | value found                              |
//! | `Ok(Lookup::Absent)`     | key or indirection target does not exist |
//! | `Err(e)`                 | the backend failed                       |
//!
//! Callers that aggregate skip `Absent`; callers at a resource boundary
//! turn it into a 404.

/// Outcome of a lookup that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The value exists.
    Present(T),
    /// Nothing is stored under the key, or the chain of references ends
    /// in a missing document.
    Absent,
}

impl<T> Lookup<T> {
    /// Returns `true` for `Present`.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Convert into an `Option`, dropping the distinction from errors.
    pub fn present(self) -> Option<T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Absent => None,
        }
    }

    /// Map the present value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Present(v) => Lookup::Present(f(v)),
            Self::Absent => Lookup::Absent,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Present(v),
            None => Self::Absent,
        }
    }
}

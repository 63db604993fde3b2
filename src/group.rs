//! # Error aggregation.
//!
//! [`ErrorGroup`] collects failures from concurrently running units and reduces them
//! into one result with [`ErrorGroup::error_or_nil`]. The reduced multi-error value is
//! [`Errors`], carried by [`TaskError::Group`].
//!
//! ## Rules
//! - `None` entries are ignored.
//! - Appending a [`TaskError::Group`] appends its members (one level of flattening).
//! - Insertion order is preserved.
//! - `append` may be called from many tasks at once.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::TaskError;

/// Thread-safe collector of task failures.
///
/// # Example
/// ```
/// use taskguard::{ErrorGroup, TaskError};
///
/// let group = ErrorGroup::new();
/// group.append(None::<TaskError>);
/// assert!(group.error_or_nil().is_ok());
///
/// group.append(TaskError::fail("boom"));
/// assert!(group.error_or_nil().is_err());
/// ```
#[derive(Debug, Default)]
pub struct ErrorGroup {
    errs: Mutex<Vec<TaskError>>,
}

impl ErrorGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one error; `None` is a no-op and groups are flattened into their members.
    pub fn append(&self, err: impl Into<Option<TaskError>>) {
        let err: Option<TaskError> = err.into();
        if let Some(err) = err {
            push_flat(&mut self.lock(), err);
        }
    }

    /// Appends several errors in order under a single lock acquisition.
    pub fn append_all<I>(&self, errs: I)
    where
        I: IntoIterator,
        I::Item: Into<Option<TaskError>>,
    {
        let mut guard = self.lock();
        for err in errs {
            let err: Option<TaskError> = err.into();
            if let Some(err) = err {
                push_flat(&mut guard, err);
            }
        }
    }

    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Reduces the group to a single result.
    ///
    /// - no members → `Ok(())`
    /// - one member → that error, unchanged
    /// - several → [`TaskError::Group`] holding all of them in insertion order
    pub fn error_or_nil(&self) -> Result<(), TaskError> {
        let mut errs = self.lock().clone();
        match errs.len() {
            0 => Ok(()),
            1 => Err(errs.remove(0)),
            _ => Err(TaskError::Group(Errors(errs))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TaskError>> {
        // A panicking appender cannot leave the vector half-written.
        self.errs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn push_flat(errs: &mut Vec<TaskError>, err: TaskError) {
    match err {
        TaskError::Group(inner) => errs.extend(inner.0),
        other => errs.push(other),
    }
}

/// Ordered, immutable set of failures produced by [`ErrorGroup::error_or_nil`].
#[derive(Debug, Clone, Default)]
pub struct Errors(Vec<TaskError>);

impl Errors {
    /// Members in insertion order.
    pub fn as_slice(&self) -> &[TaskError] {
        &self.0
    }

    /// Iterates over the members.
    pub fn iter(&self) -> std::slice::Iter<'_, TaskError> {
        self.0.iter()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no members.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the set, returning the members.
    pub fn into_vec(self) -> Vec<TaskError> {
        self.0
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a TaskError;
    type IntoIter = std::slice::Iter<'a, TaskError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Errors {
    type Item = TaskError;
    type IntoIter = std::vec::IntoIter<TaskError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

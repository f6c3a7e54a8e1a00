//! Seal-once slots for mapping metadata

use once_cell::sync::OnceCell;
use std::fmt;

use crate::error::{MappingError, MappingResult};

/// A value that can be assigned exactly once and is read-only afterwards.
///
/// A second assignment is a caller defect and is reported as
/// [`MappingError::AlreadySet`] instead of being ignored.
pub struct WriteOnce<T> {
    cell: OnceCell<T>,
}

impl<T> WriteOnce<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// A slot that is sealed from the start
    pub fn with_value(value: T) -> Self {
        Self {
            cell: OnceCell::with_value(value),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Assign the value; `describe` builds the error message for a repeated assignment
    pub fn set(&self, value: T, describe: impl FnOnce() -> String) -> MappingResult<()> {
        self.cell
            .set(value)
            .map_err(|_| MappingError::already_set(describe()))
    }

    /// Read the value or fail with a not-found error described by `describe`
    pub fn get_or_not_found(&self, describe: impl FnOnce() -> String) -> MappingResult<&T> {
        self.cell
            .get()
            .ok_or_else(|| MappingError::not_found(describe()))
    }
}

impl<T> Default for WriteOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for WriteOnce<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("WriteOnce").field(value).finish(),
            None => f.write_str("WriteOnce(<unset>)"),
        }
    }
}

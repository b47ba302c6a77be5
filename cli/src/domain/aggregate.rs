//! Error aggregation for bulk operations.
//!
//! Bulk actions keep going after a per-item failure and surface a single
//! [`PartialFailureError`] at the end.

use std::fmt::Write as _;

use serde::Serialize;
use thiserror::Error;

/// Text substituted for an empty slot when joining.
pub const NIL_PLACEHOLDER: &str = "<nil>";

/// Separator placed between sub-error messages.
pub const SEPARATOR: &str = ", ";

/// Ordered collection of per-item failures.
#[derive(Debug, Default)]
pub struct ErrorList {
    slots: Vec<Option<anyhow::Error>>,
}

impl ErrorList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: anyhow::Error) {
        self.slots.push(Some(err));
    }

    /// Append a slot that may be empty. Empty slots render as [`NIL_PLACEHOLDER`].
    pub fn push_slot(&mut self, slot: Option<anyhow::Error>) {
        self.slots.push(slot);
    }

    /// Record the error side of `result`, handing back the success value.
    pub fn record<T>(&mut self, result: anyhow::Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `None` when nothing was collected.
    #[must_use]
    pub fn into_error(self) -> Option<PartialFailureError> {
        if self.slots.is_empty() {
            None
        } else {
            Some(PartialFailureError { slots: self.slots })
        }
    }
}

/// Composite of every failure collected during a bulk operation.
#[derive(Debug, Error)]
#[error("{}", join(&self.slots))]
pub struct PartialFailureError {
    slots: Vec<Option<anyhow::Error>>,
}

impl PartialFailureError {
    /// The non-empty sub-errors, in collection order.
    pub fn errors(&self) -> impl Iterator<Item = &anyhow::Error> {
        self.slots.iter().flatten()
    }
}

fn join(slots: &[Option<anyhow::Error>]) -> String {
    let mut out = String::new();
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            out.push_str(SEPARATOR);
        }
        match slot {
            Some(e) => {
                let _ = write!(out, "{e:#}");
            }
            None => out.push_str(NIL_PLACEHOLDER),
        }
    }
    out
}

/// Result of a bulk operation: `(affected, total, error)`.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub affected: usize,
    pub total: usize,
    pub error: Option<PartialFailureError>,
}

impl BulkOutcome {
    #[must_use]
    pub fn summary(&self) -> BulkSummary {
        BulkSummary {
            affected: self.affected,
            total: self.total,
            errors: self
                .error
                .as_ref()
                .map(|e| e.errors().map(|e| format!("{e:#}")).collect())
                .unwrap_or_default(),
        }
    }
}

/// Serializable view of a [`BulkOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub affected: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

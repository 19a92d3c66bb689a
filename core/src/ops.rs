//! The labeled operation set supplied to the monitor.

use tokio::task::JoinHandle;

/// One monitored operation: an opaque task handle plus its display label.
#[derive(Debug)]
pub(crate) struct LabeledOp {
    pub(crate) label: String,
    pub(crate) handle: JoinHandle<()>,
    pub(crate) done: bool,
}

/// Read-only mapping of running operations to display labels, supplied once
/// at monitor start.
///
/// Labels need not be unique; duplicates simply produce duplicate report
/// lines. The set never grows after the monitor starts, and entries are only
/// ever marked complete; the monitor neither cancels nor restarts them. Result
/// values are irrelevant here, which is why handles carry `()`; deliver
/// results through a channel the producer keeps for itself.
#[derive(Debug, Default)]
pub struct LabeledOps {
    entries: Vec<LabeledOp>,
}

impl LabeledOps {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `label`.
    pub fn insert(&mut self, label: impl Into<String>, handle: JoinHandle<()>) {
        self.entries.push(LabeledOp {
            label: label.into(),
            handle,
            done: false,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<LabeledOp> {
        self.entries
    }
}

impl<L: Into<String>> FromIterator<(L, JoinHandle<()>)> for LabeledOps {
    fn from_iter<I: IntoIterator<Item = (L, JoinHandle<()>)>>(iter: I) -> Self {
        let mut ops = Self::new();
        for (label, handle) in iter {
            ops.insert(label, handle);
        }
        ops
    }
}

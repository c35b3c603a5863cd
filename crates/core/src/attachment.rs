//! File attachments of payments and expenses.
//!
//! Only file ids are tracked here; file storage lives elsewhere.

use moneta_shared::types::FileId;
use serde::{Deserialize, Serialize};

use crate::ledger::{LedgerError, LedgerResult};

/// Ordered set of attached file ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentSet(Vec<FileId>);

impl AttachmentSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds a set from ids, rejecting duplicates.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAttachment` with the first repeated id.
    pub fn from_ids(ids: impl IntoIterator<Item = FileId>) -> LedgerResult<Self> {
        let mut set = Self::new();
        for id in ids {
            set.attach(id)?;
        }
        Ok(set)
    }

    /// Adds a file id.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAttachment` if the id is already present.
    pub fn attach(&mut self, file_id: FileId) -> LedgerResult<()> {
        if self.contains(file_id) {
            return Err(LedgerError::DuplicateAttachment(file_id));
        }
        self.0.push(file_id);
        Ok(())
    }

    /// Removes a file id.
    ///
    /// # Errors
    ///
    /// Returns `AttachmentNotFound` if the id is absent.
    pub fn detach(&mut self, file_id: FileId) -> LedgerResult<()> {
        let position = self
            .0
            .iter()
            .position(|id| *id == file_id)
            .ok_or(LedgerError::AttachmentNotFound(file_id))?;
        self.0.remove(position);
        Ok(())
    }

    /// Returns true if the id is attached.
    #[must_use]
    pub fn contains(&self, file_id: FileId) -> bool {
        self.0.contains(&file_id)
    }

    /// Number of attachments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the ids in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = FileId> + '_ {
        self.0.iter().copied()
    }
}

impl IntoIterator for AttachmentSet {
    type Item = FileId;
    type IntoIter = std::vec::IntoIter<FileId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

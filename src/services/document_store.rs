use std::collections::VecDeque;
use chrono::{DateTime, Utc};
use tracing::debug;
use crate::models::Operation;
use crate::services::transform::transform_position;

/// What an accepted operation did to the content, in resolved coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedOp {
    Insert { position: usize, length: usize },
    Delete { position: usize, length: usize },
    Replace,
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Version this operation produced
    pub version: u64,
    pub op: AppliedOp,
    pub issuer: String,
    pub applied_at: DateTime<Utc>,
}

/// The single shared document: content, version counter and bounded history.
///
/// All positions and lengths are in characters. Every accepted content
/// operation bumps the version exactly once, even when it turns out to have no
/// visible effect, so clients observe one total order of operations.
#[derive(Debug)]
pub struct DocumentStore {
    content: String,
    char_len: usize,
    version: u64,
    history: VecDeque<HistoryEntry>,
    max_content_size: usize,
    history_cap: usize,
}

impl DocumentStore {
    pub fn new(content: impl Into<String>, max_content_size: usize, history_cap: usize) -> Self {
        let mut content = content.into();
        let mut char_len = content.chars().count();
        if char_len > max_content_size {
            content = content.chars().take(max_content_size).collect();
            char_len = max_content_size;
        }
        Self {
            content,
            char_len,
            version: 0,
            history: VecDeque::with_capacity(history_cap.min(1024)),
            max_content_size,
            history_cap,
        }
    }

    /// Read-only snapshot of the content and the version it corresponds to.
    pub fn current_content(&self) -> (&str, u64) {
        (&self.content, self.version)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Content length in characters
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    pub fn clamp_position(&self, position: usize) -> usize {
        position.min(self.char_len)
    }

    pub fn transform_position(&self, position: usize, client_version: u64) -> usize {
        transform_position(&self.history, position, client_version, self.version, self.char_len)
    }

    /// Apply a content operation. Cursor moves are not document operations and
    /// yield `None`.
    pub fn apply(&mut self, op: &Operation, issuer: &str) -> Option<u64> {
        match op {
            Operation::Insert { position, content, client_version } => {
                Some(self.apply_insert(*position, content, *client_version, issuer))
            }
            Operation::Delete { position, length, client_version } => {
                Some(self.apply_delete(*position, *length, *client_version, issuer))
            }
            Operation::Replace { content } => Some(self.apply_replace(content, issuer)),
            Operation::Cursor { .. } => None,
        }
    }

    /// Insert `text` at `position` as seen at `client_version`. Text that is
    /// empty or would overflow the size limit degrades to an empty insert.
    pub fn apply_insert(&mut self, position: usize, text: &str, client_version: u64, issuer: &str) -> u64 {
        let resolved = self.clamp_position(self.transform_position(position, client_version));
        let text_len = text.chars().count();

        let length = if text_len == 0 || self.char_len + text_len > self.max_content_size {
            debug!("Insert by {} dropped ({} chars would exceed the limit or is empty)", issuer, text_len);
            0
        } else {
            let at = self.byte_offset(resolved);
            self.content.insert_str(at, text);
            self.char_len += text_len;
            text_len
        };

        self.record(AppliedOp::Insert { position: resolved, length }, issuer)
    }

    /// Delete up to `length` characters at `position` as seen at `client_version`.
    /// Out of range deletes are recorded as empty deletes.
    pub fn apply_delete(&mut self, position: usize, length: usize, client_version: u64, issuer: &str) -> u64 {
        let resolved = self.clamp_position(self.transform_position(position, client_version));
        let length = length.min(self.char_len - resolved);

        if length > 0 {
            let start = self.byte_offset(resolved);
            let end = self.byte_offset(resolved + length);
            self.content.replace_range(start..end, "");
            self.char_len -= length;
        }

        self.record(AppliedOp::Delete { position: resolved, length }, issuer)
    }

    /// Overwrite the whole content. Oversized text leaves the content as is.
    pub fn apply_replace(&mut self, text: &str, issuer: &str) -> u64 {
        let text_len = text.chars().count();
        if text_len <= self.max_content_size {
            self.content = text.to_string();
            self.char_len = text_len;
        } else {
            debug!("Replace by {} dropped ({} chars exceeds the limit)", issuer, text_len);
        }
        self.record(AppliedOp::Replace, issuer)
    }

    fn record(&mut self, op: AppliedOp, issuer: &str) -> u64 {
        self.version += 1;
        self.history.push_back(HistoryEntry {
            version: self.version,
            op,
            issuer: issuer.to_string(),
            applied_at: Utc::now(),
        });
        while self.history.len() > self.history_cap {
            self.history.pop_front();
        }
        self.version
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(offset, _)| offset)
    }
}

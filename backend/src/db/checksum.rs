//! Checksums for schedule snapshots.

use sha2::{Digest, Sha256};

use crate::models::{ScheduleGrid, SlotEntry, SlotPosition};

/// Calculate SHA-256 checksum of arbitrary content.
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// SHA-256 of a grid's canonical text form.
///
/// Two grids have the same checksum iff every cell holds the same entries in
/// the same order.
pub fn grid_checksum(grid: &ScheduleGrid) -> String {
    let mut hasher = Sha256::new();
    for pos in SlotPosition::all() {
        hasher.update(format!("[{}]", pos.key()).as_bytes());
        for entry in grid.cell(pos) {
            let line = match entry {
                SlotEntry::Class(c) => format!("class:{}:{}:{};", c.subject, c.teacher, c.classroom),
                SlotEntry::Event { label } => format!("event:{}:{};", label.len(), label),
            };
            hasher.update(line.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

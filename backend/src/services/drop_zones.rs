//! Drop-zone evaluation for an in-progress drag.
//!
//! For a dragged cell, every one of the 40 grid positions gets a verdict
//! telling the editor whether the content may be dropped there. The source
//! cell and the lunch slot are never valid targets. Other cells run the full
//! conflict check for every class occupancy in the dragged content.
//!
//! Collaborator data is loaded once per evaluation and the per-cell checks are
//! pure, so evaluating the same drag twice gives the same map.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use super::conflicts::{ConflictKind, ConflictValidator, EditTarget, ProposalContext};
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::models::{class_entries, ScheduleGrid, SlotEntry, SlotPosition};

/// Why a cell rejects the drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneReason {
    SameSlot,
    LunchBreak,
    TeacherClash,
    RoomClash,
    TeacherCooldownWarning,
    InvalidTeacher,
}

impl From<ConflictKind> for ZoneReason {
    fn from(kind: ConflictKind) -> Self {
        match kind {
            ConflictKind::LunchBreak => ZoneReason::LunchBreak,
            ConflictKind::TeacherClash => ZoneReason::TeacherClash,
            ConflictKind::RoomClash => ZoneReason::RoomClash,
            ConflictKind::TeacherCooldownWarning => ZoneReason::TeacherCooldownWarning,
            ConflictKind::InvalidTeacher => ZoneReason::InvalidTeacher,
        }
    }
}

/// Verdict for a single target cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ZoneReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ZoneResult {
    pub fn open() -> Self {
        Self {
            valid: true,
            reason: None,
            message: None,
        }
    }

    pub fn closed(reason: ZoneReason, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            message: Some(message.into()),
        }
    }
}

/// Verdicts for all 40 cells.
///
/// Serializes as a JSON object keyed by `"day-slot"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropZoneMap {
    zones: BTreeMap<SlotPosition, ZoneResult>,
}

impl DropZoneMap {
    pub fn get(&self, pos: SlotPosition) -> Option<&ZoneResult> {
        self.zones.get(&pos)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotPosition, &ZoneResult)> {
        self.zones.iter()
    }

    /// Positions that accept the drop, day-major.
    pub fn valid_positions(&self) -> Vec<SlotPosition> {
        self.zones
            .iter()
            .filter(|(_, z)| z.valid)
            .map(|(p, _)| *p)
            .collect()
    }

    pub fn to_keyed(&self) -> BTreeMap<String, ZoneResult> {
        self.zones
            .iter()
            .map(|(pos, zone)| (pos.key(), zone.clone()))
            .collect()
    }
}

impl Serialize for DropZoneMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.zones.len()))?;
        for (pos, zone) in &self.zones {
            map.serialize_entry(&pos.key(), zone)?;
        }
        map.end()
    }
}

/// Compute the zone map from already loaded proposal contexts, one per class
/// occupancy of the dragged content.
///
/// With no contexts (a free cell or events only) every cell other than the
/// source and the lunch slot is open. Otherwise a cell closes on the first
/// blocking conflict of any context. `grid` should be the edited schedule
/// with the source cell already lifted out.
pub fn zones_from_contexts(
    contexts: &[ProposalContext],
    grid: &ScheduleGrid,
    source: SlotPosition,
) -> DropZoneMap {
    let zones = SlotPosition::all()
        .map(|pos| {
            let zone = if pos == source {
                ZoneResult::closed(ZoneReason::SameSlot, "Content is already in this slot")
            } else if pos.is_lunch() {
                ZoneResult::closed(ZoneReason::LunchBreak, "Lunch break slot")
            } else {
                contexts
                    .iter()
                    .find_map(|ctx| ctx.check(grid, pos).first_blocking().cloned())
                    .map_or_else(ZoneResult::open, |conflict| {
                        ZoneResult::closed(conflict.kind.into(), conflict.message)
                    })
            };
            (pos, zone)
        })
        .collect();
    DropZoneMap { zones }
}

/// Evaluate every cell of `target` as a drop destination for `content`
/// dragged from `source`.
pub async fn evaluate_zones<R: FullRepository + ?Sized>(
    repo: &R,
    target: EditTarget<'_>,
    source: SlotPosition,
    content: &[SlotEntry],
) -> RepositoryResult<DropZoneMap> {
    let mut lifted = target.grid.clone();
    lifted.take_cell(source);

    let validator = ConflictValidator::new(repo);
    let mut contexts = Vec::new();
    for occupancy in class_entries(content) {
        contexts.push(validator.load_context(target, occupancy).await?);
    }

    let map = zones_from_contexts(&contexts, &lifted, source);
    debug!(
        timetable_id = %target.timetable_id,
        source = %source.key(),
        open = map.valid_positions().len(),
        "Evaluated drop zones"
    );
    Ok(map)
}

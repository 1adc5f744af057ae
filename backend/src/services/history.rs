//! Version history: commit and revert.
//!
//! Each committed change appends one [`VersionSnapshot`] holding a full copy
//! of the schedule as it was *before* the change, then bumps
//! `current_version` by one. A revert is itself a committed change whose new
//! schedule is a copy of an older snapshot, so history only ever moves
//! forward and `edit_history.len() == current_version - 1` always holds.
//!
//! The pure functions [`apply_commit`] and [`apply_revert`] do the
//! bookkeeping on an in-memory [`Timetable`]; [`commit`] and [`revert`] wrap
//! them in a compare-and-swap against the repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{ServiceError, ServiceResult};
use crate::db::checksum::grid_checksum;
use crate::db::repository::FullRepository;
use crate::models::{ScheduleGrid, Timetable, TimetableId, UserId, VersionSnapshot};

/// Default description for commits that don't provide one.
pub const DEFAULT_EDIT_DESCRIPTION: &str = "Manual edit";

/// `GET /timetables/{id}/history` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub current_version: u32,
    pub history: Vec<VersionSnapshot>,
}

impl From<&Timetable> for HistoryView {
    fn from(timetable: &Timetable) -> Self {
        Self {
            current_version: timetable.current_version,
            history: timetable.edit_history.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Version {version} not found in history of timetable {timetable}")]
pub struct VersionNotFound {
    pub timetable: TimetableId,
    pub version: u32,
}

impl From<VersionNotFound> for ServiceError {
    fn from(err: VersionNotFound) -> Self {
        ServiceError::NotFound(err.to_string())
    }
}

/// Snapshot the current schedule, install `schedule` and bump the version.
pub fn apply_commit(
    timetable: &mut Timetable,
    schedule: ScheduleGrid,
    editor: Option<UserId>,
    description: impl Into<String>,
    now: DateTime<Utc>,
) {
    let previous = std::mem::replace(&mut timetable.schedule, schedule);
    timetable.edit_history.push(VersionSnapshot {
        version_number: timetable.current_version,
        timestamp: now,
        edited_by: editor,
        change_description: description.into(),
        checksum: grid_checksum(&previous),
        schedule_snapshot: previous,
    });
    timetable.current_version += 1;
    timetable.is_edited = true;
    timetable.last_edited_at = Some(now);
    timetable.last_edited_by = editor;
    timetable.updated_at = now;
}

/// Restore the schedule recorded for `version` as a new committed change.
pub fn apply_revert(
    timetable: &mut Timetable,
    version: u32,
    editor: Option<UserId>,
    now: DateTime<Utc>,
) -> Result<(), VersionNotFound> {
    let restored = timetable
        .snapshot(version)
        .map(|s| s.schedule_snapshot.clone())
        .ok_or(VersionNotFound {
            timetable: timetable.id,
            version,
        })?;
    apply_commit(
        timetable,
        restored,
        editor,
        format!("Reverted to version {}", version),
        now,
    );
    Ok(())
}

/// Commit `schedule` as the next version of timetable `id`.
///
/// `base_version` is the version the edit was based on. When given, the
/// commit fails with [`ServiceError::VersionConflict`] if anything else was
/// committed since; when `None` the latest stored version is used as base.
pub async fn commit<R: FullRepository + ?Sized>(
    repo: &R,
    id: TimetableId,
    base_version: Option<u32>,
    schedule: ScheduleGrid,
    editor: Option<UserId>,
    description: Option<String>,
) -> ServiceResult<Timetable> {
    let mut timetable = repo.get_timetable(id).await?;
    let expected = base_version.unwrap_or(timetable.current_version);
    if expected != timetable.current_version {
        return Err(ServiceError::VersionConflict {
            expected,
            actual: timetable.current_version,
        });
    }

    let description = description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDIT_DESCRIPTION.to_string());
    apply_commit(&mut timetable, schedule, editor, description, Utc::now());

    let stored = repo.replace_timetable(timetable, expected).await?;
    info!(
        timetable_id = %id,
        version = stored.current_version,
        "Committed timetable edit"
    );
    Ok(stored)
}

/// Revert timetable `id` to the schedule recorded for `version`.
pub async fn revert<R: FullRepository + ?Sized>(
    repo: &R,
    id: TimetableId,
    version: u32,
    editor: Option<UserId>,
) -> ServiceResult<Timetable> {
    let mut timetable = repo.get_timetable(id).await?;
    let expected = timetable.current_version;
    apply_revert(&mut timetable, version, editor, Utc::now())?;

    let stored = repo.replace_timetable(timetable, expected).await?;
    info!(
        timetable_id = %id,
        reverted_to = version,
        version = stored.current_version,
        "Reverted timetable"
    );
    Ok(stored)
}

pub async fn get_history<R: FullRepository + ?Sized>(
    repo: &R,
    id: TimetableId,
) -> ServiceResult<HistoryView> {
    let timetable = repo.get_timetable(id).await?;
    Ok(HistoryView::from(&timetable))
}

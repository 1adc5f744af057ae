//! Timetable aggregate: the weekly grid plus its status and version history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::grid::ScheduleGrid;
use super::{ClassId, TimetableId, UserId};

/// Publication state of a timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimetableStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl TimetableStatus {
    /// Draft and published timetables take part in clash detection.
    pub fn is_active(&self) -> bool {
        matches!(self, TimetableStatus::Draft | TimetableStatus::Published)
    }

    /// Move to `published`. Archived timetables stay archived.
    pub fn publish(self) -> Result<Self, StatusTransitionError> {
        match self {
            TimetableStatus::Draft | TimetableStatus::Published => Ok(TimetableStatus::Published),
            TimetableStatus::Archived => Err(StatusTransitionError {
                from: self,
                to: TimetableStatus::Published,
            }),
        }
    }

    /// Move to `archived`. Always allowed; archiving twice is a no-op.
    pub fn archive(self) -> Result<Self, StatusTransitionError> {
        Ok(TimetableStatus::Archived)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimetableStatus::Draft => "draft",
            TimetableStatus::Published => "published",
            TimetableStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for TimetableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot change timetable status from {from} to {to}")]
pub struct StatusTransitionError {
    pub from: TimetableStatus,
    pub to: TimetableStatus,
}

/// Immutable copy of a schedule as it was before a committed change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    /// Version that was current when the snapshot was taken.
    pub version_number: u32,
    pub timestamp: DateTime<Utc>,
    pub edited_by: Option<UserId>,
    pub change_description: String,
    /// SHA-256 of the serialized grid.
    pub checksum: String,
    pub schedule_snapshot: ScheduleGrid,
}

/// A generated weekly timetable for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub id: TimetableId,
    pub class: ClassId,
    pub academic_year: String,
    pub semester: u32,
    pub schedule: ScheduleGrid,
    pub status: TimetableStatus,
    pub generated_at: DateTime<Utc>,
    pub generated_by: Option<UserId>,
    pub current_version: u32,
    pub edit_history: Vec<VersionSnapshot>,
    pub is_edited: bool,
    pub last_edited_at: Option<DateTime<Utc>>,
    pub last_edited_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
}

impl Timetable {
    /// Look up a snapshot by the version it recorded.
    pub fn snapshot(&self, version_number: u32) -> Option<&VersionSnapshot> {
        self.edit_history
            .iter()
            .find(|s| s.version_number == version_number)
    }

    pub fn summary(&self) -> TimetableSummary {
        TimetableSummary {
            id: self.id,
            class: self.class,
            academic_year: self.academic_year.clone(),
            semester: self.semester,
            status: self.status,
            current_version: self.current_version,
            is_edited: self.is_edited,
            generated_at: self.generated_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for creating a timetable from generator output.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTimetable {
    pub class: ClassId,
    pub academic_year: String,
    pub semester: u32,
    pub schedule: ScheduleGrid,
    pub generated_by: Option<UserId>,
}

impl NewTimetable {
    /// Materialize as a fresh draft at version 1 with an empty history.
    pub fn into_timetable(self, id: TimetableId, now: DateTime<Utc>) -> Timetable {
        Timetable {
            id,
            class: self.class,
            academic_year: self.academic_year,
            semester: self.semester,
            schedule: self.schedule,
            status: TimetableStatus::Draft,
            generated_at: now,
            generated_by: self.generated_by,
            current_version: 1,
            edit_history: Vec::new(),
            is_edited: false,
            last_edited_at: None,
            last_edited_by: None,
            updated_at: now,
        }
    }
}

/// Lightweight listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSummary {
    pub id: TimetableId,
    pub class: ClassId,
    pub academic_year: String,
    pub semester: u32,
    pub status: TimetableStatus,
    pub current_version: u32,
    pub is_edited: bool,
    pub generated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert_eq!(TimetableStatus::Draft.publish(), Ok(TimetableStatus::Published));
        assert_eq!(TimetableStatus::Published.publish(), Ok(TimetableStatus::Published));
        assert!(TimetableStatus::Archived.publish().is_err());
        assert_eq!(TimetableStatus::Published.archive(), Ok(TimetableStatus::Archived));
        assert!(TimetableStatus::Published.is_active());
        assert!(!TimetableStatus::Archived.is_active());
    }

    #[test]
    fn test_new_timetable_starts_at_version_one() {
        let now = Utc::now();
        let timetable = NewTimetable {
            class: ClassId(3),
            academic_year: "2026".to_string(),
            semester: 1,
            schedule: ScheduleGrid::empty(),
            generated_by: None,
        }
        .into_timetable(TimetableId(9), now);

        assert_eq!(timetable.current_version, 1);
        assert!(timetable.edit_history.is_empty());
        assert_eq!(timetable.status, TimetableStatus::Draft);
        assert!(!timetable.is_edited);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TimetableStatus::Published).unwrap(),
            "\"published\""
        );
    }
}

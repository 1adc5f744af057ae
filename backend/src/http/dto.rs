//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies use camelCase field names. Response bodies are mostly the
//! service types themselves, which already derive `Serialize`.

use serde::{Deserialize, Serialize};

use crate::models::{
    Cell, ClassOccupancy, ScheduleGrid, SlotEntry, SlotPosition, TimetableSummary, UserId,
    GridError,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableListResponse {
    pub timetables: Vec<TimetableSummary>,
    pub total: usize,
}

/// A proposed entry: either a tagged [`SlotEntry`] or a bare
/// `{subject, teacher, classroom}` occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProposedEntry {
    Tagged(SlotEntry),
    Occupancy(ClassOccupancy),
}

impl From<ProposedEntry> for SlotEntry {
    fn from(entry: ProposedEntry) -> Self {
        match entry {
            ProposedEntry::Tagged(entry) => entry,
            ProposedEntry::Occupancy(occupancy) => SlotEntry::Class(occupancy),
        }
    }
}

/// `POST /timetables/{id}/validate-slot`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSlotRequest {
    pub day: usize,
    pub slot: usize,
    /// `null` or absent proposes a free cell.
    #[serde(default)]
    pub proposed_data: Option<ProposedEntry>,
}

impl ValidateSlotRequest {
    pub fn position(&self) -> Result<SlotPosition, GridError> {
        SlotPosition::new(self.day, self.slot)
    }
}

/// `PUT /timetables/{id}/edit`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTimetableRequest {
    pub schedule: ScheduleGrid,
    /// Description of the change.
    #[serde(default)]
    pub changes: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// `POST /timetables/{id}/revert/{version}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// `POST /timetables/generate/{classId}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// `PUT /sessions/{id}/slots`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSlotRequest {
    pub day: usize,
    pub slot: usize,
    /// New cell content; empty clears the cell.
    #[serde(default)]
    pub content: Vec<ProposedEntry>,
    #[serde(default)]
    pub confirm_warnings: bool,
}

impl SetSlotRequest {
    pub fn position(&self) -> Result<SlotPosition, GridError> {
        SlotPosition::new(self.day, self.slot)
    }

    pub fn cell(self) -> Cell {
        self.content.into_iter().map(SlotEntry::from).collect()
    }
}

/// `POST /sessions/{id}/move`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub source_day: usize,
    pub source_slot: usize,
    pub target_day: usize,
    pub target_slot: usize,
    #[serde(default)]
    pub confirm_warnings: bool,
}

impl MoveRequest {
    pub fn positions(&self) -> Result<(SlotPosition, SlotPosition), GridError> {
        Ok((
            SlotPosition::new(self.source_day, self.source_slot)?,
            SlotPosition::new(self.target_day, self.target_slot)?,
        ))
    }
}

/// `POST /sessions/{id}/drop-zones`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropZonesRequest {
    pub source_day: usize,
    pub source_slot: usize,
    /// Dragged content; defaults to the staged content of the source cell.
    #[serde(default)]
    pub content: Option<Vec<ProposedEntry>>,
}

impl DropZonesRequest {
    pub fn source(&self) -> Result<SlotPosition, GridError> {
        SlotPosition::new(self.source_day, self.source_slot)
    }
}

/// `POST /sessions/{id}/commit`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub description: Option<String>,
}

//! Domain services: validation, drop zones, history, edit sessions,
//! generation and read views.
//!
//! Services are generic over [`FullRepository`](crate::db::FullRepository) and
//! return [`ServiceError`]; the HTTP layer maps those to status codes.

pub mod conflicts;
pub mod drop_zones;
pub mod editor;
pub mod error;
pub mod generation;
pub mod history;
pub mod lifecycle;
pub mod views;

pub use conflicts::{
    Conflict, ConflictKind, ConflictValidator, ConflictingClass, EditTarget, Severity,
    ValidationOutcome,
};
pub use drop_zones::{evaluate_zones, DropZoneMap, ZoneReason, ZoneResult};
pub use editor::{
    edit_timetable, validate_slot, EditController, EditOutcome, EditResponse, EditStatus,
    SessionStore, SessionView, DEFAULT_SESSION_IDLE_MINS,
};
pub use error::{ServiceError, ServiceResult};
pub use generation::{
    generate_timetable, GeneratedTimetable, GenerationError, ScheduleGenerator, SolverRequest,
    SolverResponse,
};
#[cfg(feature = "http-server")]
pub use generation::HttpScheduleGenerator;
pub use history::{HistoryView, VersionNotFound};

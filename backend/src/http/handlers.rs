//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use super::dto::{
    CommitRequest, DropZonesRequest, EditTimetableRequest, GenerateRequest, HealthResponse,
    MoveRequest, RevertRequest, SetSlotRequest, TimetableListResponse, ValidateSlotRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::{ClassId, SlotEntry, TeacherId, Timetable, TimetableId};
use crate::services::{
    self, history, lifecycle, views, DropZoneMap, EditController, EditResponse,
    GeneratedTimetable, HistoryView, SessionView, ValidationOutcome,
};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn controller(state: &AppState) -> EditController<'_, dyn crate::db::FullRepository> {
    EditController::new(state.repository.as_ref(), &state.sessions)
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and storage is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Timetable queries
// =============================================================================

/// GET /timetables
pub async fn list_timetables(
    State(state): State<AppState>,
) -> HandlerResult<TimetableListResponse> {
    let timetables = db_services::list_timetables(state.repository.as_ref()).await?;
    let total = timetables.len();
    Ok(Json(TimetableListResponse { timetables, total }))
}

/// GET /timetables/{id}
pub async fn get_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Timetable> {
    let timetable = db_services::get_timetable(state.repository.as_ref(), TimetableId(id)).await?;
    Ok(Json(timetable))
}

/// GET /timetables/class/{class_id}
pub async fn get_class_timetables(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> HandlerResult<views::ClassTimetables> {
    let view = views::class_timetables(state.repository.as_ref(), ClassId(class_id)).await?;
    Ok(Json(view))
}

/// GET /timetables/teacher/{teacher_id}
///
/// Only published timetables are included.
pub async fn get_teacher_timetables(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> HandlerResult<views::TeacherTimetables> {
    let view = views::teacher_timetables(state.repository.as_ref(), TeacherId(teacher_id)).await?;
    Ok(Json(view))
}

/// GET /timetables/{id}/options
pub async fn get_editor_options(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<views::EditorOptions> {
    let options = views::editor_options(state.repository.as_ref(), TimetableId(id)).await?;
    Ok(Json(options))
}

// =============================================================================
// Generation
// =============================================================================

/// POST /timetables/generate/{class_id}
pub async fn generate_timetable(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GeneratedTimetable>), AppError> {
    let generated = services::generate_timetable(
        state.repository.as_ref(),
        state.generator.as_ref(),
        ClassId(class_id),
        request.academic_year,
        request.user_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(generated)))
}

// =============================================================================
// Validation, edit and history
// =============================================================================

/// POST /timetables/{id}/validate-slot
pub async fn validate_slot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ValidateSlotRequest>,
) -> HandlerResult<ValidationOutcome> {
    let pos = request.position()?;
    let proposed = request.proposed_data.map(SlotEntry::from);
    let outcome = services::validate_slot(
        state.repository.as_ref(),
        TimetableId(id),
        pos,
        proposed.as_ref(),
    )
    .await?;
    Ok(Json(outcome))
}

/// PUT /timetables/{id}/edit
///
/// Replaces the whole schedule as one committed version.
pub async fn edit_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<EditTimetableRequest>,
) -> HandlerResult<Timetable> {
    let timetable = services::edit_timetable(
        state.repository.as_ref(),
        TimetableId(id),
        request.schedule,
        request.user_id,
        request.changes,
    )
    .await?;
    Ok(Json(timetable))
}

/// GET /timetables/{id}/history
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<HistoryView> {
    let view = history::get_history(state.repository.as_ref(), TimetableId(id)).await?;
    Ok(Json(view))
}

/// POST /timetables/{id}/revert/{version}
pub async fn revert_timetable(
    State(state): State<AppState>,
    Path((id, version)): Path<(i64, u32)>,
    Json(request): Json<RevertRequest>,
) -> HandlerResult<Timetable> {
    let timetable = history::revert(
        state.repository.as_ref(),
        TimetableId(id),
        version,
        request.user_id,
    )
    .await?;
    Ok(Json(timetable))
}

// =============================================================================
// Lifecycle
// =============================================================================

/// PUT /timetables/{id}/publish
pub async fn publish_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Timetable> {
    let timetable = lifecycle::publish(state.repository.as_ref(), TimetableId(id)).await?;
    Ok(Json(timetable))
}

/// PUT /timetables/{id}/archive
pub async fn archive_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Timetable> {
    let timetable = lifecycle::archive(state.repository.as_ref(), TimetableId(id)).await?;
    Ok(Json(timetable))
}

/// DELETE /timetables/{id}
pub async fn delete_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    lifecycle::delete(state.repository.as_ref(), TimetableId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Edit sessions
// =============================================================================

/// POST /timetables/{id}/sessions
pub async fn open_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let view = controller(&state).open(TimetableId(id)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> HandlerResult<SessionView> {
    Ok(Json(controller(&state).get(session_id).await?))
}

/// PUT /sessions/{session_id}/slots
pub async fn set_slot(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SetSlotRequest>,
) -> HandlerResult<EditResponse> {
    let pos = request.position()?;
    let confirm = request.confirm_warnings;
    let response = controller(&state)
        .set_slot(session_id, pos, request.cell(), confirm)
        .await?;
    Ok(Json(response))
}

/// POST /sessions/{session_id}/move
pub async fn move_slot(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<MoveRequest>,
) -> HandlerResult<EditResponse> {
    let (source, target) = request.positions()?;
    let response = controller(&state)
        .move_or_swap(session_id, source, target, request.confirm_warnings)
        .await?;
    Ok(Json(response))
}

/// POST /sessions/{session_id}/drop-zones
pub async fn drop_zones(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<DropZonesRequest>,
) -> HandlerResult<DropZoneMap> {
    let source = request.source()?;
    let content = request
        .content
        .map(|entries| entries.into_iter().map(SlotEntry::from).collect());
    let map = controller(&state)
        .drop_zones(session_id, source, content)
        .await?;
    Ok(Json(map))
}

/// POST /sessions/{session_id}/commit
pub async fn commit_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CommitRequest>,
) -> HandlerResult<Timetable> {
    let timetable = controller(&state)
        .commit(session_id, request.user_id, request.description)
        .await?;
    Ok(Json(timetable))
}

/// DELETE /sessions/{session_id}
pub async fn discard_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    controller(&state).discard(session_id)?;
    info!(session_id = %session_id, "Edit session discarded by client");
    Ok(StatusCode::NO_CONTENT)
}

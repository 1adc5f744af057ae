//! Edit sessions: staged, validated changes to one timetable.
//!
//! A session holds a private copy of a timetable's schedule and the version it
//! was copied from. Cell edits and moves are validated and applied to the
//! staged copy only; nothing is persisted until [`EditController::commit`],
//! which writes the staged schedule through the history manager with a
//! compare-and-swap on the base version.
//!
//! Every edit produces an [`EditOutcome`]:
//! - `applied`: no blocking conflict, and any warnings were confirmed;
//! - `needs_confirmation`: warnings only, resend with `confirm_warnings`;
//! - `rejected`: at least one blocking conflict, staged copy untouched.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::conflicts::{Conflict, ConflictValidator, EditTarget, ValidationOutcome};
use super::drop_zones::{evaluate_zones, DropZoneMap};
use super::error::{ServiceError, ServiceResult};
use super::history;
use crate::db::repository::FullRepository;
use crate::models::{
    Cell, ClassId, ScheduleGrid, SlotEntry, SlotPosition, Timetable, TimetableId, UserId,
};

/// Result of a single staged edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditStatus {
    Applied,
    NeedsConfirmation,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOutcome {
    pub status: EditStatus,
    pub conflicts: Vec<Conflict>,
}

impl EditOutcome {
    /// Decide what to do with a validated proposal.
    fn decide(outcome: ValidationOutcome, confirm_warnings: bool) -> Self {
        let status = if !outcome.valid {
            EditStatus::Rejected
        } else if outcome.has_warnings() && !confirm_warnings {
            EditStatus::NeedsConfirmation
        } else {
            EditStatus::Applied
        };
        Self {
            status,
            conflicts: outcome.conflicts,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == EditStatus::Applied
    }
}

/// Staged state of one editing session.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub id: Uuid,
    pub timetable_id: TimetableId,
    pub class: ClassId,
    /// Version the staged copy was taken from.
    pub base_version: u32,
    pub staged: ScheduleGrid,
    /// Human-readable log of applied edits, used as the commit description.
    pub changes: Vec<String>,
    pub opened_at: DateTime<Utc>,
    /// Time of the last staged edit, or of opening.
    pub last_active: DateTime<Utc>,
}

impl EditSession {
    fn open(timetable: &Timetable) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            timetable_id: timetable.id,
            class: timetable.class,
            base_version: timetable.current_version,
            staged: timetable.schedule.clone(),
            changes: Vec::new(),
            opened_at: now,
            last_active: now,
        }
    }

    fn target<'a>(&self, grid: &'a ScheduleGrid) -> EditTarget<'a> {
        EditTarget {
            timetable_id: self.timetable_id,
            class: self.class,
            grid,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            timetable_id: self.timetable_id,
            base_version: self.base_version,
            schedule: self.staged.clone(),
            changes: self.changes.clone(),
            opened_at: self.opened_at,
        }
    }
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub timetable_id: TimetableId,
    pub base_version: u32,
    pub schedule: ScheduleGrid,
    pub changes: Vec<String>,
    pub opened_at: DateTime<Utc>,
}

/// Outcome of an edit together with the resulting staged state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditResponse {
    #[serde(flatten)]
    pub outcome: EditOutcome,
    pub session: SessionView,
}

/// Minutes a session may sit untouched before it is dropped.
pub const DEFAULT_SESSION_IDLE_MINS: i64 = 120;

/// In-memory store of open sessions.
///
/// Each session sits behind its own async mutex so concurrent requests on
/// the same session are serialized while other sessions proceed. Sessions
/// idle for longer than the store's timeout are evicted whenever a new one
/// is opened.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<EditSession>>>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(Duration::minutes(DEFAULT_SESSION_IDLE_MINS))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
        }
    }

    fn insert(&self, session: EditSession) -> Uuid {
        self.evict_idle(Utc::now());
        let id = session.id;
        self.sessions.write().insert(id, Arc::new(Mutex::new(session)));
        id
    }

    /// Remove sessions whose last activity is older than the idle timeout.
    /// Sessions currently locked by a request are in use and kept.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.idle_timeout;
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.last_active >= cutoff,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "Evicted idle edit sessions");
        }
        evicted
    }

    fn get(&self, id: Uuid) -> ServiceResult<Arc<Mutex<EditSession>>> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(format!("Edit session {} not found", id)))
    }

    fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

/// Orchestrates validation and staging for edit sessions.
pub struct EditController<'a, R: FullRepository + ?Sized> {
    repo: &'a R,
    sessions: &'a SessionStore,
}

impl<'a, R: FullRepository + ?Sized> EditController<'a, R> {
    pub fn new(repo: &'a R, sessions: &'a SessionStore) -> Self {
        Self { repo, sessions }
    }

    /// Start a session on the current version of a timetable.
    pub async fn open(&self, timetable_id: TimetableId) -> ServiceResult<SessionView> {
        let timetable = self.repo.get_timetable(timetable_id).await?;
        let session = EditSession::open(&timetable);
        let view = session.view();
        self.sessions.insert(session);
        info!(
            timetable_id = %timetable_id,
            session_id = %view.session_id,
            base_version = view.base_version,
            "Opened edit session"
        );
        Ok(view)
    }

    pub async fn get(&self, session_id: Uuid) -> ServiceResult<SessionView> {
        let session = self.sessions.get(session_id)?;
        let session = session.lock().await;
        Ok(session.view())
    }

    /// Replace the content of one cell.
    pub async fn set_slot(
        &self,
        session_id: Uuid,
        pos: SlotPosition,
        content: Cell,
        confirm_warnings: bool,
    ) -> ServiceResult<EditResponse> {
        let handle = self.sessions.get(session_id)?;
        let mut session = handle.lock().await;

        let outcome = ConflictValidator::new(self.repo)
            .validate_cell(session.target(&session.staged), pos, &content)
            .await?;
        let outcome = EditOutcome::decide(outcome, confirm_warnings);

        if outcome.is_applied() {
            let change = if content.is_empty() {
                format!("Cleared {}", pos)
            } else {
                format!("Updated {}", pos)
            };
            session.staged.set_cell(pos, content);
            session.changes.push(change);
        }
        session.last_active = Utc::now();
        debug!(
            session_id = %session_id,
            position = %pos.key(),
            status = ?outcome.status,
            "Staged slot edit"
        );

        Ok(EditResponse {
            outcome,
            session: session.view(),
        })
    }

    /// Move the content of `source` to `target`, swapping if `target` is
    /// occupied. Both directions must pass validation; otherwise neither cell
    /// changes.
    pub async fn move_or_swap(
        &self,
        session_id: Uuid,
        source: SlotPosition,
        target: SlotPosition,
        confirm_warnings: bool,
    ) -> ServiceResult<EditResponse> {
        if source == target {
            return Err(ServiceError::invalid_input(
                "Source and target slot are the same",
            ));
        }

        let handle = self.sessions.get(session_id)?;
        let mut session = handle.lock().await;

        let source_content: Cell = session.staged.cell(source).to_vec();
        if source_content.is_empty() {
            return Err(ServiceError::invalid_input(format!("{} is empty", source)));
        }
        let target_content: Cell = session.staged.cell(target).to_vec();

        let outcome = if target.is_lunch() {
            ValidationOutcome::from_conflicts(vec![Conflict::lunch_break()])
        } else {
            self.validate_exchange(&session, source, target, &source_content, &target_content)
                .await?
        };
        let outcome = EditOutcome::decide(outcome, confirm_warnings);

        if outcome.is_applied() {
            let change = if target_content.is_empty() {
                format!("Moved {} to {}", source, target)
            } else {
                format!("Swapped {} with {}", source, target)
            };
            session.staged.set_cell(target, source_content);
            session.staged.set_cell(source, target_content);
            session.changes.push(change);
        }
        session.last_active = Utc::now();
        debug!(
            session_id = %session_id,
            source = %source.key(),
            target = %target.key(),
            status = ?outcome.status,
            "Staged move"
        );

        Ok(EditResponse {
            outcome,
            session: session.view(),
        })
    }

    /// Validate both halves of a move or swap against the staged grid with
    /// the two cells lifted out.
    async fn validate_exchange(
        &self,
        session: &EditSession,
        source: SlotPosition,
        target: SlotPosition,
        source_content: &[SlotEntry],
        target_content: &[SlotEntry],
    ) -> ServiceResult<ValidationOutcome> {
        let validator = ConflictValidator::new(self.repo);

        let mut lifted = session.staged.clone();
        lifted.take_cell(source);
        lifted.take_cell(target);
        let forward = validator
            .validate_cell(session.target(&lifted), target, source_content)
            .await?;

        if target_content.is_empty() {
            return Ok(forward);
        }

        lifted.set_cell(target, source_content.to_vec());
        let backward = validator
            .validate_cell(session.target(&lifted), source, target_content)
            .await?;

        Ok(ValidationOutcome::merge([forward, backward]))
    }

    /// Drop-zone map for dragging `source`. `content` defaults to the staged
    /// content of `source`.
    pub async fn drop_zones(
        &self,
        session_id: Uuid,
        source: SlotPosition,
        content: Option<Cell>,
    ) -> ServiceResult<DropZoneMap> {
        let handle = self.sessions.get(session_id)?;
        let session = handle.lock().await;
        let content = content.unwrap_or_else(|| session.staged.cell(source).to_vec());
        let map = evaluate_zones(self.repo, session.target(&session.staged), source, &content)
            .await?;
        Ok(map)
    }

    /// Persist the staged schedule as the next version and close the session.
    ///
    /// Fails with [`ServiceError::VersionConflict`] if the timetable changed
    /// since the session was opened; the session stays open in that case.
    pub async fn commit(
        &self,
        session_id: Uuid,
        editor: Option<UserId>,
        description: Option<String>,
    ) -> ServiceResult<Timetable> {
        let handle = self.sessions.get(session_id)?;
        let session = handle.lock().await;

        let description = description
            .filter(|d| !d.trim().is_empty())
            .or_else(|| (!session.changes.is_empty()).then(|| session.changes.join("; ")));

        let stored = history::commit(
            self.repo,
            session.timetable_id,
            Some(session.base_version),
            session.staged.clone(),
            editor,
            description,
        )
        .await?;

        self.sessions.remove(session_id);
        info!(
            session_id = %session_id,
            timetable_id = %stored.id,
            version = stored.current_version,
            "Committed edit session"
        );
        Ok(stored)
    }

    /// Drop a session without persisting anything.
    pub fn discard(&self, session_id: Uuid) -> ServiceResult<()> {
        if self.sessions.remove(session_id) {
            debug!(session_id = %session_id, "Discarded edit session");
            Ok(())
        } else {
            Err(ServiceError::not_found(format!(
                "Edit session {} not found",
                session_id
            )))
        }
    }
}

/// Validate a single proposal against the stored schedule of a timetable.
pub async fn validate_slot<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
    pos: SlotPosition,
    proposed: Option<&SlotEntry>,
) -> ServiceResult<ValidationOutcome> {
    let timetable = repo.get_timetable(timetable_id).await?;
    let target = EditTarget {
        timetable_id,
        class: timetable.class,
        grid: &timetable.schedule,
    };
    Ok(ConflictValidator::new(repo)
        .validate(target, pos, proposed)
        .await?)
}

/// Replace the whole schedule in one commit.
///
/// The schedule is stored as given; cell-level rules are only enforced by
/// [`validate_slot`] and edit sessions.
pub async fn edit_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
    schedule: ScheduleGrid,
    editor: Option<UserId>,
    changes: Option<String>,
) -> ServiceResult<Timetable> {
    history::commit(repo, timetable_id, None, schedule, editor, changes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::conflicts::ConflictKind;

    #[test]
    fn test_decide_statuses() {
        let clean = EditOutcome::decide(ValidationOutcome::clean(), false);
        assert_eq!(clean.status, EditStatus::Applied);

        let blocked = ValidationOutcome::from_conflicts(vec![Conflict::lunch_break()]);
        assert_eq!(
            EditOutcome::decide(blocked, true).status,
            EditStatus::Rejected
        );

        let warning = ValidationOutcome::from_conflicts(vec![Conflict::new(
            ConflictKind::TeacherCooldownWarning,
            "three in a row",
        )]);
        assert_eq!(
            EditOutcome::decide(warning.clone(), false).status,
            EditStatus::NeedsConfirmation
        );
        assert_eq!(
            EditOutcome::decide(warning, true).status,
            EditStatus::Applied
        );
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let response = EditOutcome::decide(
            ValidationOutcome::from_conflicts(vec![Conflict::lunch_break()]),
            false,
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["conflicts"][0]["type"], "lunch_break");
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let store = SessionStore::new();
        let err = store.get(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(store.is_empty());
    }

    fn session_at(last_active: DateTime<Utc>) -> EditSession {
        EditSession {
            id: Uuid::new_v4(),
            timetable_id: TimetableId(1),
            class: ClassId(1),
            base_version: 1,
            staged: ScheduleGrid::empty(),
            changes: Vec::new(),
            opened_at: last_active,
            last_active,
        }
    }

    #[test]
    fn test_idle_sessions_are_evicted() {
        let store = SessionStore::with_idle_timeout(Duration::minutes(30));
        let now = Utc::now();
        let fresh = store.insert(session_at(now - Duration::minutes(5)));
        let stale = store.insert(session_at(now - Duration::hours(3)));

        assert_eq!(store.evict_idle(now), 1);
        assert!(store.get(stale).is_err());
        assert!(store.get(fresh).is_ok());
    }

    #[test]
    fn test_opening_a_session_sweeps_idle_ones() {
        let store = SessionStore::with_idle_timeout(Duration::minutes(30));
        let now = Utc::now();
        let stale = store.insert(session_at(now - Duration::hours(1)));
        store.insert(session_at(now));

        assert!(store.get(stale).is_err());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_session_in_use_is_not_evicted() {
        let store = SessionStore::with_idle_timeout(Duration::minutes(30));
        let now = Utc::now();
        let busy = store.insert(session_at(now - Duration::hours(3)));

        let handle = store.get(busy).unwrap();
        let _guard = handle.lock().await;
        assert_eq!(store.evict_idle(now), 0);
        assert_eq!(store.len(), 1);
    }
}

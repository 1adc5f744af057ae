mod support;

use support::*;
use timetable_backend::db::repository::TimetableRepository;
use timetable_backend::models::*;
use timetable_backend::services::{
    edit_timetable, ConflictKind, EditController, EditStatus, ServiceError, SessionStore,
    ZoneReason,
};

#[tokio::test]
async fn test_set_slot_stages_without_version_bump() {
    let repo = seeded_repo();
    let timetable = store_timetable(&repo, CLASS_A, ScheduleGrid::empty()).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);

    let session = editor.open(timetable.id).await.unwrap();
    assert_eq!(session.base_version, 1);

    let response = editor
        .set_slot(session.session_id, pos(0, 0), vec![algebra()], false)
        .await
        .unwrap();
    assert_eq!(response.outcome.status, EditStatus::Applied);
    assert_eq!(response.session.schedule.cell(pos(0, 0)), &[algebra()]);

    let stored = repo.get_timetable(timetable.id).await.unwrap();
    assert_eq!(stored.current_version, 1);
    assert!(stored.schedule.is_free(pos(0, 0)));
}

#[tokio::test]
async fn test_blocking_conflict_rejects_without_mutation() {
    let repo = seeded_repo();
    let timetable = store_timetable(&repo, CLASS_A, ScheduleGrid::empty()).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let response = editor
        .set_slot(session.session_id, pos(1, LUNCH_SLOT), vec![algebra()], true)
        .await
        .unwrap();
    assert_eq!(response.outcome.status, EditStatus::Rejected);
    assert_eq!(response.outcome.conflicts[0].kind, ConflictKind::LunchBreak);
    assert!(response.session.schedule.is_free(pos(1, LUNCH_SLOT)));
    assert!(response.session.changes.is_empty());
}

#[tokio::test]
async fn test_warning_requires_confirmation() {
    let repo = seeded_repo();
    let timetable = store_timetable(
        &repo,
        CLASS_A,
        grid_with(&[((0, 0), algebra()), ((0, 1), algebra())]),
    )
    .await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let unconfirmed = editor
        .set_slot(session.session_id, pos(0, 2), vec![algebra()], false)
        .await
        .unwrap();
    assert_eq!(unconfirmed.outcome.status, EditStatus::NeedsConfirmation);
    assert!(unconfirmed.session.schedule.is_free(pos(0, 2)));

    let confirmed = editor
        .set_slot(session.session_id, pos(0, 2), vec![algebra()], true)
        .await
        .unwrap();
    assert_eq!(confirmed.outcome.status, EditStatus::Applied);
    assert_eq!(
        confirmed.outcome.conflicts[0].kind,
        ConflictKind::TeacherCooldownWarning
    );
    assert!(!confirmed.session.schedule.is_free(pos(0, 2)));
}

#[tokio::test]
async fn test_move_to_empty_cell() {
    let repo = seeded_repo();
    let timetable = store_timetable(&repo, CLASS_A, grid_with(&[((0, 0), algebra())])).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let response = editor
        .move_or_swap(session.session_id, pos(0, 0), pos(2, 6), false)
        .await
        .unwrap();
    assert_eq!(response.outcome.status, EditStatus::Applied);
    assert!(response.session.schedule.is_free(pos(0, 0)));
    assert_eq!(response.session.schedule.cell(pos(2, 6)), &[algebra()]);
}

#[tokio::test]
async fn test_swap_exchanges_cells() {
    let repo = seeded_repo();
    let timetable = store_timetable(
        &repo,
        CLASS_A,
        grid_with(&[((0, 0), algebra()), ((3, 3), physics())]),
    )
    .await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let response = editor
        .move_or_swap(session.session_id, pos(0, 0), pos(3, 3), false)
        .await
        .unwrap();
    assert_eq!(response.outcome.status, EditStatus::Applied);
    assert_eq!(response.session.schedule.cell(pos(0, 0)), &[physics()]);
    assert_eq!(response.session.schedule.cell(pos(3, 3)), &[algebra()]);
}

#[tokio::test]
async fn test_invalid_swap_leaves_both_cells_unchanged() {
    let repo = seeded_repo();
    // Class B has A. Smith teaching at Monday slot 0, so physics can't go there.
    store_timetable(&repo, CLASS_B, grid_with(&[((0, 0), physics())])).await;
    let timetable = store_timetable(
        &repo,
        CLASS_A,
        grid_with(&[((0, 0), algebra()), ((2, 1), physics())]),
    )
    .await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let response = editor
        .move_or_swap(session.session_id, pos(0, 0), pos(2, 1), true)
        .await
        .unwrap();
    assert_eq!(response.outcome.status, EditStatus::Rejected);
    assert!(response
        .outcome
        .conflicts
        .iter()
        .any(|c| c.kind == ConflictKind::TeacherClash));
    assert_eq!(response.session.schedule.cell(pos(0, 0)), &[algebra()]);
    assert_eq!(response.session.schedule.cell(pos(2, 1)), &[physics()]);
}

#[tokio::test]
async fn test_move_into_lunch_is_rejected() {
    let repo = seeded_repo();
    let timetable = store_timetable(&repo, CLASS_A, grid_with(&[((0, 0), algebra())])).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let response = editor
        .move_or_swap(session.session_id, pos(0, 0), pos(0, LUNCH_SLOT), true)
        .await
        .unwrap();
    assert_eq!(response.outcome.status, EditStatus::Rejected);
    assert_eq!(response.session.schedule.cell(pos(0, 0)), &[algebra()]);
}

#[tokio::test]
async fn test_move_rejects_malformed_requests() {
    let repo = seeded_repo();
    let timetable = store_timetable(&repo, CLASS_A, grid_with(&[((0, 0), algebra())])).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let same = editor
        .move_or_swap(session.session_id, pos(0, 0), pos(0, 0), false)
        .await
        .unwrap_err();
    assert!(matches!(same, ServiceError::InvalidInput(_)));

    let empty = editor
        .move_or_swap(session.session_id, pos(1, 1), pos(1, 2), false)
        .await
        .unwrap_err();
    assert!(matches!(empty, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_commit_persists_staged_schedule() {
    let repo = seeded_repo();
    let timetable = store_timetable(&repo, CLASS_A, ScheduleGrid::empty()).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    editor
        .set_slot(session.session_id, pos(0, 0), vec![algebra()], false)
        .await
        .unwrap();
    editor
        .set_slot(session.session_id, pos(0, 1), vec![physics()], false)
        .await
        .unwrap();

    let committed = editor
        .commit(session.session_id, Some(UserId(11)), None)
        .await
        .unwrap();
    assert_eq!(committed.current_version, 2);
    assert_eq!(committed.edit_history.len(), 1);
    assert_eq!(committed.edit_history[0].schedule_snapshot, ScheduleGrid::empty());
    assert!(committed.edit_history[0]
        .change_description
        .contains("Monday slot 1"));
    assert_eq!(committed.last_edited_by, Some(UserId(11)));
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_commit_after_concurrent_edit_conflicts() {
    let repo = seeded_repo();
    let timetable = store_timetable(&repo, CLASS_A, ScheduleGrid::empty()).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    editor
        .set_slot(session.session_id, pos(0, 0), vec![algebra()], false)
        .await
        .unwrap();
    edit_timetable(
        &repo,
        timetable.id,
        grid_with(&[((4, 7), physics())]),
        None,
        None,
    )
    .await
    .unwrap();

    let err = editor
        .commit(session.session_id, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::VersionConflict { .. }));
    assert_eq!(sessions.len(), 1);

    let stored = repo.get_timetable(timetable.id).await.unwrap();
    assert_eq!(stored.schedule, grid_with(&[((4, 7), physics())]));
}

#[tokio::test]
async fn test_discard_and_unknown_sessions() {
    let repo = seeded_repo();
    let timetable = store_timetable(&repo, CLASS_A, ScheduleGrid::empty()).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    editor.discard(session.session_id).unwrap();
    assert!(matches!(
        editor.get(session.session_id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        editor.discard(session.session_id),
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_drop_zones_are_idempotent() {
    let repo = seeded_repo();
    store_timetable(&repo, CLASS_B, grid_with(&[((1, 0), algebra())])).await;
    let timetable = store_timetable(&repo, CLASS_A, grid_with(&[((0, 0), algebra())])).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let first = editor
        .drop_zones(session.session_id, pos(0, 0), None)
        .await
        .unwrap();
    let second = editor
        .drop_zones(session.session_id, pos(0, 0), None)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 40);

    assert_eq!(
        first.get(pos(0, 0)).unwrap().reason,
        Some(ZoneReason::SameSlot)
    );
    assert_eq!(
        first.get(pos(2, LUNCH_SLOT)).unwrap().reason,
        Some(ZoneReason::LunchBreak)
    );
    let clash = first.get(pos(1, 0)).unwrap();
    assert!(!clash.valid);
    assert_eq!(clash.reason, Some(ZoneReason::TeacherClash));
    assert!(first.get(pos(1, 1)).unwrap().valid);
}

#[tokio::test]
async fn test_drop_zones_for_event_content() {
    let repo = seeded_repo();
    let timetable = store_timetable(
        &repo,
        CLASS_A,
        grid_with(&[((0, 0), SlotEntry::event("Seminar"))]),
    )
    .await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let zones = editor
        .drop_zones(session.session_id, pos(0, 0), None)
        .await
        .unwrap();
    assert_eq!(zones.valid_positions().len(), 34);
}

#[tokio::test]
async fn test_drop_zones_cooldown_does_not_close_cells() {
    let repo = seeded_repo();
    let timetable = store_timetable(
        &repo,
        CLASS_A,
        grid_with(&[((0, 0), algebra()), ((0, 1), algebra()), ((3, 0), algebra())]),
    )
    .await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let zones = editor
        .drop_zones(session.session_id, pos(3, 0), None)
        .await
        .unwrap();
    assert!(zones.get(pos(0, 2)).unwrap().valid);
}

#[tokio::test]
async fn test_class_behind_an_event_is_still_validated() {
    let repo = seeded_repo();
    let timetable = store_timetable(&repo, CLASS_A, ScheduleGrid::empty()).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let response = editor
        .set_slot(
            session.session_id,
            pos(1, LUNCH_SLOT),
            vec![SlotEntry::event("Seminar"), algebra()],
            false,
        )
        .await
        .unwrap();
    assert_eq!(response.outcome.status, EditStatus::Rejected);
    assert_eq!(response.outcome.conflicts.len(), 1);
    assert_eq!(response.outcome.conflicts[0].kind, ConflictKind::LunchBreak);
    assert!(response.session.schedule.is_free(pos(1, LUNCH_SLOT)));
}

#[tokio::test]
async fn test_every_class_in_a_shared_cell_is_checked() {
    let repo = seeded_repo();
    store_timetable(&repo, CLASS_B, grid_with(&[((2, 3), algebra())])).await;
    let timetable = store_timetable(&repo, CLASS_A, ScheduleGrid::empty()).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    // Physics alone is fine here; the second entry double-books J. Doe.
    let response = editor
        .set_slot(session.session_id, pos(2, 3), vec![physics(), algebra()], true)
        .await
        .unwrap();
    assert_eq!(response.outcome.status, EditStatus::Rejected);
    let kinds: Vec<_> = response.outcome.conflicts.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ConflictKind::TeacherClash, ConflictKind::RoomClash]);
    assert!(response.session.schedule.is_free(pos(2, 3)));
}

#[tokio::test]
async fn test_swap_checks_entries_after_the_first() {
    let repo = seeded_repo();
    let unassigned = SlotEntry::class(ALGEBRA, A_SMITH, ROOM_101);
    let mut grid = grid_with(&[((0, 0), algebra())]);
    grid.set_cell(pos(0, 1), vec![SlotEntry::event("Seminar"), unassigned.clone()]);
    let timetable = store_timetable(&repo, CLASS_A, grid).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let response = editor
        .move_or_swap(session.session_id, pos(0, 1), pos(0, 0), true)
        .await
        .unwrap();
    assert_eq!(response.outcome.status, EditStatus::Rejected);
    assert!(response
        .outcome
        .conflicts
        .iter()
        .any(|c| c.kind == ConflictKind::InvalidTeacher));
    assert_eq!(response.session.schedule.cell(pos(0, 0)), &[algebra()]);
    assert_eq!(
        response.session.schedule.cell(pos(0, 1)),
        &[SlotEntry::event("Seminar"), unassigned]
    );
}

#[tokio::test]
async fn test_drop_zones_check_class_behind_an_event() {
    let repo = seeded_repo();
    store_timetable(&repo, CLASS_B, grid_with(&[((2, 3), algebra())])).await;
    let timetable = store_timetable(&repo, CLASS_A, ScheduleGrid::empty()).await;
    let sessions = SessionStore::new();
    let editor = EditController::new(&repo, &sessions);
    let session = editor.open(timetable.id).await.unwrap();

    let content = vec![SlotEntry::event("Seminar"), algebra()];
    let zones = editor
        .drop_zones(session.session_id, pos(0, 0), Some(content))
        .await
        .unwrap();
    let clash = zones.get(pos(2, 3)).unwrap();
    assert!(!clash.valid);
    assert_eq!(clash.reason, Some(ZoneReason::TeacherClash));
    assert!(zones.get(pos(2, 2)).unwrap().valid);
}

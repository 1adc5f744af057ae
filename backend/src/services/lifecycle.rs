//! Status transitions and deletion.
//!
//! Publishing and archiving change only the status: schedule, version and
//! history are left as they are.

use tracing::info;

use super::error::ServiceResult;
use crate::db::repository::FullRepository;
use crate::db::services as db_services;
use crate::models::{StatusTransitionError, Timetable, TimetableId, TimetableStatus};

async fn transition<R, F>(repo: &R, id: TimetableId, next: F) -> ServiceResult<Timetable>
where
    R: FullRepository + ?Sized,
    F: FnOnce(TimetableStatus) -> Result<TimetableStatus, StatusTransitionError>,
{
    let current = repo.get_timetable(id).await?;
    let status = next(current.status)?;
    if status == current.status {
        return Ok(current);
    }

    let updated = repo.set_status(id, status).await?;
    info!(timetable_id = %id, from = %current.status, to = %status, "Timetable status changed");
    Ok(updated)
}

/// `draft | published -> published`.
pub async fn publish<R: FullRepository + ?Sized>(
    repo: &R,
    id: TimetableId,
) -> ServiceResult<Timetable> {
    transition(repo, id, TimetableStatus::publish).await
}

/// `draft | published -> archived`.
pub async fn archive<R: FullRepository + ?Sized>(
    repo: &R,
    id: TimetableId,
) -> ServiceResult<Timetable> {
    transition(repo, id, TimetableStatus::archive).await
}

/// Terminal: the timetable and its history are gone.
pub async fn delete<R: FullRepository + ?Sized>(repo: &R, id: TimetableId) -> ServiceResult<()> {
    Ok(db_services::delete_timetable(repo, id).await?)
}

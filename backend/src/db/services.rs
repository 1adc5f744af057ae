//! High-level database service layer.
//!
//! Repository-agnostic helpers shared by the HTTP handlers and the domain
//! services. They add logging and operation context on top of the raw trait
//! calls.
//!
//! # Usage
//!
//! ```no_run
//! use timetable_backend::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let timetables = services::list_timetables(&repo).await?;
//!     println!("Found {} timetables", timetables.len());
//!     Ok(())
//! }
//! ```

use tracing::{debug, info};

use super::repository::{FullRepository, RepositoryResult};
use crate::models::{ClassId, Timetable, TimetableId, TimetableSummary};

/// Check if the backing store is healthy.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// List all timetables, newest first.
pub async fn list_timetables<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<TimetableSummary>> {
    let timetables = repo
        .list_timetables()
        .await
        .map_err(|e| e.with_operation("list_timetables"))?;
    debug!(count = timetables.len(), "Listed timetables");
    Ok(timetables)
}

/// Retrieve a complete timetable.
pub async fn get_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    id: TimetableId,
) -> RepositoryResult<Timetable> {
    repo.get_timetable(id)
        .await
        .map_err(|e| e.with_operation("get_timetable"))
}

/// All timetables of one class, newest first.
pub async fn get_class_timetables<R: FullRepository + ?Sized>(
    repo: &R,
    class: ClassId,
) -> RepositoryResult<Vec<Timetable>> {
    repo.list_timetables_for_class(class)
        .await
        .map_err(|e| e.with_operation("get_class_timetables"))
}

/// Permanently delete a timetable. History is not kept.
pub async fn delete_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    id: TimetableId,
) -> RepositoryResult<()> {
    repo.delete_timetable(id)
        .await
        .map_err(|e| e.with_operation("delete_timetable"))?;
    info!(timetable_id = %id, "Deleted timetable");
    Ok(())
}

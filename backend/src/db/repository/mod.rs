//! Repository traits for abstracting persistence.
//!
//! Two concerns are split into separate traits:
//! - [`TimetableRepository`]: the timetables this service owns and mutates.
//! - [`RegistryRepository`]: read-only institution records (classes, teachers,
//!   subjects, classrooms, assignments) owned by the administration side.
//!
//! [`FullRepository`] combines both and is what the HTTP layer holds.
//!
//! # Thread Safety
//! Implementations must be `Send + Sync` to work with async Rust and allow
//! sharing across threads.

use async_trait::async_trait;

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::models::{
    Assignment, Class, ClassDetails, ClassId, Classroom, ClassroomId, Department, DepartmentId,
    NewTimetable, Program, ProgramId, Subject, SubjectId, Teacher, TeacherId, Timetable,
    TimetableId, TimetableStatus, TimetableSummary,
};

/// Storage of timetables and their version history.
#[async_trait]
pub trait TimetableRepository: Send + Sync {
    /// Check if the backing store is healthy.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store generator output as a new draft at version 1.
    async fn create_timetable(&self, timetable: NewTimetable) -> RepositoryResult<Timetable>;

    /// Retrieve a complete timetable, including its history.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the timetable doesn't exist
    async fn get_timetable(&self, id: TimetableId) -> RepositoryResult<Timetable>;

    /// List all timetables, most recently generated first.
    async fn list_timetables(&self) -> RepositoryResult<Vec<TimetableSummary>>;

    /// All timetables of one class, most recently generated first.
    async fn list_timetables_for_class(&self, class: ClassId) -> RepositoryResult<Vec<Timetable>>;

    /// Draft and published timetables other than `exclude`.
    ///
    /// Used by clash detection; the result is a point-in-time copy and may be
    /// stale by the time it is inspected.
    async fn list_active_timetables_except(
        &self,
        exclude: TimetableId,
    ) -> RepositoryResult<Vec<Timetable>>;

    /// Replace a stored timetable if its version still equals `expected_version`.
    ///
    /// This is the compare-and-swap used by commit and revert: schedule,
    /// history, version and edit attribution are written together or not at
    /// all. Identity, class, academic period and `status` keep their stored
    /// values, so a concurrent status change survives the write.
    ///
    /// # Returns
    /// * `Err(RepositoryError::VersionConflict)` - If another write landed first
    /// * `Err(RepositoryError::NotFound)` - If the timetable was deleted
    async fn replace_timetable(
        &self,
        timetable: Timetable,
        expected_version: u32,
    ) -> RepositoryResult<Timetable>;

    /// Change the status without touching schedule or history.
    async fn set_status(
        &self,
        id: TimetableId,
        status: TimetableStatus,
    ) -> RepositoryResult<Timetable>;

    /// Permanently remove a timetable.
    async fn delete_timetable(&self, id: TimetableId) -> RepositoryResult<()>;
}

/// Read-only access to institution records.
#[async_trait]
pub trait RegistryRepository: Send + Sync {
    async fn get_class(&self, id: ClassId) -> RepositoryResult<Class>;

    async fn get_program(&self, id: ProgramId) -> RepositoryResult<Program>;

    async fn get_department(&self, id: DepartmentId) -> RepositoryResult<Department>;

    async fn get_teacher(&self, id: TeacherId) -> RepositoryResult<Teacher>;

    async fn get_subject(&self, id: SubjectId) -> RepositoryResult<Subject>;

    async fn get_classroom(&self, id: ClassroomId) -> RepositoryResult<Classroom>;

    async fn list_classrooms(&self) -> RepositoryResult<Vec<Classroom>>;

    async fn assignments_for_class(&self, class: ClassId) -> RepositoryResult<Vec<Assignment>>;

    async fn assignments_for_teacher(
        &self,
        teacher: TeacherId,
    ) -> RepositoryResult<Vec<Assignment>>;

    /// Name lookups. Only used when importing name-based generator output.
    async fn find_teacher_by_name(&self, name: &str) -> RepositoryResult<Option<Teacher>>;

    async fn find_subject_by_name(&self, name: &str) -> RepositoryResult<Option<Subject>>;

    async fn find_classroom_by_name(&self, name: &str) -> RepositoryResult<Option<Classroom>>;

    /// The assignment for a `(class, subject, teacher)` triple, if any.
    async fn find_assignment(
        &self,
        class: ClassId,
        subject: SubjectId,
        teacher: TeacherId,
    ) -> RepositoryResult<Option<Assignment>> {
        Ok(self
            .assignments_for_class(class)
            .await?
            .into_iter()
            .find(|a| a.subject == subject && a.teacher == teacher))
    }

    /// Class with program and department resolved. Missing parents are `None`.
    async fn get_class_details(&self, id: ClassId) -> RepositoryResult<ClassDetails> {
        let class = self.get_class(id).await?;
        let program = self.get_program(class.program).await.ok();
        let department = match &program {
            Some(p) => self.get_department(p.department).await.ok(),
            None => None,
        };
        Ok(ClassDetails {
            id: class.id,
            name: class.name,
            code: class.code,
            semester: class.semester,
            section: class.section,
            program,
            department,
        })
    }
}

/// Everything the HTTP layer needs from persistence.
pub trait FullRepository: TimetableRepository + RegistryRepository {}

impl<T: TimetableRepository + RegistryRepository> FullRepository for T {}

//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! memory behind a single lock, so every trait method observes and mutates a
//! consistent state and `replace_timetable` is a true compare-and-swap.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::*;

/// In-memory local repository.
///
/// # Example
/// ```
/// use timetable_backend::db::repositories::LocalRepository;
/// use timetable_backend::db::repository::TimetableRepository;
///
/// # tokio_test_block(async {
/// let repo = LocalRepository::new();
/// assert!(repo.list_timetables().await.unwrap().is_empty());
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    timetables: BTreeMap<TimetableId, Timetable>,

    // Registry
    departments: HashMap<DepartmentId, Department>,
    programs: HashMap<ProgramId, Program>,
    classes: HashMap<ClassId, Class>,
    teachers: HashMap<TeacherId, Teacher>,
    subjects: HashMap<SubjectId, Subject>,
    classrooms: BTreeMap<ClassroomId, Classroom>,
    assignments: Vec<Assignment>,

    next_timetable_id: TimetableId,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            timetables: BTreeMap::new(),
            departments: HashMap::new(),
            programs: HashMap::new(),
            classes: HashMap::new(),
            teachers: HashMap::new(),
            subjects: HashMap::new(),
            classrooms: BTreeMap::new(),
            assignments: Vec::new(),
            next_timetable_id: TimetableId(1),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a repository pre-populated with registry records.
    pub fn with_seed(seed: RegistrySeed) -> Self {
        let repo = Self::new();
        repo.load_seed(seed);
        repo
    }

    /// Insert (or overwrite) every record of a registry seed.
    pub fn load_seed(&self, seed: RegistrySeed) {
        let mut data = self.data.write();
        for d in seed.departments {
            data.departments.insert(d.id, d);
        }
        for p in seed.programs {
            data.programs.insert(p.id, p);
        }
        for c in seed.classes {
            data.classes.insert(c.id, c);
        }
        for t in seed.teachers {
            data.teachers.insert(t.id, t);
        }
        for s in seed.subjects {
            data.subjects.insert(s.id, s);
        }
        for r in seed.classrooms {
            data.classrooms.insert(r.id, r);
        }
        for a in seed.assignments {
            upsert_assignment(&mut data.assignments, a);
        }
    }

    pub fn insert_class(&self, class: Class) {
        self.data.write().classes.insert(class.id, class);
    }

    pub fn insert_teacher(&self, teacher: Teacher) {
        self.data.write().teachers.insert(teacher.id, teacher);
    }

    pub fn insert_subject(&self, subject: Subject) {
        self.data.write().subjects.insert(subject.id, subject);
    }

    pub fn insert_classroom(&self, classroom: Classroom) {
        self.data.write().classrooms.insert(classroom.id, classroom);
    }

    /// One subject per class: a second assignment for the same pair replaces the first.
    pub fn insert_assignment(&self, assignment: Assignment) {
        upsert_assignment(&mut self.data.write().assignments, assignment);
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Get the number of timetables stored.
    pub fn timetable_count(&self) -> usize {
        self.data.read().timetables.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert_assignment(assignments: &mut Vec<Assignment>, assignment: Assignment) {
    match assignments
        .iter_mut()
        .find(|a| a.class == assignment.class && a.subject == assignment.subject)
    {
        Some(existing) => *existing = assignment,
        None => assignments.push(assignment),
    }
}

fn timetable_not_found(id: TimetableId, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Timetable {} not found", id),
        ErrorContext::new(operation)
            .with_entity("timetable")
            .with_entity_id(id),
    )
}

fn record_not_found(entity: &str, id: impl ToString) -> RepositoryError {
    let id = id.to_string();
    RepositoryError::not_found_with_context(
        format!("{} {} not found", entity, id),
        ErrorContext::new(format!("get_{}", entity.to_lowercase()))
            .with_entity(entity.to_lowercase())
            .with_entity_id(id),
    )
}

/// Newest first; ids break ties so listings are stable.
fn newest_first(a: &Timetable, b: &Timetable) -> std::cmp::Ordering {
    b.generated_at
        .cmp(&a.generated_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl TimetableRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn create_timetable(&self, timetable: NewTimetable) -> RepositoryResult<Timetable> {
        self.check_health()?;
        let mut data = self.data.write();
        let id = data.next_timetable_id;
        data.next_timetable_id = TimetableId(id.0 + 1);

        let timetable = timetable.into_timetable(id, Utc::now());
        data.timetables.insert(id, timetable.clone());
        Ok(timetable)
    }

    async fn get_timetable(&self, id: TimetableId) -> RepositoryResult<Timetable> {
        self.check_health()?;
        self.data
            .read()
            .timetables
            .get(&id)
            .cloned()
            .ok_or_else(|| timetable_not_found(id, "get_timetable"))
    }

    async fn list_timetables(&self) -> RepositoryResult<Vec<TimetableSummary>> {
        self.check_health()?;
        let data = self.data.read();
        let mut all: Vec<&Timetable> = data.timetables.values().collect();
        all.sort_by(|a, b| newest_first(a, b));
        Ok(all.into_iter().map(Timetable::summary).collect())
    }

    async fn list_timetables_for_class(&self, class: ClassId) -> RepositoryResult<Vec<Timetable>> {
        self.check_health()?;
        let data = self.data.read();
        let mut found: Vec<Timetable> = data
            .timetables
            .values()
            .filter(|t| t.class == class)
            .cloned()
            .collect();
        found.sort_by(newest_first);
        Ok(found)
    }

    async fn list_active_timetables_except(
        &self,
        exclude: TimetableId,
    ) -> RepositoryResult<Vec<Timetable>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .timetables
            .values()
            .filter(|t| t.id != exclude && t.status.is_active())
            .cloned()
            .collect())
    }

    async fn replace_timetable(
        &self,
        timetable: Timetable,
        expected_version: u32,
    ) -> RepositoryResult<Timetable> {
        self.check_health()?;
        let mut data = self.data.write();
        let stored = data
            .timetables
            .get_mut(&timetable.id)
            .ok_or_else(|| timetable_not_found(timetable.id, "replace_timetable"))?;

        if stored.current_version != expected_version {
            return Err(RepositoryError::version_conflict(
                expected_version,
                stored.current_version,
                ErrorContext::new("replace_timetable")
                    .with_entity("timetable")
                    .with_entity_id(timetable.id),
            ));
        }

        // Status belongs to set_status; a commit read before a publish or
        // archive must not roll it back.
        stored.schedule = timetable.schedule;
        stored.current_version = timetable.current_version;
        stored.edit_history = timetable.edit_history;
        stored.is_edited = timetable.is_edited;
        stored.last_edited_at = timetable.last_edited_at;
        stored.last_edited_by = timetable.last_edited_by;
        stored.updated_at = timetable.updated_at;
        Ok(stored.clone())
    }

    async fn set_status(
        &self,
        id: TimetableId,
        status: TimetableStatus,
    ) -> RepositoryResult<Timetable> {
        self.check_health()?;
        let mut data = self.data.write();
        let stored = data
            .timetables
            .get_mut(&id)
            .ok_or_else(|| timetable_not_found(id, "set_status"))?;
        stored.status = status;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_timetable(&self, id: TimetableId) -> RepositoryResult<()> {
        self.check_health()?;
        self.data
            .write()
            .timetables
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| timetable_not_found(id, "delete_timetable"))
    }
}

#[async_trait]
impl RegistryRepository for LocalRepository {
    async fn get_class(&self, id: ClassId) -> RepositoryResult<Class> {
        self.check_health()?;
        self.data
            .read()
            .classes
            .get(&id)
            .cloned()
            .ok_or_else(|| record_not_found("Class", id))
    }

    async fn get_program(&self, id: ProgramId) -> RepositoryResult<Program> {
        self.check_health()?;
        self.data
            .read()
            .programs
            .get(&id)
            .cloned()
            .ok_or_else(|| record_not_found("Program", id))
    }

    async fn get_department(&self, id: DepartmentId) -> RepositoryResult<Department> {
        self.check_health()?;
        self.data
            .read()
            .departments
            .get(&id)
            .cloned()
            .ok_or_else(|| record_not_found("Department", id))
    }

    async fn get_teacher(&self, id: TeacherId) -> RepositoryResult<Teacher> {
        self.check_health()?;
        self.data
            .read()
            .teachers
            .get(&id)
            .cloned()
            .ok_or_else(|| record_not_found("Teacher", id))
    }

    async fn get_subject(&self, id: SubjectId) -> RepositoryResult<Subject> {
        self.check_health()?;
        self.data
            .read()
            .subjects
            .get(&id)
            .cloned()
            .ok_or_else(|| record_not_found("Subject", id))
    }

    async fn get_classroom(&self, id: ClassroomId) -> RepositoryResult<Classroom> {
        self.check_health()?;
        self.data
            .read()
            .classrooms
            .get(&id)
            .cloned()
            .ok_or_else(|| record_not_found("Classroom", id))
    }

    async fn list_classrooms(&self) -> RepositoryResult<Vec<Classroom>> {
        self.check_health()?;
        Ok(self.data.read().classrooms.values().cloned().collect())
    }

    async fn assignments_for_class(&self, class: ClassId) -> RepositoryResult<Vec<Assignment>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .assignments
            .iter()
            .filter(|a| a.class == class)
            .copied()
            .collect())
    }

    async fn assignments_for_teacher(
        &self,
        teacher: TeacherId,
    ) -> RepositoryResult<Vec<Assignment>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .assignments
            .iter()
            .filter(|a| a.teacher == teacher)
            .copied()
            .collect())
    }

    async fn find_teacher_by_name(&self, name: &str) -> RepositoryResult<Option<Teacher>> {
        self.check_health()?;
        let name = name.trim();
        let data = self.data.read();
        let mut matches: Vec<&Teacher> = data.teachers.values().filter(|t| t.name == name).collect();
        matches.sort_by_key(|t| t.id);
        Ok(matches.first().map(|t| (*t).clone()))
    }

    async fn find_subject_by_name(&self, name: &str) -> RepositoryResult<Option<Subject>> {
        self.check_health()?;
        let name = name.trim();
        let data = self.data.read();
        let mut matches: Vec<&Subject> = data.subjects.values().filter(|s| s.name == name).collect();
        matches.sort_by_key(|s| s.id);
        Ok(matches.first().map(|s| (*s).clone()))
    }

    async fn find_classroom_by_name(&self, name: &str) -> RepositoryResult<Option<Classroom>> {
        self.check_health()?;
        let name = name.trim();
        Ok(self
            .data
            .read()
            .classrooms
            .values()
            .find(|r| r.name == name)
            .cloned())
    }
}

//! Timetable generation through the external solver.
//!
//! The solver works on names, not ids: it receives the subjects, teachers and
//! classrooms of one class and answers with a 5 × 8 grid whose cells name a
//! subject, teacher and classroom (or carry an `{"event": ...}` marker). The
//! grid is imported once, resolving every name to a registry id, and stored as
//! a fresh draft at version 1.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::models::{
    Cell, ClassId, ClassroomId, NewTimetable, ScheduleGrid, SlotEntry, SubjectId, TeacherId,
    Timetable, TimetableId, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("Solver service is not reachable: {0}")]
    Unavailable(String),

    #[error("Timetable generation timed out")]
    Timeout,

    /// The solver ran and reported that it could not produce a schedule.
    #[error("{0}")]
    Solver(String),

    #[error("Solver returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("Could not import solver output: {0}")]
    Import(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSubject {
    pub name: String,
    pub code: String,
    pub lectures_per_week: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverTeacher {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverClassroom {
    pub name: String,
    pub capacity: u32,
}

/// Body posted to the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverRequest {
    pub subjects: Vec<SolverSubject>,
    pub teachers: Vec<SolverTeacher>,
    pub classrooms: Vec<SolverClassroom>,
}

/// One entry of a solver cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SolverEntry {
    Class {
        subject: String,
        teacher: String,
        classroom: String,
    },
    Event {
        event: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timetable: Option<Vec<Vec<Vec<SolverEntry>>>>,
}

impl SolverResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Source of generated schedules.
#[async_trait]
pub trait ScheduleGenerator: Send + Sync {
    async fn generate(&self, request: &SolverRequest) -> Result<SolverResponse, GenerationError>;
}

/// Solver reached over HTTP.
#[cfg(feature = "http-server")]
pub struct HttpScheduleGenerator {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "http-server")]
impl HttpScheduleGenerator {
    pub fn new(url: impl Into<String>, timeout: std::time::Duration) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_settings(settings: &crate::config::SolverSettings) -> Result<Self, GenerationError> {
        Self::new(
            settings.url.clone(),
            std::time::Duration::from_secs(settings.timeout_secs),
        )
    }

    fn classify(err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout
        } else if err.is_connect() {
            GenerationError::Unavailable(err.to_string())
        } else {
            GenerationError::InvalidResponse(err.to_string())
        }
    }
}

#[cfg(feature = "http-server")]
#[async_trait]
impl ScheduleGenerator for HttpScheduleGenerator {
    async fn generate(&self, request: &SolverRequest) -> Result<SolverResponse, GenerationError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(Self::classify)?;

        let status = response.status();
        let body = response.text().await.map_err(Self::classify)?;
        match serde_json::from_str::<SolverResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(GenerationError::Solver(format!(
                "Solver responded with {}",
                status
            ))),
            Err(e) => Err(GenerationError::InvalidResponse(e.to_string())),
        }
    }
}

/// Class summary returned with a generated timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub code: String,
    pub semester: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTimetable {
    pub message: String,
    pub timetable_id: TimetableId,
    pub class_info: ClassInfo,
    pub timetable: Timetable,
}

/// Build the solver request for a class.
pub async fn build_request<R: FullRepository + ?Sized>(
    repo: &R,
    class_id: ClassId,
) -> ServiceResult<SolverRequest> {
    let class = repo.get_class(class_id).await?;
    let assignments = repo.assignments_for_class(class_id).await?;
    if assignments.is_empty() {
        return Err(ServiceError::invalid_input(
            "No subjects assigned to this class. Please assign subjects and teachers first.",
        ));
    }

    let mut subjects = Vec::with_capacity(assignments.len());
    let mut teachers: Vec<SolverTeacher> = Vec::new();
    for assignment in &assignments {
        let subject = repo.get_subject(assignment.subject).await?;
        let teacher = repo.get_teacher(assignment.teacher).await?;
        subjects.push(SolverSubject {
            name: subject.name,
            code: subject.code,
            lectures_per_week: subject.lectures_per_week,
        });
        if !teachers.iter().any(|t| t.name == teacher.name) {
            teachers.push(SolverTeacher { name: teacher.name });
        }
    }

    let rooms = match class.assigned_room {
        Some(room) => vec![repo.get_classroom(room).await?],
        None => repo.list_classrooms().await?,
    };
    let classrooms = rooms
        .into_iter()
        .map(|r| SolverClassroom {
            name: r.name,
            capacity: r.capacity,
        })
        .collect();

    Ok(SolverRequest {
        subjects,
        teachers,
        classrooms,
    })
}

/// Resolves solver names to registry ids, caching each lookup.
struct NameResolver<'a, R: FullRepository + ?Sized> {
    repo: &'a R,
    subjects: HashMap<String, SubjectId>,
    teachers: HashMap<String, TeacherId>,
    classrooms: HashMap<String, ClassroomId>,
}

impl<'a, R: FullRepository + ?Sized> NameResolver<'a, R> {
    fn new(repo: &'a R) -> Self {
        Self {
            repo,
            subjects: HashMap::new(),
            teachers: HashMap::new(),
            classrooms: HashMap::new(),
        }
    }

    async fn subject(&mut self, name: &str) -> ServiceResult<SubjectId> {
        if let Some(id) = self.subjects.get(name) {
            return Ok(*id);
        }
        let id = resolved(self.repo.find_subject_by_name(name).await, "subject", name)?.id;
        self.subjects.insert(name.to_string(), id);
        Ok(id)
    }

    async fn teacher(&mut self, name: &str) -> ServiceResult<TeacherId> {
        if let Some(id) = self.teachers.get(name) {
            return Ok(*id);
        }
        let id = resolved(self.repo.find_teacher_by_name(name).await, "teacher", name)?.id;
        self.teachers.insert(name.to_string(), id);
        Ok(id)
    }

    async fn classroom(&mut self, name: &str) -> ServiceResult<ClassroomId> {
        if let Some(id) = self.classrooms.get(name) {
            return Ok(*id);
        }
        let id = resolved(self.repo.find_classroom_by_name(name).await, "classroom", name)?.id;
        self.classrooms.insert(name.to_string(), id);
        Ok(id)
    }
}

fn resolved<T>(found: RepositoryResult<Option<T>>, kind: &str, name: &str) -> ServiceResult<T> {
    found?.ok_or_else(|| {
        GenerationError::Import(format!("unknown {} '{}'", kind, name)).into()
    })
}

/// Convert a name-based solver grid into an id-based schedule.
pub async fn import_schedule<R: FullRepository + ?Sized>(
    repo: &R,
    raw: Vec<Vec<Vec<SolverEntry>>>,
) -> ServiceResult<ScheduleGrid> {
    let mut resolver = NameResolver::new(repo);
    let mut days = Vec::with_capacity(raw.len());
    for raw_day in raw {
        let mut day = Vec::with_capacity(raw_day.len());
        for raw_cell in raw_day {
            let mut cell: Cell = Vec::with_capacity(raw_cell.len());
            for entry in raw_cell {
                cell.push(match entry {
                    SolverEntry::Event { event } => SlotEntry::event(event),
                    SolverEntry::Class {
                        subject,
                        teacher,
                        classroom,
                    } => SlotEntry::class(
                        resolver.subject(&subject).await?,
                        resolver.teacher(&teacher).await?,
                        resolver.classroom(&classroom).await?,
                    ),
                });
            }
            day.push(cell);
        }
        days.push(day);
    }

    ScheduleGrid::try_from(days).map_err(|e| GenerationError::Import(e.to_string()).into())
}

/// Generate, import and store a new draft timetable for a class.
pub async fn generate_timetable<R, G>(
    repo: &R,
    generator: &G,
    class_id: ClassId,
    academic_year: Option<String>,
    generated_by: Option<UserId>,
) -> ServiceResult<GeneratedTimetable>
where
    R: FullRepository + ?Sized,
    G: ScheduleGenerator + ?Sized,
{
    let class = repo.get_class(class_id).await?;
    let request = build_request(repo, class_id).await?;
    info!(
        class_id = %class_id,
        subjects = request.subjects.len(),
        teachers = request.teachers.len(),
        classrooms = request.classrooms.len(),
        "Requesting timetable from solver"
    );

    let response = generator.generate(&request).await.inspect_err(|e| {
        warn!(class_id = %class_id, error = %e, "Solver call failed");
    })?;
    if !response.is_success() {
        let message = response
            .message
            .unwrap_or_else(|| format!("Solver returned status '{}'", response.status));
        warn!(class_id = %class_id, %message, "Solver could not produce a timetable");
        return Err(GenerationError::Solver(message).into());
    }
    let raw = response.timetable.ok_or_else(|| {
        GenerationError::InvalidResponse("successful response without a timetable".to_string())
    })?;

    let schedule = import_schedule(repo, raw).await?;
    let academic_year = academic_year
        .filter(|y| !y.trim().is_empty())
        .unwrap_or_else(|| Utc::now().year().to_string());

    let timetable = repo
        .create_timetable(NewTimetable {
            class: class_id,
            academic_year,
            semester: class.semester,
            schedule,
            generated_by,
        })
        .await?;
    info!(
        class_id = %class_id,
        timetable_id = %timetable.id,
        "Generated timetable stored as draft"
    );

    Ok(GeneratedTimetable {
        message: "Timetable generated and saved successfully!".to_string(),
        timetable_id: timetable.id,
        class_info: ClassInfo {
            name: class.name,
            code: class.code,
            semester: class.semester,
        },
        timetable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_entries_parse_both_shapes() {
        let cell: Vec<SolverEntry> = serde_json::from_str(
            r#"[{"subject": "Algebra", "teacher": "J. Doe", "classroom": "Room 101"},
                {"event": "Lunch Break"}]"#,
        )
        .unwrap();
        assert!(matches!(&cell[0], SolverEntry::Class { teacher, .. } if teacher == "J. Doe"));
        assert_eq!(
            cell[1],
            SolverEntry::Event {
                event: "Lunch Break".to_string()
            }
        );
    }

    #[test]
    fn test_error_response_parses_without_timetable() {
        let response: SolverResponse =
            serde_json::from_str(r#"{"status": "error", "message": "No teachers available."}"#)
                .unwrap();
        assert!(!response.is_success());
        assert!(response.timetable.is_none());
    }

    #[test]
    fn test_request_serializes_snake_case() {
        let request = SolverRequest {
            subjects: vec![SolverSubject {
                name: "Algebra".to_string(),
                code: "MA101".to_string(),
                lectures_per_week: 3,
            }],
            teachers: vec![],
            classrooms: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["subjects"][0]["lectures_per_week"], 3);
    }
}

//! Read-only views for the class, teacher and editor screens.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ServiceResult;
use crate::db::repository::FullRepository;
use crate::db::services as db_services;
use crate::models::{
    AssignmentDetails, ClassDetails, ClassId, Classroom, Subject, TeacherId, Timetable,
    TimetableId, TimetableStatus,
};

/// All timetables of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTimetables {
    pub class: ClassDetails,
    pub timetables: Vec<Timetable>,
}

/// One class a teacher teaches, and what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingAssignment {
    pub class: ClassDetails,
    pub subject: Subject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherTimetables {
    pub teacher_id: TeacherId,
    pub classes: Vec<TeachingAssignment>,
    /// Published timetables of the classes above.
    pub timetables: Vec<Timetable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Choices offered when editing a cell of a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorOptions {
    pub assignments: Vec<AssignmentDetails>,
    pub classrooms: Vec<Classroom>,
}

pub async fn class_timetables<R: FullRepository + ?Sized>(
    repo: &R,
    class_id: ClassId,
) -> ServiceResult<ClassTimetables> {
    let class = repo.get_class_details(class_id).await?;
    let timetables = db_services::get_class_timetables(repo, class_id).await?;
    Ok(ClassTimetables { class, timetables })
}

pub async fn teacher_timetables<R: FullRepository + ?Sized>(
    repo: &R,
    teacher_id: TeacherId,
) -> ServiceResult<TeacherTimetables> {
    let assignments = repo.assignments_for_teacher(teacher_id).await?;
    if assignments.is_empty() {
        return Ok(TeacherTimetables {
            teacher_id,
            classes: Vec::new(),
            timetables: Vec::new(),
            message: Some("No classes assigned to this teacher".to_string()),
        });
    }

    let mut classes = Vec::with_capacity(assignments.len());
    let mut class_ids = BTreeSet::new();
    for assignment in &assignments {
        classes.push(TeachingAssignment {
            class: repo.get_class_details(assignment.class).await?,
            subject: repo.get_subject(assignment.subject).await?,
        });
        class_ids.insert(assignment.class);
    }

    let mut timetables = Vec::new();
    for class_id in class_ids {
        timetables.extend(
            repo.list_timetables_for_class(class_id)
                .await?
                .into_iter()
                .filter(|t| t.status == TimetableStatus::Published),
        );
    }
    debug!(
        teacher_id = %teacher_id,
        classes = classes.len(),
        published = timetables.len(),
        "Built teacher view"
    );

    Ok(TeacherTimetables {
        teacher_id,
        classes,
        timetables,
        message: None,
    })
}

/// Assignments of the timetable's class plus every classroom.
pub async fn editor_options<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> ServiceResult<EditorOptions> {
    let timetable = repo.get_timetable(timetable_id).await?;

    let mut assignments = Vec::new();
    for assignment in repo.assignments_for_class(timetable.class).await? {
        let preferred_room = match assignment.preferred_room {
            Some(room) => repo.get_classroom(room).await.ok(),
            None => None,
        };
        assignments.push(AssignmentDetails {
            class: assignment.class,
            subject: repo.get_subject(assignment.subject).await?,
            teacher: repo.get_teacher(assignment.teacher).await?,
            preferred_room,
        });
    }

    Ok(EditorOptions {
        assignments,
        classrooms: repo.list_classrooms().await?,
    })
}

//! Records owned by the institution registry.
//!
//! Departments, programs, classes, subjects, teachers, classrooms and the
//! class/subject/teacher assignments are administered elsewhere. The editor
//! only reads them: to resolve display names, to check assignments and to
//! populate selection lists.

use serde::{Deserialize, Serialize};

use super::{ClassId, ClassroomId, DepartmentId, ProgramId, SubjectId, TeacherId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub code: String,
    pub department: DepartmentId,
}

/// A group of students that shares one timetable (e.g. "CS-A Semester 3").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub code: String,
    pub program: ProgramId,
    pub semester: u32,
    #[serde(default = "default_section")]
    pub section: String,
    /// Permanent room, if the class always meets in the same place.
    #[serde(default)]
    pub assigned_room: Option<ClassroomId>,
    #[serde(default)]
    pub student_count: u32,
}

fn default_section() -> String {
    "A".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub code: String,
    pub lectures_per_week: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: ClassroomId,
    pub name: String,
    pub capacity: u32,
}

/// Who teaches a subject to a class, and where they prefer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub class: ClassId,
    pub subject: SubjectId,
    pub teacher: TeacherId,
    #[serde(default)]
    pub preferred_room: Option<ClassroomId>,
}

/// Class record with its program and department resolved, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDetails {
    pub id: ClassId,
    pub name: String,
    pub code: String,
    pub semester: u32,
    pub section: String,
    pub program: Option<Program>,
    pub department: Option<Department>,
}

/// Assignment with subject and teacher records resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetails {
    pub class: ClassId,
    pub subject: Subject,
    pub teacher: Teacher,
    pub preferred_room: Option<Classroom>,
}

/// Registry contents loaded from a seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySeed {
    pub departments: Vec<Department>,
    pub programs: Vec<Program>,
    pub classes: Vec<Class>,
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<Subject>,
    pub classrooms: Vec<Classroom>,
    pub assignments: Vec<Assignment>,
}

//! Domain types shared by the repository, service and HTTP layers.

pub mod grid;
pub mod macros;
pub mod registry;
pub mod timetable;

pub use grid::*;
pub use registry::*;
pub use timetable::*;

crate::define_id_type!(i64 =>
    TimetableId,
    ClassId,
    ProgramId,
    DepartmentId,
    TeacherId,
    SubjectId,
    ClassroomId,
    UserId,
);

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use timetable_backend::db::repositories::LocalRepository;
use timetable_backend::db::repository::TimetableRepository;
use timetable_backend::models::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serializes access to process-global
/// env vars so tests running in parallel don't observe each other.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Registry fixture
// =============================================================================

pub const CLASS_A: ClassId = ClassId(1);
pub const CLASS_B: ClassId = ClassId(2);
/// Has no assignments.
pub const CLASS_C: ClassId = ClassId(3);

pub const J_DOE: TeacherId = TeacherId(7);
pub const A_SMITH: TeacherId = TeacherId(8);

pub const ALGEBRA: SubjectId = SubjectId(1);
pub const PHYSICS: SubjectId = SubjectId(2);

pub const ROOM_101: ClassroomId = ClassroomId(101);
pub const LAB_1: ClassroomId = ClassroomId(102);

fn class(id: ClassId, name: &str, code: &str) -> Class {
    Class {
        id,
        name: name.to_string(),
        code: code.to_string(),
        program: ProgramId(1),
        semester: 3,
        section: "A".to_string(),
        assigned_room: None,
        student_count: 30,
    }
}

/// Three classes, two teachers, two subjects, two rooms.
///
/// J. Doe teaches Algebra and A. Smith teaches Physics to classes A and B.
pub fn seed() -> RegistrySeed {
    RegistrySeed {
        departments: vec![Department {
            id: DepartmentId(1),
            name: "Computer Science".to_string(),
            code: "CS".to_string(),
        }],
        programs: vec![Program {
            id: ProgramId(1),
            name: "BSc Computer Science".to_string(),
            code: "BSCS".to_string(),
            department: DepartmentId(1),
        }],
        classes: vec![
            class(CLASS_A, "Class A", "CSA3"),
            class(CLASS_B, "Class B", "CSB3"),
            class(CLASS_C, "Class C", "CSC3"),
        ],
        teachers: vec![
            Teacher {
                id: J_DOE,
                name: "J. Doe".to_string(),
            },
            Teacher {
                id: A_SMITH,
                name: "A. Smith".to_string(),
            },
        ],
        subjects: vec![
            Subject {
                id: ALGEBRA,
                name: "Algebra".to_string(),
                code: "MA101".to_string(),
                lectures_per_week: 3,
            },
            Subject {
                id: PHYSICS,
                name: "Physics".to_string(),
                code: "PH101".to_string(),
                lectures_per_week: 2,
            },
        ],
        classrooms: vec![
            Classroom {
                id: ROOM_101,
                name: "Room 101".to_string(),
                capacity: 40,
            },
            Classroom {
                id: LAB_1,
                name: "Lab 1".to_string(),
                capacity: 25,
            },
        ],
        assignments: [CLASS_A, CLASS_B]
            .into_iter()
            .flat_map(|class| {
                [
                    Assignment {
                        class,
                        subject: ALGEBRA,
                        teacher: J_DOE,
                        preferred_room: Some(ROOM_101),
                    },
                    Assignment {
                        class,
                        subject: PHYSICS,
                        teacher: A_SMITH,
                        preferred_room: Some(LAB_1),
                    },
                ]
            })
            .collect(),
    }
}

pub fn seeded_repo() -> LocalRepository {
    LocalRepository::with_seed(seed())
}

pub fn pos(day: usize, slot: usize) -> SlotPosition {
    SlotPosition::new(day, slot).unwrap()
}

/// Algebra by J. Doe in Room 101.
pub fn algebra() -> SlotEntry {
    SlotEntry::class(ALGEBRA, J_DOE, ROOM_101)
}

/// Physics by A. Smith in Lab 1.
pub fn physics() -> SlotEntry {
    SlotEntry::class(PHYSICS, A_SMITH, LAB_1)
}

pub fn grid_with(entries: &[((usize, usize), SlotEntry)]) -> ScheduleGrid {
    let mut grid = ScheduleGrid::empty();
    for ((day, slot), entry) in entries {
        grid.set_cell(pos(*day, *slot), vec![entry.clone()]);
    }
    grid
}

/// Store a draft timetable for `class` with the given schedule.
pub async fn store_timetable(
    repo: &LocalRepository,
    class: ClassId,
    schedule: ScheduleGrid,
) -> Timetable {
    repo.create_timetable(NewTimetable {
        class,
        academic_year: "2026".to_string(),
        semester: 3,
        schedule,
        generated_by: None,
    })
    .await
    .unwrap()
}

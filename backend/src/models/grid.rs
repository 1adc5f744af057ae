//! Weekly schedule grid.
//!
//! A timetable's schedule is a fixed 5 × 8 grid: five teaching days with eight
//! one-hour periods each. Every cell holds zero or more [`SlotEntry`] values so
//! that concurrent sub-groups (labs) can share a period. An empty cell is free.
//!
//! The grid is serialized as a nested JSON array `[day][slot][entry]`, which is
//! also the persisted layout. Deserialization rejects any other shape.

use serde::{Deserialize, Serialize};

use super::{ClassroomId, SubjectId, TeacherId};

/// Number of teaching days per week.
pub const DAYS_PER_WEEK: usize = 5;

/// Number of periods per day.
pub const SLOTS_PER_DAY: usize = 8;

/// Period reserved for lunch.
pub const LUNCH_SLOT: usize = 4;

/// Day labels, indexed like the grid.
pub const DAY_NAMES: [&str; DAYS_PER_WEEK] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// Errors raised when a position or grid does not fit the weekly shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("day {0} is out of range (expected 0..{DAYS_PER_WEEK})")]
    DayOutOfRange(usize),

    #[error("slot {0} is out of range (expected 0..{SLOTS_PER_DAY})")]
    SlotOutOfRange(usize),

    #[error("schedule must have {DAYS_PER_WEEK} days, found {0}")]
    WrongDayCount(usize),

    #[error("day {day} must have {SLOTS_PER_DAY} slots, found {found}")]
    WrongSlotCount { day: usize, found: usize },
}

/// A single entry placed in a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotEntry {
    /// A scheduled class: subject taught by a teacher in a classroom.
    Class(ClassOccupancy),
    /// A labelled non-teaching event (e.g. "Lunch Break", "Seminar").
    Event { label: String },
}

/// Subject, teacher and classroom of a scheduled class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassOccupancy {
    pub subject: SubjectId,
    pub teacher: TeacherId,
    pub classroom: ClassroomId,
}

impl SlotEntry {
    pub fn class(subject: SubjectId, teacher: TeacherId, classroom: ClassroomId) -> Self {
        SlotEntry::Class(ClassOccupancy {
            subject,
            teacher,
            classroom,
        })
    }

    pub fn event(label: impl Into<String>) -> Self {
        SlotEntry::Event {
            label: label.into(),
        }
    }

    /// The occupancy, if this entry is a scheduled class.
    pub fn as_class(&self) -> Option<&ClassOccupancy> {
        match self {
            SlotEntry::Class(occupancy) => Some(occupancy),
            SlotEntry::Event { .. } => None,
        }
    }
}

/// Content of one cell.
pub type Cell = Vec<SlotEntry>;

/// Every class occupancy in a cell, in order. Events are skipped.
pub fn class_entries(cell: &[SlotEntry]) -> impl Iterator<Item = &ClassOccupancy> {
    cell.iter().filter_map(SlotEntry::as_class)
}

/// A validated `(day, slot)` coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotPosition {
    day: usize,
    slot: usize,
}

impl SlotPosition {
    pub fn new(day: usize, slot: usize) -> Result<Self, GridError> {
        if day >= DAYS_PER_WEEK {
            return Err(GridError::DayOutOfRange(day));
        }
        if slot >= SLOTS_PER_DAY {
            return Err(GridError::SlotOutOfRange(slot));
        }
        Ok(Self { day, slot })
    }

    pub fn day(&self) -> usize {
        self.day
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn is_lunch(&self) -> bool {
        self.slot == LUNCH_SLOT
    }

    /// All 40 positions in day-major order.
    pub fn all() -> impl Iterator<Item = SlotPosition> {
        (0..DAYS_PER_WEEK)
            .flat_map(|day| (0..SLOTS_PER_DAY).map(move |slot| SlotPosition { day, slot }))
    }

    /// Key used by the drop-zone map, e.g. `"2-5"`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.day, self.slot)
    }
}

impl std::fmt::Display for SlotPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} slot {}", DAY_NAMES[self.day], self.slot)
    }
}

/// The 5 × 8 weekly grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")]
pub struct ScheduleGrid {
    days: Vec<Vec<Cell>>,
}

impl ScheduleGrid {
    /// An entirely free week.
    pub fn empty() -> Self {
        Self {
            days: vec![vec![Vec::new(); SLOTS_PER_DAY]; DAYS_PER_WEEK],
        }
    }

    pub fn cell(&self, pos: SlotPosition) -> &[SlotEntry] {
        &self.days[pos.day][pos.slot]
    }

    pub fn set_cell(&mut self, pos: SlotPosition, content: Cell) {
        self.days[pos.day][pos.slot] = content;
    }

    /// Take the content out of a cell, leaving it free.
    pub fn take_cell(&mut self, pos: SlotPosition) -> Cell {
        std::mem::take(&mut self.days[pos.day][pos.slot])
    }

    pub fn is_free(&self, pos: SlotPosition) -> bool {
        self.cell(pos).is_empty()
    }

    /// Cells of one day in slot order.
    pub fn day(&self, day: usize) -> Option<&[Cell]> {
        self.days.get(day).map(Vec::as_slice)
    }

    /// Whether any class entry in the cell is taught by `teacher`.
    pub fn has_teacher(&self, pos: SlotPosition, teacher: TeacherId) -> bool {
        self.cell(pos)
            .iter()
            .filter_map(SlotEntry::as_class)
            .any(|c| c.teacher == teacher)
    }

    /// Every class occupancy in the grid with its position.
    pub fn occupancies(&self) -> impl Iterator<Item = (SlotPosition, &ClassOccupancy)> {
        SlotPosition::all().flat_map(move |pos| {
            self.cell(pos)
                .iter()
                .filter_map(SlotEntry::as_class)
                .map(move |c| (pos, c))
        })
    }

    /// Number of non-free cells.
    pub fn filled_cells(&self) -> usize {
        SlotPosition::all().filter(|p| !self.is_free(*p)).count()
    }
}

impl Default for ScheduleGrid {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Vec<Vec<Cell>>> for ScheduleGrid {
    type Error = GridError;

    fn try_from(days: Vec<Vec<Cell>>) -> Result<Self, Self::Error> {
        if days.len() != DAYS_PER_WEEK {
            return Err(GridError::WrongDayCount(days.len()));
        }
        for (day, slots) in days.iter().enumerate() {
            if slots.len() != SLOTS_PER_DAY {
                return Err(GridError::WrongSlotCount {
                    day,
                    found: slots.len(),
                });
            }
        }
        Ok(Self { days })
    }
}

impl From<ScheduleGrid> for Vec<Vec<Cell>> {
    fn from(grid: ScheduleGrid) -> Self {
        grid.days
    }
}

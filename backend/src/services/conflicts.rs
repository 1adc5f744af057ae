//! Conflict validation for proposed slot placements.
//!
//! A proposal is one [`SlotEntry`] placed at one [`SlotPosition`] of the
//! timetable being edited. Free cells and events are never checked. A class
//! occupancy goes through five checks, in this order:
//!
//! 1. `lunch_break` (blocking): nothing is taught in the lunch slot.
//! 2. `teacher_clash` (blocking): the teacher is already teaching another
//!    active timetable's class in the same period.
//! 3. `room_clash` (blocking): the classroom is already booked in the same
//!    period by another active timetable.
//! 4. `teacher_cooldown_warning` (warning): the placement would give the
//!    teacher three or more back-to-back periods in this timetable.
//! 5. `invalid_teacher` (blocking): the teacher is not assigned to the
//!    subject for this class.
//!
//! A cell holding several entries is validated entry by entry with
//! [`ConflictValidator::validate_cell`] and the findings merged.
//!
//! The proposal is valid iff no blocking conflict was found. Warnings are
//! returned so the caller can ask for explicit confirmation.
//!
//! Collaborator data (other timetables, the assignment, display names) is
//! loaded once into a [`ProposalContext`]; the checks themselves are pure, so
//! the same context can be evaluated against many positions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::repository::{FullRepository, RepositoryResult};
use crate::models::{
    ClassId, ClassOccupancy, ScheduleGrid, SlotEntry, SlotPosition, TimetableId, DAY_NAMES,
    LUNCH_SLOT, SLOTS_PER_DAY,
};

/// Back-to-back periods already taught, beyond which a new one warrants a warning.
pub const COOLDOWN_THRESHOLD: usize = 2;

/// Category of a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    LunchBreak,
    TeacherClash,
    RoomClash,
    TeacherCooldownWarning,
    InvalidTeacher,
}

impl ConflictKind {
    pub fn severity(&self) -> Severity {
        match self {
            ConflictKind::TeacherCooldownWarning => Severity::Warning,
            _ => Severity::Blocking,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Prevents the change.
    Blocking,
    /// Allowed after explicit confirmation.
    Warning,
}

/// The other class involved in a clash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingClass {
    pub id: ClassId,
    pub name: String,
}

/// A single finding about a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicting_class: Option<ConflictingClass>,
}

impl Conflict {
    pub fn new(kind: ConflictKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity: kind.severity(),
            conflicting_class: None,
        }
    }

    fn with_class(mut self, id: ClassId, name: &str) -> Self {
        self.conflicting_class = Some(ConflictingClass {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn lunch_break() -> Self {
        Conflict::new(
            ConflictKind::LunchBreak,
            format!("Slot {} is the lunch break; no class can be scheduled there", LUNCH_SLOT),
        )
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

/// Result of validating one proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub conflicts: Vec<Conflict>,
}

impl ValidationOutcome {
    /// No conflicts at all.
    pub fn clean() -> Self {
        Self {
            valid: true,
            conflicts: Vec::new(),
        }
    }

    pub fn from_conflicts(conflicts: Vec<Conflict>) -> Self {
        Self {
            valid: !conflicts.iter().any(Conflict::is_blocking),
            conflicts,
        }
    }

    /// Combine outcomes of several checks that must all pass. Identical
    /// findings are reported once.
    pub fn merge(outcomes: impl IntoIterator<Item = ValidationOutcome>) -> Self {
        let mut conflicts: Vec<Conflict> = Vec::new();
        for conflict in outcomes.into_iter().flat_map(|o| o.conflicts) {
            if !conflicts.contains(&conflict) {
                conflicts.push(conflict);
            }
        }
        Self::from_conflicts(conflicts)
    }

    pub fn first_blocking(&self) -> Option<&Conflict> {
        self.conflicts.iter().find(|c| c.is_blocking())
    }

    pub fn has_warnings(&self) -> bool {
        self.conflicts.iter().any(|c| c.severity == Severity::Warning)
    }

    pub fn has(&self, kind: ConflictKind) -> bool {
        self.conflicts.iter().any(|c| c.kind == kind)
    }
}

/// The timetable a proposal is checked against.
///
/// `grid` is the schedule as the editor currently sees it, which may be a
/// staged, uncommitted copy.
#[derive(Debug, Clone, Copy)]
pub struct EditTarget<'a> {
    pub timetable_id: TimetableId,
    pub class: ClassId,
    pub grid: &'a ScheduleGrid,
}

/// Another active timetable, reduced to what clash detection needs.
#[derive(Debug, Clone)]
struct Peer {
    class: ClassId,
    class_name: String,
    grid: ScheduleGrid,
}

/// Collaborator facts about one proposed occupancy.
#[derive(Debug, Clone)]
pub struct ProposalContext {
    occupancy: ClassOccupancy,
    peers: Vec<Peer>,
    assigned: bool,
    teacher_name: String,
    subject_name: String,
    classroom_name: String,
}

impl ProposalContext {
    pub fn occupancy(&self) -> &ClassOccupancy {
        &self.occupancy
    }

    /// Run all checks for placing the occupancy at `pos` of `grid`.
    pub fn check(&self, grid: &ScheduleGrid, pos: SlotPosition) -> ValidationOutcome {
        let mut conflicts = Vec::new();

        if pos.is_lunch() {
            conflicts.push(Conflict::lunch_break());
        }

        self.check_teacher_clash(pos, &mut conflicts);
        self.check_room_clash(pos, &mut conflicts);
        self.check_cooldown(grid, pos, &mut conflicts);

        if !self.assigned {
            conflicts.push(Conflict::new(
                ConflictKind::InvalidTeacher,
                format!(
                    "{} is not assigned to teach {} for this class",
                    self.teacher_name, self.subject_name
                ),
            ));
        }

        ValidationOutcome::from_conflicts(conflicts)
    }

    fn check_teacher_clash(&self, pos: SlotPosition, conflicts: &mut Vec<Conflict>) {
        let teacher = self.occupancy.teacher;
        for peer in &self.peers {
            let clashes = peer
                .grid
                .cell(pos)
                .iter()
                .filter_map(SlotEntry::as_class)
                .any(|c| c.teacher == teacher);
            if clashes {
                conflicts.push(
                    Conflict::new(
                        ConflictKind::TeacherClash,
                        format!(
                            "{} is already teaching {} on {}",
                            self.teacher_name, peer.class_name, pos
                        ),
                    )
                    .with_class(peer.class, &peer.class_name),
                );
            }
        }
    }

    fn check_room_clash(&self, pos: SlotPosition, conflicts: &mut Vec<Conflict>) {
        let classroom = self.occupancy.classroom;
        for peer in &self.peers {
            let clashes = peer
                .grid
                .cell(pos)
                .iter()
                .filter_map(SlotEntry::as_class)
                .any(|c| c.classroom == classroom);
            if clashes {
                conflicts.push(
                    Conflict::new(
                        ConflictKind::RoomClash,
                        format!(
                            "{} is already booked by {} on {}",
                            self.classroom_name, peer.class_name, pos
                        ),
                    )
                    .with_class(peer.class, &peer.class_name),
                );
            }
        }
    }

    fn check_cooldown(&self, grid: &ScheduleGrid, pos: SlotPosition, conflicts: &mut Vec<Conflict>) {
        let run = consecutive_run(grid, pos, self.occupancy.teacher);
        if run >= COOLDOWN_THRESHOLD {
            conflicts.push(Conflict::new(
                ConflictKind::TeacherCooldownWarning,
                format!(
                    "{} would teach {} consecutive classes on {}",
                    self.teacher_name,
                    run + 1,
                    DAY_NAMES[pos.day()]
                ),
            ));
        }
    }
}

/// Periods adjacent to `pos` on the same day that `teacher` already teaches
/// without a break, not counting `pos` itself.
pub fn consecutive_run(
    grid: &ScheduleGrid,
    pos: SlotPosition,
    teacher: crate::models::TeacherId,
) -> usize {
    let teaches = |slot: usize| {
        SlotPosition::new(pos.day(), slot)
            .map(|p| grid.has_teacher(p, teacher))
            .unwrap_or(false)
    };

    let before = (0..pos.slot()).rev().take_while(|&s| teaches(s)).count();
    let after = (pos.slot() + 1..SLOTS_PER_DAY)
        .take_while(|&s| teaches(s))
        .count();
    before + after
}

/// Display name of a registry record. A record missing from the registry
/// gets a placeholder; any other lookup failure is returned.
fn name_or_placeholder(
    lookup: RepositoryResult<String>,
    placeholder: impl FnOnce() -> String,
) -> RepositoryResult<String> {
    match lookup {
        Ok(name) => Ok(name),
        Err(e) if e.is_not_found() => Ok(placeholder()),
        Err(e) => Err(e),
    }
}

/// Validates proposals against the repository.
pub struct ConflictValidator<'a, R: FullRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: FullRepository + ?Sized> ConflictValidator<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Validate `proposed` at `pos`. `None` (a free cell) and events are
    /// always valid.
    pub async fn validate(
        &self,
        target: EditTarget<'_>,
        pos: SlotPosition,
        proposed: Option<&SlotEntry>,
    ) -> RepositoryResult<ValidationOutcome> {
        let Some(occupancy) = proposed.and_then(SlotEntry::as_class) else {
            return Ok(ValidationOutcome::clean());
        };

        let context = self.load_context(target, occupancy).await?;
        let outcome = context.check(target.grid, pos);
        debug!(
            timetable_id = %target.timetable_id,
            position = %pos.key(),
            valid = outcome.valid,
            conflicts = outcome.conflicts.len(),
            "Validated slot proposal"
        );
        Ok(outcome)
    }

    /// Validate a whole cell placed at `pos`: every class occupancy in it is
    /// checked and the findings merged. Events contribute nothing.
    pub async fn validate_cell(
        &self,
        target: EditTarget<'_>,
        pos: SlotPosition,
        cell: &[SlotEntry],
    ) -> RepositoryResult<ValidationOutcome> {
        let mut outcomes = Vec::new();
        for entry in cell.iter().filter(|e| e.as_class().is_some()) {
            outcomes.push(self.validate(target, pos, Some(entry)).await?);
        }
        Ok(ValidationOutcome::merge(outcomes))
    }

    /// Load every collaborator fact the checks need for `occupancy`.
    pub async fn load_context(
        &self,
        target: EditTarget<'_>,
        occupancy: &ClassOccupancy,
    ) -> RepositoryResult<ProposalContext> {
        let mut others = self
            .repo
            .list_active_timetables_except(target.timetable_id)
            .await?;
        others.sort_by_key(|t| t.id);

        let mut class_names: HashMap<ClassId, String> = HashMap::new();
        let mut peers = Vec::with_capacity(others.len());
        for timetable in others {
            let class_name = match class_names.get(&timetable.class) {
                Some(name) => name.clone(),
                None => {
                    let name = name_or_placeholder(
                        self.repo.get_class(timetable.class).await.map(|c| c.name),
                        || format!("Class #{}", timetable.class),
                    )?;
                    class_names.insert(timetable.class, name.clone());
                    name
                }
            };
            peers.push(Peer {
                class: timetable.class,
                class_name,
                grid: timetable.schedule,
            });
        }

        let assigned = self
            .repo
            .find_assignment(target.class, occupancy.subject, occupancy.teacher)
            .await?
            .is_some();

        let teacher_name = name_or_placeholder(
            self.repo.get_teacher(occupancy.teacher).await.map(|t| t.name),
            || format!("Teacher #{}", occupancy.teacher),
        )?;
        let subject_name = name_or_placeholder(
            self.repo.get_subject(occupancy.subject).await.map(|s| s.name),
            || format!("Subject #{}", occupancy.subject),
        )?;
        let classroom_name = name_or_placeholder(
            self.repo.get_classroom(occupancy.classroom).await.map(|r| r.name),
            || format!("Classroom #{}", occupancy.classroom),
        )?;

        Ok(ProposalContext {
            occupancy: *occupancy,
            peers,
            assigned,
            teacher_name,
            subject_name,
            classroom_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::RepositoryError;
    use crate::models::{ClassroomId, SubjectId, TeacherId};

    fn occupancy(teacher: i64, room: i64) -> ClassOccupancy {
        ClassOccupancy {
            subject: SubjectId(1),
            teacher: TeacherId(teacher),
            classroom: ClassroomId(room),
        }
    }

    fn context(peers: Vec<Peer>, assigned: bool) -> ProposalContext {
        ProposalContext {
            occupancy: occupancy(7, 101),
            peers,
            assigned,
            teacher_name: "J. Doe".to_string(),
            subject_name: "Algebra".to_string(),
            classroom_name: "Room 101".to_string(),
        }
    }

    fn pos(day: usize, slot: usize) -> SlotPosition {
        SlotPosition::new(day, slot).unwrap()
    }

    fn place(grid: &mut ScheduleGrid, day: usize, slot: usize, occ: ClassOccupancy) {
        grid.set_cell(pos(day, slot), vec![SlotEntry::Class(occ)]);
    }

    #[test]
    fn test_clean_proposal() {
        let outcome = context(vec![], true).check(&ScheduleGrid::empty(), pos(0, 0));
        assert_eq!(outcome, ValidationOutcome::clean());
    }

    #[test]
    fn test_lunch_slot_is_blocking() {
        let outcome = context(vec![], true).check(&ScheduleGrid::empty(), pos(2, LUNCH_SLOT));
        assert!(!outcome.valid);
        assert_eq!(outcome.conflicts[0].kind, ConflictKind::LunchBreak);
        assert_eq!(outcome.conflicts[0].severity, Severity::Blocking);
    }

    #[test]
    fn test_peer_clashes_name_the_other_class() {
        let mut peer_grid = ScheduleGrid::empty();
        place(&mut peer_grid, 0, 0, occupancy(7, 101));
        let peer = Peer {
            class: ClassId(1),
            class_name: "Class A".to_string(),
            grid: peer_grid,
        };

        let outcome = context(vec![peer], true).check(&ScheduleGrid::empty(), pos(0, 0));
        assert!(!outcome.valid);
        assert!(outcome.has(ConflictKind::TeacherClash));
        assert!(outcome.has(ConflictKind::RoomClash));
        let clash = outcome.first_blocking().unwrap();
        assert_eq!(clash.conflicting_class.as_ref().unwrap().name, "Class A");
    }

    #[test]
    fn test_peer_events_do_not_clash() {
        let mut peer_grid = ScheduleGrid::empty();
        peer_grid.set_cell(pos(0, 0), vec![SlotEntry::event("Assembly")]);
        let peer = Peer {
            class: ClassId(1),
            class_name: "Class A".to_string(),
            grid: peer_grid,
        };
        assert!(context(vec![peer], true)
            .check(&ScheduleGrid::empty(), pos(0, 0))
            .valid);
    }

    #[test]
    fn test_cooldown_counts_both_directions() {
        let mut grid = ScheduleGrid::empty();
        place(&mut grid, 1, 1, occupancy(7, 5));
        place(&mut grid, 1, 3, occupancy(7, 5));

        assert_eq!(consecutive_run(&grid, pos(1, 2), TeacherId(7)), 2);
        let outcome = context(vec![], true).check(&grid, pos(1, 2));
        assert!(outcome.valid);
        assert!(outcome.has_warnings());
        assert!(outcome.conflicts[0].message.contains("3 consecutive"));
    }

    #[test]
    fn test_cooldown_stops_at_gap() {
        let mut grid = ScheduleGrid::empty();
        place(&mut grid, 0, 0, occupancy(7, 5));
        place(&mut grid, 0, 2, occupancy(7, 5));
        assert_eq!(consecutive_run(&grid, pos(0, 3), TeacherId(7)), 1);
        assert_eq!(consecutive_run(&grid, pos(0, 7), TeacherId(7)), 0);
    }

    #[test]
    fn test_unassigned_teacher_is_blocking() {
        let outcome = context(vec![], false).check(&ScheduleGrid::empty(), pos(0, 0));
        assert!(!outcome.valid);
        assert_eq!(outcome.conflicts[0].kind, ConflictKind::InvalidTeacher);
        assert_eq!(
            outcome.conflicts[0].message,
            "J. Doe is not assigned to teach Algebra for this class"
        );
    }

    #[test]
    fn test_conflict_serialization() {
        let json = serde_json::to_value(Conflict::lunch_break()).unwrap();
        assert_eq!(json["type"], "lunch_break");
        assert_eq!(json["severity"], "blocking");
        assert!(json.get("conflictingClass").is_none());
    }

    #[test]
    fn test_merge_keeps_blocking() {
        let merged = ValidationOutcome::merge([
            ValidationOutcome::clean(),
            ValidationOutcome::from_conflicts(vec![Conflict::lunch_break()]),
        ]);
        assert!(!merged.valid);
        assert_eq!(merged.conflicts.len(), 1);
    }

    #[test]
    fn test_merge_collapses_repeated_findings() {
        let lunch = || ValidationOutcome::from_conflicts(vec![Conflict::lunch_break()]);
        let merged = ValidationOutcome::merge([lunch(), lunch()]);
        assert_eq!(merged.conflicts, vec![Conflict::lunch_break()]);
    }

    #[test]
    fn test_missing_record_gets_placeholder_name() {
        let missing = Err(RepositoryError::not_found("Teacher 9 not found"));
        let name = name_or_placeholder(missing, || "Teacher #9".to_string()).unwrap();
        assert_eq!(name, "Teacher #9");
    }

    #[test]
    fn test_lookup_failure_is_propagated() {
        let down = Err(RepositoryError::connection("Database is not healthy"));
        let err = name_or_placeholder(down, || "Teacher #9".to_string()).unwrap_err();
        assert!(!err.is_not_found());
    }
}

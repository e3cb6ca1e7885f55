//! Diary orchestration: atomic booking, slot search, and undo.
//!
//! The scheduler owns one diary per professional plus the shared resource
//! pool. Every committed mutation snapshots the prior state onto the undo
//! history first, so `undo` always restores exactly one operation back.
//! Booking follows a check-then-commit discipline: nothing is written until
//! every involved diary has passed validation, which is what makes
//! multi-professional bookings all-or-nothing.

use crate::diary::Diary;
use crate::resources::build_default_resources;
use crate::types::{Appointment, Professional, Resource, Task, TimeSlot};
use crate::undo::{SchedulerMemento, UndoManager};
use chrono::{Duration as TimeDelta, NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Working day scanned by the slot search: 09:00-17:00 in 30-minute steps.
const WORKING_DAY_START_HOUR: u32 = 9;
const WORKING_DAY_END_HOUR: u32 = 17;
const SLOT_STEP_MINUTES: i64 = 30;

fn working_day_start() -> NaiveTime {
    NaiveTime::from_hms_opt(WORKING_DAY_START_HOUR, 0, 0).expect("valid working-day start")
}

fn working_day_end() -> NaiveTime {
    NaiveTime::from_hms_opt(WORKING_DAY_END_HOUR, 0, 0).expect("valid working-day end")
}

/// Schedules appointments and tasks across professionals sharing a pool of
/// bookable resources.
#[derive(Debug)]
pub struct Scheduler {
    diaries: BTreeMap<Professional, Diary>,
    shared_resources: Vec<Resource>,
    undo_manager: UndoManager,
    last_search_duration: Option<Duration>,
}

impl Scheduler {
    /// A scheduler pre-seeded with the built-in resource pool.
    pub fn new() -> Self {
        Self::with_resources(build_default_resources())
    }

    /// A scheduler seeded with an arbitrary resource pool (possibly empty).
    ///
    /// Seeding is construction data, not user mutation: no undo points are
    /// recorded, so a fresh scheduler has nothing to undo.
    pub fn with_resources(seed: Vec<Resource>) -> Self {
        Self {
            diaries: BTreeMap::new(),
            shared_resources: seed,
            undo_manager: UndoManager::new(),
            last_search_duration: None,
        }
    }

    /// Assembles a scheduler from already-built state, with empty history.
    /// Used by the persistence gateway after a fully successful load.
    pub(crate) fn from_parts(
        diaries: BTreeMap<Professional, Diary>,
        shared_resources: Vec<Resource>,
    ) -> Self {
        Self {
            diaries,
            shared_resources,
            undo_manager: UndoManager::new(),
            last_search_duration: None,
        }
    }

    // ========================================================================
    // Professionals and resources
    // ========================================================================

    /// Adds a professional with a fresh empty diary.
    ///
    /// No-op, recording no undo point, if the professional is already present
    /// by value equality. Returns whether an insertion happened.
    pub fn add_health_professional(&mut self, professional: Professional) -> bool {
        if self.diaries.contains_key(&professional) {
            return false;
        }
        self.save_undo_point();
        tracing::info!(professional = %professional, "added health professional");
        self.diaries
            .insert(professional.clone(), Diary::new(professional));
        true
    }

    /// Removes a professional and their diary. False if absent.
    pub fn remove_health_professional(&mut self, professional: &Professional) -> bool {
        if !self.diaries.contains_key(professional) {
            return false;
        }
        self.save_undo_point();
        self.diaries.remove(professional);
        tracing::info!(professional = %professional, "removed health professional");
        true
    }

    pub fn diary(&self, professional: &Professional) -> Option<&Diary> {
        self.diaries.get(professional)
    }

    /// All professionals, in deterministic (sorted) order.
    pub fn professionals(&self) -> Vec<&Professional> {
        self.diaries.keys().collect()
    }

    pub fn add_shared_resource(&mut self, resource: Resource) {
        self.save_undo_point();
        tracing::info!(resource = %resource, "added shared resource");
        self.shared_resources.push(resource);
    }

    pub fn shared_resources(&self) -> &[Resource] {
        &self.shared_resources
    }

    // ========================================================================
    // Booking
    // ========================================================================

    /// Books one appointment into every listed professional's diary.
    ///
    /// Two-phase commit: phase 1 checks availability in every diary (a
    /// missing diary counts as unavailable) and aborts with no state change
    /// and no undo point on any failure; phase 2 snapshots once and commits
    /// to every diary. Never partially booked.
    pub fn book_appointment(
        &mut self,
        professionals: &[Professional],
        appointment: &Appointment,
    ) -> bool {
        for professional in professionals {
            let available = self.diaries.get(professional).is_some_and(|diary| {
                diary.is_slot_available(
                    appointment.date,
                    appointment.start_time,
                    appointment.end_time,
                    appointment.resource.as_ref(),
                )
            });
            if !available {
                tracing::info!(
                    professional = %professional,
                    appointment = %appointment,
                    "booking rejected: slot unavailable"
                );
                return false;
            }
        }

        self.save_undo_point();
        for professional in professionals {
            if let Some(diary) = self.diaries.get_mut(professional) {
                if !diary.add_appointment(appointment.clone()) {
                    // Only reachable when a professional is listed twice for
                    // a resource-bearing appointment; the first entry won.
                    tracing::warn!(
                        professional = %professional,
                        "duplicate booking entry ignored"
                    );
                }
            }
        }
        tracing::info!(parties = professionals.len(), appointment = %appointment, "booked appointment");
        true
    }

    /// Books a recurring series into every listed professional's diary.
    ///
    /// Same check-then-commit discipline as [`Scheduler::book_appointment`]:
    /// every diary must pass a dry run of the full series before anything is
    /// written or snapshotted. Should a commit still fail (a professional
    /// listed twice with a resource-bearing series), the already-committed
    /// diaries are rolled back and the useless undo point is discarded.
    pub fn book_recurring_appointment(
        &mut self,
        professionals: &[Professional],
        base: &Appointment,
        interval_days: u32,
        occurrences: u32,
    ) -> bool {
        for professional in professionals {
            let available = self.diaries.get(professional).is_some_and(|diary| {
                diary.is_recurring_slot_available(base, interval_days, occurrences)
            });
            if !available {
                tracing::info!(
                    professional = %professional,
                    "recurring booking rejected: series unavailable"
                );
                return false;
            }
        }

        self.save_undo_point();
        for (index, professional) in professionals.iter().enumerate() {
            let committed = self
                .diaries
                .get_mut(professional)
                .is_some_and(|diary| diary.add_recurring_appointment(base, interval_days, occurrences));
            if !committed {
                for previous in &professionals[..index] {
                    if let Some(diary) = self.diaries.get_mut(previous) {
                        diary.rollback_recurring_appointments(base, interval_days, occurrences);
                    }
                }
                let _ = self.undo_manager.pop();
                tracing::warn!(
                    professional = %professional,
                    "recurring booking rolled back at commit"
                );
                return false;
            }
        }
        tracing::info!(
            parties = professionals.len(),
            occurrences,
            interval_days,
            "booked recurring appointment"
        );
        true
    }

    // ========================================================================
    // Slot search
    // ========================================================================

    /// Finds every slot in `[start_date, end_date]` where all listed
    /// professionals and all requested resources are free.
    ///
    /// Brute-force scan over the working day (09:00-17:00, 30-minute steps,
    /// `start + duration <= 17:00`). Professionals are checked first, with no
    /// resource attached; only when all are clear is each requested resource
    /// checked across every diary system-wide. A requested professional with
    /// no diary yields no slots. Results are chronological, date-major.
    pub fn find_available_slots(
        &mut self,
        professionals: &[Professional],
        resources: &[Resource],
        start_date: NaiveDate,
        end_date: NaiveDate,
        duration_minutes: u32,
    ) -> Vec<TimeSlot> {
        let started = Instant::now();
        let duration = TimeDelta::minutes(i64::from(duration_minutes));
        let mut slots = Vec::new();

        let mut date = start_date;
        while date <= end_date {
            let mut slot_start = working_day_start();
            while slot_start < working_day_end() {
                let (slot_end, wrapped) = slot_start.overflowing_add_signed(duration);
                if wrapped != 0 || slot_end > working_day_end() {
                    // The duration no longer fits anywhere in this day.
                    break;
                }
                if self.slot_clear(professionals, resources, date, slot_start, slot_end) {
                    slots.push(TimeSlot::new(date, slot_start, slot_end));
                }
                slot_start += TimeDelta::minutes(SLOT_STEP_MINUTES);
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        let elapsed = started.elapsed();
        self.last_search_duration = Some(elapsed);
        tracing::debug!(
            slots = slots.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "slot search finished"
        );
        slots
    }

    fn slot_clear(
        &self,
        professionals: &[Professional],
        resources: &[Resource],
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> bool {
        for professional in professionals {
            let free = self
                .diaries
                .get(professional)
                .is_some_and(|diary| diary.is_slot_available(date, start_time, end_time, None));
            if !free {
                return false;
            }
        }
        // Resources are shared: a requested resource must be free in every
        // diary, not just those of the requested professionals.
        for resource in resources {
            let free_everywhere = self
                .diaries
                .values()
                .all(|diary| diary.is_slot_available(date, start_time, end_time, Some(resource)));
            if !free_everywhere {
                return false;
            }
        }
        true
    }

    /// Wall-clock duration of the most recent slot search.
    pub fn last_search_duration(&self) -> Option<Duration> {
        self.last_search_duration
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Adds a task to a professional's diary, under an undo point.
    ///
    /// False for an unknown professional. Task addition goes through the
    /// scheduler so it participates in undo like every other mutation.
    pub fn add_task(&mut self, professional: &Professional, task: Task) -> bool {
        if !self.diaries.contains_key(professional) {
            return false;
        }
        self.save_undo_point();
        if let Some(diary) = self.diaries.get_mut(professional) {
            diary.add_task(task);
        }
        true
    }

    // ========================================================================
    // Undo
    // ========================================================================

    /// Restores the state before the most recent committed mutation.
    ///
    /// False, changing nothing, when the history is empty.
    pub fn undo(&mut self) -> bool {
        match self.undo_manager.pop() {
            Some(memento) => {
                let (diaries, shared_resources) = memento.into_state();
                self.diaries = diaries;
                self.shared_resources = shared_resources;
                tracing::info!(remaining = self.undo_manager.len(), "restored previous state");
                true
            }
            None => {
                tracing::info!("undo requested with empty history");
                false
            }
        }
    }

    /// Number of operations that can currently be undone.
    pub fn undo_depth(&self) -> usize {
        self.undo_manager.len()
    }

    fn save_undo_point(&mut self) {
        let memento = SchedulerMemento::capture(&self.diaries, &self.shared_resources);
        self.undo_manager.save(memento);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskPriority;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn dr_adams() -> Professional {
        Professional::new("Dr. Adams", "Surgeon", "Main Hospital")
    }

    fn dr_brown() -> Professional {
        Professional::new("Dr. Brown", "Radiologist", "Radiology Department")
    }

    fn mri() -> Resource {
        Resource::new("MRI Scanner 1", "MRI Scanner", "Radiology Department")
    }

    fn scan(day: u32, start: NaiveTime, end: NaiveTime) -> Appointment {
        Appointment::new(date(day), start, end, "MRI Scan", "Alice Smith", false, Some(mri()))
    }

    fn scheduler_with(professionals: &[Professional]) -> Scheduler {
        let mut scheduler = Scheduler::new();
        for professional in professionals {
            scheduler.add_health_professional(professional.clone());
        }
        scheduler
    }

    #[test]
    fn test_new_scheduler_is_seeded_and_has_no_history() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.shared_resources().len(), 5);
        assert_eq!(scheduler.undo_depth(), 0);

        let unseeded = Scheduler::with_resources(Vec::new());
        assert!(unseeded.shared_resources().is_empty());
    }

    #[test]
    fn test_add_professional_is_idempotent() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.add_health_professional(dr_adams()));
        assert!(!scheduler.add_health_professional(dr_adams()));

        // The no-op recorded nothing: one undo point, one undo.
        assert_eq!(scheduler.undo_depth(), 1);
        assert!(scheduler.undo());
        assert!(scheduler.professionals().is_empty());
        assert!(!scheduler.undo());
    }

    #[test]
    fn test_booking_rejected_when_any_party_conflicts() {
        let mut scheduler = scheduler_with(&[dr_adams(), dr_brown()]);

        // Brown is already busy on the scanner in that window.
        assert!(scheduler.book_appointment(&[dr_brown()], &scan(10, time(9, 0), time(10, 0))));

        let joint = scan(10, time(9, 30), time(10, 30));
        assert!(!scheduler.book_appointment(&[dr_adams(), dr_brown()], &joint));

        // Atomicity: Adams's diary is untouched and no undo point was taken.
        assert!(scheduler.diary(&dr_adams()).unwrap().appointments().is_empty());
        assert_eq!(scheduler.undo_depth(), 3); // two adds + one booking

        // The same booking into a free window lands in both diaries.
        let later = scan(10, time(10, 0), time(11, 0));
        assert!(scheduler.book_appointment(&[dr_adams(), dr_brown()], &later));
        assert_eq!(scheduler.diary(&dr_adams()).unwrap().appointments().len(), 1);
        assert_eq!(scheduler.diary(&dr_brown()).unwrap().appointments().len(), 2);
    }

    #[test]
    fn test_booking_unknown_professional_fails() {
        let mut scheduler = scheduler_with(&[dr_adams()]);
        let stranger = Professional::new("Dr. Grey", "Doctor", "Elsewhere");

        assert!(!scheduler.book_appointment(&[dr_adams(), stranger], &scan(10, time(9, 0), time(10, 0))));
        assert!(scheduler.diary(&dr_adams()).unwrap().appointments().is_empty());
    }

    #[test]
    fn test_recurring_conflict_leaves_no_trace_in_any_diary() {
        let mut scheduler = scheduler_with(&[dr_adams(), dr_brown()]);

        // Brown's diary blocks the second occurrence of the series.
        assert!(scheduler.book_appointment(&[dr_brown()], &scan(17, time(9, 0), time(10, 0))));

        let base = scan(10, time(9, 0), time(10, 0));
        assert!(!scheduler.book_recurring_appointment(&[dr_adams(), dr_brown()], &base, 7, 3));

        assert!(scheduler.diary(&dr_adams()).unwrap().appointments().is_empty());
        assert_eq!(scheduler.diary(&dr_brown()).unwrap().appointments().len(), 1);
        // Validation failed before any snapshot was taken.
        assert_eq!(scheduler.undo_depth(), 3);
    }

    #[test]
    fn test_recurring_booking_lands_in_every_diary() {
        let mut scheduler = scheduler_with(&[dr_adams(), dr_brown()]);
        let base = scan(10, time(9, 0), time(10, 0));

        assert!(scheduler.book_recurring_appointment(&[dr_adams(), dr_brown()], &base, 7, 3));
        for professional in [dr_adams(), dr_brown()] {
            let diary = scheduler.diary(&professional).unwrap();
            assert_eq!(diary.appointments().len(), 3);
            assert!(diary.appointments().iter().all(|a| a.recurring));
        }
        assert_eq!(
            scheduler.diary(&dr_adams()).unwrap().appointments_on(date(24)).len(),
            1
        );
    }

    #[test]
    fn test_search_respects_working_hours_and_duration() {
        let mut scheduler = scheduler_with(&[dr_adams()]);
        let slots = scheduler.find_available_slots(
            &[dr_adams()],
            &[],
            date(10),
            date(11),
            60,
        );

        // 09:00..16:00 starts on each of the two days.
        assert_eq!(slots.len(), 30);
        assert!(slots.iter().all(|slot| {
            slot.start_time >= time(9, 0)
                && slot.end_time <= time(17, 0)
                && slot.date >= date(10)
                && slot.date <= date(11)
        }));
        // Chronological order, date-major.
        assert_eq!(slots[0].date, date(10));
        assert_eq!(slots[0].start_time, time(9, 0));
        assert_eq!(slots.last().unwrap().date, date(11));
        assert_eq!(slots.last().unwrap().start_time, time(16, 0));

        assert!(scheduler.last_search_duration().is_some());
    }

    #[test]
    fn test_search_excludes_booked_resource_windows() {
        // Professional A holds MRI Scanner 1 on 2024-06-10, 09:00-10:00. A
        // 30-minute search for A requesting that scanner must skip the 09:00
        // and 09:30 candidates but still offer 10:00 onward.
        let mut scheduler = scheduler_with(&[dr_adams()]);
        assert!(scheduler.book_appointment(&[dr_adams()], &scan(10, time(9, 0), time(10, 0))));

        let slots = scheduler.find_available_slots(&[dr_adams()], &[mri()], date(10), date(10), 30);

        assert!(!slots.iter().any(|s| s.start_time == time(9, 0)));
        assert!(!slots.iter().any(|s| s.start_time == time(9, 30)));
        assert_eq!(slots[0].start_time, time(10, 0));
        // 16 half-hour candidates per day, minus the two blocked ones.
        assert_eq!(slots.len(), 14);
    }

    #[test]
    fn test_search_checks_resources_across_all_diaries() {
        // Brown holds the scanner; a search for Adams requesting it must
        // still see the clash even though Adams's own diary is empty.
        let mut scheduler = scheduler_with(&[dr_adams(), dr_brown()]);
        assert!(scheduler.book_appointment(&[dr_brown()], &scan(10, time(9, 0), time(10, 0))));

        let slots = scheduler.find_available_slots(&[dr_adams()], &[mri()], date(10), date(10), 30);
        assert!(!slots.iter().any(|s| s.start_time < time(10, 0)));
    }

    #[test]
    fn test_search_for_unknown_professional_finds_nothing() {
        let mut scheduler = Scheduler::new();
        let slots = scheduler.find_available_slots(
            &[dr_adams()],
            &[],
            date(10),
            date(10),
            30,
        );
        assert!(slots.is_empty());
    }

    #[test]
    fn test_search_with_oversized_duration_finds_nothing() {
        let mut scheduler = scheduler_with(&[dr_adams()]);
        // 9 hours can never fit into an 8-hour working day.
        let slots = scheduler.find_available_slots(&[dr_adams()], &[], date(10), date(10), 540);
        assert!(slots.is_empty());
    }

    #[test]
    fn test_undo_restores_booking() {
        let mut scheduler = scheduler_with(&[dr_adams()]);
        assert!(scheduler.book_appointment(&[dr_adams()], &scan(10, time(9, 0), time(10, 0))));
        assert_eq!(scheduler.diary(&dr_adams()).unwrap().appointments().len(), 1);

        assert!(scheduler.undo());
        assert!(scheduler.diary(&dr_adams()).unwrap().appointments().is_empty());
        // The professional themselves came from an earlier mutation.
        assert_eq!(scheduler.professionals().len(), 1);
    }

    #[test]
    fn test_undo_restores_removed_professional_with_diary_contents() {
        let mut scheduler = scheduler_with(&[dr_adams()]);
        assert!(scheduler.book_appointment(&[dr_adams()], &scan(10, time(9, 0), time(10, 0))));

        assert!(scheduler.remove_health_professional(&dr_adams()));
        assert!(scheduler.diary(&dr_adams()).is_none());

        assert!(scheduler.undo());
        let diary = scheduler.diary(&dr_adams()).expect("professional restored");
        assert_eq!(diary.appointments().len(), 1);
    }

    #[test]
    fn test_undo_restores_resource_list() {
        let mut scheduler = Scheduler::with_resources(Vec::new());
        scheduler.add_shared_resource(mri());
        assert_eq!(scheduler.shared_resources().len(), 1);

        assert!(scheduler.undo());
        assert!(scheduler.shared_resources().is_empty());
    }

    #[test]
    fn test_repeated_undo_walks_history_back() {
        let mut scheduler = scheduler_with(&[dr_adams()]);
        assert!(scheduler.book_appointment(&[dr_adams()], &scan(10, time(9, 0), time(10, 0))));
        assert!(scheduler.book_appointment(&[dr_adams()], &scan(10, time(10, 0), time(11, 0))));

        assert!(scheduler.undo());
        assert_eq!(scheduler.diary(&dr_adams()).unwrap().appointments().len(), 1);
        assert!(scheduler.undo());
        assert!(scheduler.diary(&dr_adams()).unwrap().appointments().is_empty());
        assert!(scheduler.undo()); // the add itself
        assert!(scheduler.professionals().is_empty());
        assert!(!scheduler.undo());
    }

    #[test]
    fn test_add_task_participates_in_undo() {
        let mut scheduler = scheduler_with(&[dr_adams()]);
        assert!(scheduler.add_task(&dr_adams(), Task::new("Review charts", TaskPriority::High)));
        assert_eq!(scheduler.diary(&dr_adams()).unwrap().tasks().len(), 1);

        assert!(scheduler.undo());
        assert!(scheduler.diary(&dr_adams()).unwrap().tasks().is_empty());

        let stranger = Professional::new("Dr. Grey", "Doctor", "Elsewhere");
        assert!(!scheduler.add_task(&stranger, Task::new("Lost task", TaskPriority::Low)));
    }

    #[test]
    fn test_remove_absent_professional_records_nothing() {
        let mut scheduler = Scheduler::new();
        assert!(!scheduler.remove_health_professional(&dr_adams()));
        assert_eq!(scheduler.undo_depth(), 0);
    }
}

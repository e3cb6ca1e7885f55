//! Per-professional diary of appointments and tasks.
//!
//! A diary owns the appointments and tasks of exactly one professional and
//! performs the local conflict checking behind every booking: slot
//! availability probes, dry-run-then-commit recurring additions, and the
//! rollback used when a multi-professional recurring booking fails partway.

use crate::types::{Appointment, Professional, Resource, Task};
use chrono::{Days, NaiveDate, NaiveTime};

/// Appointments and tasks for a single health professional.
///
/// Both sequences keep insertion order. The diary is created when its owner
/// is added to the scheduler and dropped when the owner is removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diary {
    owner: Professional,
    appointments: Vec<Appointment>,
    tasks: Vec<Task>,
}

impl Diary {
    pub fn new(owner: Professional) -> Self {
        Self {
            owner,
            appointments: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn owner(&self) -> &Professional {
        &self.owner
    }

    /// Whether a hypothetical appointment at the given date/time/resource
    /// would conflict with anything already in this diary.
    ///
    /// The check applies the overlap rule, so it is resource-collision
    /// detection rather than a general double-booking guard: with no
    /// resource requested nothing can conflict, and any number of
    /// resource-less appointments fit into the same time slot.
    pub fn is_slot_available(
        &self,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        resource: Option<&Resource>,
    ) -> bool {
        !self
            .appointments
            .iter()
            .any(|existing| existing.conflicts_with(date, start_time, end_time, resource))
    }

    /// Adds an appointment after re-validating availability.
    ///
    /// Returns false, leaving the diary untouched, if the slot is taken.
    pub fn add_appointment(&mut self, appointment: Appointment) -> bool {
        if !self.is_slot_available(
            appointment.date,
            appointment.start_time,
            appointment.end_time,
            appointment.resource.as_ref(),
        ) {
            return false;
        }
        self.appointments.push(appointment);
        true
    }

    /// Removes the first appointment equal to `appointment`.
    pub fn remove_appointment(&mut self, appointment: &Appointment) -> bool {
        match self.appointments.iter().position(|a| a == appointment) {
            Some(index) => {
                self.appointments.remove(index);
                true
            }
            None => false,
        }
    }

    /// Dry run of a full recurring series against this diary.
    ///
    /// Each occurrence is checked against existing appointments only, not
    /// against its sibling occurrences. A date that overflows the calendar
    /// counts as a conflict.
    pub fn is_recurring_slot_available(
        &self,
        base: &Appointment,
        interval_days: u32,
        occurrences: u32,
    ) -> bool {
        match occurrence_dates(base.date, interval_days, occurrences) {
            Some(dates) => dates.iter().all(|&date| {
                self.is_slot_available(
                    date,
                    base.start_time,
                    base.end_time,
                    base.resource.as_ref(),
                )
            }),
            None => false,
        }
    }

    /// Adds `occurrences` appointments at `base.date + i * interval_days`.
    ///
    /// All-or-nothing: every generated occurrence is validated before any is
    /// appended, and each carries the recurring flag.
    pub fn add_recurring_appointment(
        &mut self,
        base: &Appointment,
        interval_days: u32,
        occurrences: u32,
    ) -> bool {
        let Some(dates) = occurrence_dates(base.date, interval_days, occurrences) else {
            return false;
        };

        let all_available = dates.iter().all(|&date| {
            self.is_slot_available(date, base.start_time, base.end_time, base.resource.as_ref())
        });
        if !all_available {
            tracing::debug!(owner = %self.owner, "recurring series rejected: occurrence conflict");
            return false;
        }

        self.appointments.extend(dates.into_iter().map(|date| Appointment {
            date,
            recurring: true,
            ..base.clone()
        }));
        true
    }

    /// Removes appointments matching the generated series of `base`.
    ///
    /// Matching is by (date, start, end, patient) tuple; used to undo the
    /// already-committed diaries of a failed multi-professional recurring
    /// booking.
    pub fn rollback_recurring_appointments(
        &mut self,
        base: &Appointment,
        interval_days: u32,
        occurrences: u32,
    ) {
        let Some(dates) = occurrence_dates(base.date, interval_days, occurrences) else {
            return;
        };

        self.appointments.retain(|appointment| {
            !(dates.contains(&appointment.date)
                && appointment.start_time == base.start_time
                && appointment.end_time == base.end_time
                && appointment.patient_name == base.patient_name)
        });
    }

    /// All appointments on a given date, in insertion order.
    pub fn appointments_on(&self, date: NaiveDate) -> Vec<Appointment> {
        self.appointments
            .iter()
            .filter(|appointment| appointment.date == date)
            .cloned()
            .collect()
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}

/// Dates of a recurring series, or None if one falls off the calendar.
fn occurrence_dates(
    base_date: NaiveDate,
    interval_days: u32,
    occurrences: u32,
) -> Option<Vec<NaiveDate>> {
    (0..occurrences)
        .map(|i| base_date.checked_add_days(Days::new(u64::from(i) * u64::from(interval_days))))
        .collect()
}

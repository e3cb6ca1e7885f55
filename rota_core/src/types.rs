//! Core domain types for the Rota scheduling system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Health professionals and bookable resources (value-identity records)
//! - Appointments and the overlap rule that defines booking conflicts
//! - Diary tasks and their priorities
//! - Time slots produced by availability search

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Professionals
// ============================================================================

/// A health professional.
///
/// Identity is by value: two professionals with the same name, profession and
/// office location are the same diary key. The scheduler owns its keys, so a
/// professional can never be mutated while it is in use as one; an "update"
/// is a remove followed by a reinsert.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Professional {
    pub name: String,
    pub profession: String,
    pub office_location: String,
}

impl Professional {
    pub fn new(
        name: impl Into<String>,
        profession: impl Into<String>,
        office_location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            profession: profession.into(),
            office_location: office_location.into(),
        }
    }
}

impl fmt::Display for Professional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - {}",
            self.name, self.profession, self.office_location
        )
    }
}

// ============================================================================
// Resources
// ============================================================================

/// A bookable resource such as an operating theatre or an MRI scanner.
///
/// Same value-identity contract as [`Professional`]: equality and hashing
/// cover all three fields.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Resource {
    pub name: String,
    /// Resource category, e.g. "Operating Theatre" or "MRI Scanner".
    pub kind: String,
    pub location: String,
}

impl Resource {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - {}", self.name, self.kind, self.location)
    }
}

// ============================================================================
// Appointments
// ============================================================================

/// A booked or candidate appointment.
///
/// Times are naive local values; the caller guarantees `start_time < end_time`
/// (the entity does not re-validate ordering).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub treatment_type: String,
    pub patient_name: String,
    pub recurring: bool,
    /// Resource booked for this appointment, if any.
    pub resource: Option<Resource>,
}

impl Appointment {
    pub fn new(
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        treatment_type: impl Into<String>,
        patient_name: impl Into<String>,
        recurring: bool,
        resource: Option<Resource>,
    ) -> Self {
        Self {
            date,
            start_time,
            end_time,
            treatment_type: treatment_type.into(),
            patient_name: patient_name.into(),
            recurring,
            resource,
        }
    }

    /// The overlap rule: two appointments conflict iff they fall on the same
    /// date, their half-open time ranges intersect, and both sides are booked
    /// onto the same resource (by value).
    ///
    /// Appointments with no resource, or with different resources, never
    /// conflict under this rule regardless of time overlap.
    pub fn overlaps_with(&self, other: &Appointment) -> bool {
        self.conflicts_with(
            other.date,
            other.start_time,
            other.end_time,
            other.resource.as_ref(),
        )
    }

    /// Overlap rule against a hypothetical slot rather than a built
    /// appointment.
    pub(crate) fn conflicts_with(
        &self,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        resource: Option<&Resource>,
    ) -> bool {
        if self.date != date {
            return false;
        }

        let time_overlap = self.start_time < end_time && self.end_time > start_time;

        let resource_conflict = match (self.resource.as_ref(), resource) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => false,
        };

        time_overlap && resource_conflict
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Appointment for {} on {} from {} to {} ({})",
            self.patient_name, self.date, self.start_time, self.end_time, self.treatment_type
        )?;
        if let Some(resource) = &self.resource {
            write!(f, " using {}", resource.name)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tasks
// ============================================================================

/// Priority of a diary task.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskPriority::High => "High",
            TaskPriority::Medium => "Medium",
            TaskPriority::Low => "Low",
        };
        f.write_str(label)
    }
}

/// A free-text task on a professional's diary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub description: String,
    pub priority: TaskPriority,
}

impl Task {
    pub fn new(description: impl Into<String>, priority: TaskPriority) -> Self {
        Self {
            description: description.into(),
            priority,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Priority: {})", self.description, self.priority)
    }
}

// ============================================================================
// Time slots
// ============================================================================

/// An availability window found by slot search.
///
/// A pure value: not linked to any appointment or diary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            date,
            start_time,
            end_time,
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} to {}", self.date, self.start_time, self.end_time)
    }
}

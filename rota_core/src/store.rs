//! Persistence gateway for scheduler state.
//!
//! The whole scheduler - professionals with their diaries, plus the shared
//! resource pool - is written as a single JSON document. Writes go through
//! a temp file and an atomic rename under an exclusive lock; reads take a
//! shared lock. A load either produces a complete new [`Scheduler`] or an
//! error: it can never half-mutate live state.

use crate::diary::Diary;
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;
use crate::types::{Appointment, Professional, Resource, Task};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Serialized form of one professional and their diary.
#[derive(Debug, Serialize, Deserialize)]
struct DiaryRecord {
    professional: Professional,
    appointments: Vec<Appointment>,
    tasks: Vec<Task>,
}

/// Serialized form of the whole scheduler.
#[derive(Debug, Serialize, Deserialize)]
struct SchedulerRecord {
    professionals: Vec<DiaryRecord>,
    shared_resources: Vec<Resource>,
}

/// Save scheduler state to a file.
///
/// Atomically writes by:
/// 1. Writing to a temp file in the same directory
/// 2. Syncing to disk
/// 3. Renaming over the original
pub fn save_to_file(scheduler: &Scheduler, path: &Path) -> Result<()> {
    let record = SchedulerRecord {
        professionals: scheduler
            .professionals()
            .into_iter()
            .filter_map(|professional| {
                scheduler.diary(professional).map(|diary| DiaryRecord {
                    professional: diary.owner().clone(),
                    appointments: diary.appointments().to_vec(),
                    tasks: diary.tasks().to_vec(),
                })
            })
            .collect(),
        shared_resources: scheduler.shared_resources().to_vec(),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Unique temp file in the same directory for atomic rename
    let temp = NamedTempFile::new_in(
        path.parent()
            .ok_or_else(|| Error::Persistence("state path has no parent directory".into()))?,
    )?;

    // Exclusive lock on the temp file to serialize concurrent writers
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(&record)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved scheduler state to {:?}", path);
    Ok(())
}

/// Load scheduler state from a file.
///
/// The document is parsed and a complete scheduler is assembled before
/// anything is returned; the result carries an empty undo history. A record
/// that conflicts with an earlier one (possible only in a hand-edited file)
/// is dropped with a warning, mirroring what re-validation on insert does.
pub fn load_from_file(path: &Path) -> Result<Scheduler> {
    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    let read_result = reader.read_to_string(&mut contents);
    file.unlock()?;
    read_result?;

    let record: SchedulerRecord = serde_json::from_str(&contents)?;

    let mut diaries = BTreeMap::new();
    for entry in record.professionals {
        let mut diary = Diary::new(entry.professional.clone());
        for appointment in entry.appointments {
            if !diary.add_appointment(appointment.clone()) {
                tracing::warn!(
                    professional = %entry.professional,
                    appointment = %appointment,
                    "dropped conflicting appointment from state file"
                );
            }
        }
        for task in entry.tasks {
            diary.add_task(task);
        }
        if diaries.insert(entry.professional.clone(), diary).is_some() {
            tracing::warn!(
                professional = %entry.professional,
                "state file repeats a professional; later entry wins"
            );
        }
    }

    let scheduler = Scheduler::from_parts(diaries, record.shared_resources);
    tracing::debug!(
        professionals = scheduler.professionals().len(),
        "Loaded scheduler state from {:?}",
        path
    );
    Ok(scheduler)
}

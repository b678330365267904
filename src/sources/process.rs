//! Process table source and the display-budget merge rule

use super::SampleError;
use crate::core::constants::{BYTES_PER_GB, BYTES_PER_MB};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System, Uid};

/// One row of the diagnostic list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub name: String,
    /// Identity key for deduplication across the two lists.
    pub pid: u32,
    /// Secondary readout, the formatted memory figure.
    pub label: String,
}

/// Two ranked views of the process table, published together.
///
/// `session` holds the current user's processes, `system` the whole table;
/// both are ranked by memory use, descending. The same pid can appear in
/// both lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessSnapshot {
    pub session: Vec<ProcessEntry>,
    pub system: Vec<ProcessEntry>,
}

impl ProcessSnapshot {
    /// Merge the two lists into at most `budget` display rows.
    ///
    /// Session entries get the slots the system list leaves free; system
    /// entries then fill up to the budget, skipping pids the session rows
    /// already show. Dropped duplicates are not backfilled, so the result
    /// can be shorter than the budget.
    pub fn display_rows(&self, budget: usize) -> Vec<ProcessEntry> {
        let head = budget.saturating_sub(self.system.len()).min(self.session.len());
        let mut shown: Vec<u32> = Vec::with_capacity(head);
        let mut rows = Vec::with_capacity(budget.min(head + self.system.len()));

        for entry in &self.session[..head] {
            shown.push(entry.pid);
            rows.push(entry.clone());
        }
        for entry in self.system.iter().take(budget) {
            if !shown.contains(&entry.pid) {
                rows.push(entry.clone());
            }
        }
        rows
    }
}

/// Reads the process table via sysinfo.
pub struct ProcessSource {
    system: System,
    current_user: Option<Uid>,
}

impl ProcessSource {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
        );
        Self {
            system,
            current_user: None,
        }
    }

    /// Collect a fresh snapshot of both process lists.
    pub fn read(&mut self) -> Result<ProcessSnapshot, SampleError> {
        self.system.refresh_processes(ProcessesToUpdate::All);

        if self.current_user.is_none() {
            let pid = sysinfo::get_current_pid().map_err(|e| SampleError::Read(e.to_string()))?;
            self.current_user = self
                .system
                .process(pid)
                .and_then(|process| process.user_id().cloned());
        }

        let mut ranked: Vec<_> = self.system.processes().values().collect();
        ranked.sort_by(|a, b| b.memory().cmp(&a.memory()));

        let mut session = Vec::new();
        let mut all = Vec::new();
        for process in ranked {
            let entry = ProcessEntry {
                name: process.name().to_string_lossy().into_owned(),
                pid: process.pid().as_u32(),
                label: format_memory(process.memory()),
            };
            if self.current_user.is_some() && process.user_id() == self.current_user.as_ref() {
                session.push(entry.clone());
            }
            all.push(entry);
        }

        Ok(ProcessSnapshot {
            session,
            system: all,
        })
    }
}

impl Default for ProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

fn format_memory(bytes: u64) -> String {
    let bytes = bytes as f64;
    if bytes >= BYTES_PER_GB {
        format!("{:.1} GB", bytes / BYTES_PER_GB)
    } else {
        format!("{:.0} MB", bytes / BYTES_PER_MB)
    }
}

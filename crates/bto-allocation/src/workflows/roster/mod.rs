//! CSV roster import. People and projects are applied through the coordinator's public
//! operations so seeded data passes the same validation as live requests.

mod parser;

use crate::workflows::allocation::{AllocationCoordinator, AllocationError, PersonId};
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, message: String },
    Allocation { line: u64, source: AllocationError },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::InvalidRow { line, message } => {
                write!(f, "row {}: {}", line, message)
            }
            RosterImportError::Allocation { line, source } => {
                write!(f, "row {} was refused: {}", line, source)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::InvalidRow { .. } => None,
            RosterImportError::Allocation { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Counts of what an import applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterSummary {
    pub persons: usize,
    pub projects: usize,
    pub managers_assigned: usize,
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        coordinator: &mut AllocationCoordinator,
        people: P,
        projects: Q,
    ) -> Result<RosterSummary, RosterImportError> {
        let people = std::fs::File::open(people)?;
        let projects = std::fs::File::open(projects)?;
        Self::from_readers(coordinator, people, projects)
    }

    /// People are applied before projects so manager columns can resolve. Rows applied
    /// before a failing row stay applied.
    pub fn from_readers<P: Read, Q: Read>(
        coordinator: &mut AllocationCoordinator,
        people: P,
        projects: Q,
    ) -> Result<RosterSummary, RosterImportError> {
        let mut summary = RosterSummary::default();

        for record in parser::parse_people(people)? {
            let line = record.line;
            coordinator
                .register_person(record.person)
                .map_err(|source| RosterImportError::Allocation { line, source })?;
            summary.persons += 1;
        }

        for record in parser::parse_projects(projects)? {
            let line = record.line;
            let refused = |source| RosterImportError::Allocation { line, source };

            let project = coordinator.intake_project(record.draft).map_err(refused)?;
            summary.projects += 1;

            if let Some(raw) = record.manager {
                let manager = PersonId::parse(&raw)
                    .ok_or_else(|| refused(AllocationError::InvalidPersonId(raw.clone())))?;
                coordinator
                    .assign_manager(&manager, &project.name)
                    .map_err(refused)?;
                summary.managers_assigned += 1;
            }
        }

        info!(
            persons = summary.persons,
            projects = summary.projects,
            managers_assigned = summary.managers_assigned,
            "roster imported"
        );
        Ok(summary)
    }
}

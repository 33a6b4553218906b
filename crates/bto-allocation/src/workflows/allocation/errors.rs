use chrono::NaiveDate;
use serde::Serialize;

use super::conflict::ConflictError;
use super::domain::{ApplicationId, ApplicationStatus, PersonId, ProjectName, Role, UnitCategory};
use super::eligibility::DenialReason;
use super::inventory::InventoryError;
use super::lifecycle::TransitionError;

/// Every way an allocation operation can be refused. Nothing here is fatal; callers report
/// the error and may retry once the triggering condition changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error(transparent)]
    Denied(#[from] DenialReason),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error("{person} already holds active application {application}")]
    DuplicateActiveApplication {
        person: PersonId,
        application: ApplicationId,
    },
    #[error("no {category} units remain in {project}")]
    NoUnitsAvailable {
        project: ProjectName,
        category: UnitCategory,
    },
    #[error("all {capacity} officer slots in {project} are taken")]
    SlotsFull {
        project: ProjectName,
        capacity: usize,
    },
    #[error("application {application} is {status}, not BOOKED")]
    NotBooked {
        application: ApplicationId,
        status: ApplicationStatus,
    },
    #[error("unknown person {0}")]
    UnknownPerson(PersonId),
    #[error("unknown project {0}")]
    UnknownProject(ProjectName),
    #[error("unknown application {0}")]
    UnknownApplication(ApplicationId),
    #[error("{0} is already registered")]
    DuplicatePerson(PersonId),
    #[error("a project named {0} already exists")]
    DuplicateProject(ProjectName),
    #[error("{person} does not hold the {role} role")]
    MissingRole { person: PersonId, role: Role },
    #[error("{actor} is not the manager in charge of {project}")]
    NotProjectManager {
        actor: PersonId,
        project: ProjectName,
    },
    #[error("{actor} is not an assigned officer of {project}")]
    NotProjectOfficer {
        actor: PersonId,
        project: ProjectName,
    },
    #[error("{actor} does not own application {application}")]
    NotApplicationOwner {
        actor: PersonId,
        application: ApplicationId,
    },
    #[error("'{0}' is not a valid identity number")]
    InvalidPersonId(String),
    #[error("closing date {closing} precedes opening date {opening}")]
    InvalidWindow {
        opening: NaiveDate,
        closing: NaiveDate,
    },
    #[error("{0}")]
    InvalidInput(String),
}

/// Coarse classification used by collaborators to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PolicyDenial,
    StateConflict,
    ResourceExhaustion,
    AssignmentConflict,
    NotFound,
    Forbidden,
    InvalidInput,
}

impl AllocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AllocationError::Denied(_) => ErrorKind::PolicyDenial,
            AllocationError::Transition(_)
            | AllocationError::DuplicateActiveApplication { .. }
            | AllocationError::NotBooked { .. }
            | AllocationError::DuplicatePerson(_)
            | AllocationError::DuplicateProject(_) => ErrorKind::StateConflict,
            AllocationError::Inventory(InventoryError::Underflow { .. })
            | AllocationError::NoUnitsAvailable { .. }
            | AllocationError::SlotsFull { .. } => ErrorKind::ResourceExhaustion,
            AllocationError::Conflict(_) => ErrorKind::AssignmentConflict,
            AllocationError::UnknownPerson(_)
            | AllocationError::UnknownProject(_)
            | AllocationError::UnknownApplication(_) => ErrorKind::NotFound,
            AllocationError::MissingRole { .. }
            | AllocationError::NotProjectManager { .. }
            | AllocationError::NotProjectOfficer { .. }
            | AllocationError::NotApplicationOwner { .. } => ErrorKind::Forbidden,
            AllocationError::Inventory(InventoryError::UnknownCategory { .. })
            | AllocationError::InvalidPersonId(_)
            | AllocationError::InvalidWindow { .. }
            | AllocationError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// Stable machine-readable code for the specific failure.
    pub fn code(&self) -> &'static str {
        match self {
            AllocationError::Denied(reason) => match reason {
                DenialReason::ProjectNotOpen { .. } => "project_not_open",
                DenialReason::CategoryNotOffered { .. } => "category_not_offered",
                DenialReason::IneligibleSingle { .. } => "ineligible_single",
                DenialReason::IneligibleMarried { .. } => "ineligible_married",
            },
            AllocationError::Transition(error) => match error {
                TransitionError::IllegalWithdrawal { .. } => "illegal_withdrawal",
                TransitionError::NotApproved { .. } => "not_approved",
                TransitionError::AlreadyBooked => "already_booked",
                TransitionError::InvalidTransition { .. } => "invalid_transition",
            },
            AllocationError::Inventory(error) => match error {
                InventoryError::Underflow { .. } => "underflow",
                InventoryError::UnknownCategory { .. } => "unknown_category",
            },
            AllocationError::Conflict(error) => match error {
                ConflictError::AlreadyAssignedElsewhere { .. } => "already_assigned_elsewhere",
                ConflictError::ApplicantConflict { .. } => "applicant_conflict",
                ConflictError::AlreadyRegistered { .. } => "already_registered",
                ConflictError::AlreadyPending { .. } => "already_pending",
                ConflictError::NoPendingRequest { .. } => "no_pending_request",
                ConflictError::ManagerOverlap { .. } => "manager_overlap",
                ConflictError::ManagerAlreadyAssigned { .. } => "manager_already_assigned",
            },
            AllocationError::DuplicateActiveApplication { .. } => "duplicate_active_application",
            AllocationError::NoUnitsAvailable { .. } => "no_units_available",
            AllocationError::SlotsFull { .. } => "slots_full",
            AllocationError::NotBooked { .. } => "not_booked",
            AllocationError::UnknownPerson(_) => "unknown_person",
            AllocationError::UnknownProject(_) => "unknown_project",
            AllocationError::UnknownApplication(_) => "unknown_application",
            AllocationError::DuplicatePerson(_) => "duplicate_person",
            AllocationError::DuplicateProject(_) => "duplicate_project",
            AllocationError::MissingRole { .. } => "missing_role",
            AllocationError::NotProjectManager { .. } => "not_project_manager",
            AllocationError::NotProjectOfficer { .. } => "not_project_officer",
            AllocationError::NotApplicationOwner { .. } => "not_application_owner",
            AllocationError::InvalidPersonId(_) => "invalid_person_id",
            AllocationError::InvalidWindow { .. } => "invalid_window",
            AllocationError::InvalidInput(_) => "invalid_input",
        }
    }
}

//! Housing application allocation: eligibility, role conflicts, the application lifecycle,
//! officer registration and unit inventory, coordinated behind one authority.
//!
//! [`AllocationCoordinator`] is the single-threaded engine. [`AllocationService`] wraps it in a
//! lock for shared use and forwards committed decisions to a [`NoticePublisher`].

pub mod conflict;
pub mod coordinator;
pub mod domain;
pub mod eligibility;
pub mod errors;
pub mod invariants;
pub mod inventory;
pub mod lifecycle;
pub mod notices;
pub mod router;
pub mod service;
pub mod state;
pub mod views;

#[cfg(test)]
mod tests;

pub use conflict::{overlaps, ConflictError};
pub use coordinator::AllocationCoordinator;
pub use domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationWindow, MaritalStatus, NewPerson,
    OfficerPost, OfficerStanding, Person, PersonId, Project, ProjectDraft, ProjectName, Role,
    UnitCategory, Withdrawal,
};
pub use eligibility::{DenialReason, EligibilityPolicy};
pub use errors::{AllocationError, ErrorKind};
pub use invariants::InvariantViolation;
pub use inventory::{InventoryError, UnitInventory};
pub use lifecycle::{ApplicationAction, TransitionError};
pub use notices::{AllocationNotice, NoticeError, NoticeKind, NoticePublisher};
pub use router::allocation_router;
pub use service::{AllocationService, AllocationServiceError};
pub use state::AllocationState;
pub use views::{
    BookingReceipt, EligibilityVerdict, OfficerRegistrationView, ProjectFilter, ProjectListing,
    ReportFilter, ReportRow,
};

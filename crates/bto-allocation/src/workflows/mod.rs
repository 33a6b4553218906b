pub mod allocation;
pub mod roster;

pub use roster::{RosterImportError, RosterImporter, RosterSummary};

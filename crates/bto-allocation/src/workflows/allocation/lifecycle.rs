//! Application status transitions.
//!
//! ```text
//! PENDING ──approve──▶ SUCCESSFUL ──book──▶ BOOKED
//!    │                     │
//!    ├──reject───┐         │
//!    └─withdraw──┴─▶ UNSUCCESSFUL ◀─withdraw─┘
//! ```
//!
//! UNSUCCESSFUL frees the applicant to submit again; the old application is kept.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationStatus, Withdrawal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationAction {
    Approve,
    Reject,
    Withdraw,
    Book,
    AcknowledgeWithdrawal,
}

impl ApplicationAction {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationAction::Approve => "approve",
            ApplicationAction::Reject => "reject",
            ApplicationAction::Withdraw => "withdraw",
            ApplicationAction::Book => "book",
            ApplicationAction::AcknowledgeWithdrawal => "acknowledge withdrawal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("a {status} application cannot be withdrawn")]
    IllegalWithdrawal { status: ApplicationStatus },
    #[error("a {status} application has not been approved for booking")]
    NotApproved { status: ApplicationStatus },
    #[error("the unit has already been booked")]
    AlreadyBooked,
    #[error("cannot {} a {from} application", .action.label())]
    InvalidTransition {
        from: ApplicationStatus,
        action: ApplicationAction,
    },
}

impl ApplicationStatus {
    /// Next status for `action`, or the reason the lifecycle forbids it.
    pub fn transition(self, action: ApplicationAction) -> Result<ApplicationStatus, TransitionError> {
        use ApplicationAction as A;
        use ApplicationStatus as S;

        match (self, action) {
            (S::Pending, A::Approve) => Ok(S::Successful),
            (S::Pending, A::Reject) => Ok(S::Unsuccessful),
            (S::Pending | S::Successful, A::Withdraw) => Ok(S::Unsuccessful),
            (S::Booked | S::Unsuccessful, A::Withdraw) => {
                Err(TransitionError::IllegalWithdrawal { status: self })
            }
            (S::Successful, A::Book) => Ok(S::Booked),
            (S::Booked, A::Book) => Err(TransitionError::AlreadyBooked),
            (S::Pending | S::Unsuccessful, A::Book) => {
                Err(TransitionError::NotApproved { status: self })
            }
            (from, action) => Err(TransitionError::InvalidTransition { from, action }),
        }
    }
}

impl Application {
    pub(crate) fn withdraw(&mut self, today: NaiveDate) -> Result<(), TransitionError> {
        let next = self.status.transition(ApplicationAction::Withdraw)?;
        self.withdrawal = Some(Withdrawal {
            requested_from: self.status,
            requested_on: today,
            acknowledged: false,
        });
        self.status = next;
        Ok(())
    }

    pub(crate) fn book(&mut self, today: NaiveDate) -> Result<(), TransitionError> {
        self.status = self.status.transition(ApplicationAction::Book)?;
        self.booked_on = Some(today);
        Ok(())
    }

    /// Marks an outstanding withdrawal as seen, returning the record as it was requested.
    pub(crate) fn acknowledge_withdrawal(&mut self) -> Result<Withdrawal, TransitionError> {
        match self.withdrawal.as_mut() {
            Some(withdrawal) if !withdrawal.acknowledged => {
                let requested = *withdrawal;
                withdrawal.acknowledged = true;
                Ok(requested)
            }
            _ => Err(TransitionError::InvalidTransition {
                from: self.status,
                action: ApplicationAction::AcknowledgeWithdrawal,
            }),
        }
    }
}

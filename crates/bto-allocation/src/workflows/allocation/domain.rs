use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::inventory::UnitInventory;

/// Identity key of a person: a national registration number such as `S1234567A`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub String);

impl PersonId {
    /// Normalizes to upper case and checks the `[ST]` + seven digits + letter shape.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        let bytes = normalized.as_bytes();
        let well_formed = bytes.len() == 9
            && matches!(bytes[0], b'S' | b'T')
            && bytes[1..8].iter().all(u8::is_ascii_digit)
            && bytes[8].is_ascii_uppercase();

        well_formed.then_some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl ProjectName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub(crate) fn from_sequence(sequence: u64) -> Self {
        Self(format!("app-{sequence:06}"))
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    Single,
    Married,
}

impl MaritalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MaritalStatus::Single => "SINGLE",
            MaritalStatus::Married => "MARRIED",
        }
    }
}

impl FromStr for MaritalStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "married" => Ok(Self::Married),
            other => Err(format!("unknown marital status '{other}'")),
        }
    }
}

impl fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Capabilities a person may hold at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Officer,
    Manager,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Officer => "officer",
            Role::Manager => "manager",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "applicant" => Ok(Self::Applicant),
            "officer" | "hdb officer" => Ok(Self::Officer),
            "manager" | "hdb manager" => Ok(Self::Manager),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Housing unit classification. Declaration order is size order, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    #[serde(rename = "TWOROOM", alias = "TWO_ROOM")]
    TwoRoom,
    #[serde(rename = "THREEROOM", alias = "THREE_ROOM")]
    ThreeRoom,
}

impl UnitCategory {
    pub const fn ordered() -> [Self; 2] {
        [Self::TwoRoom, Self::ThreeRoom]
    }

    pub const fn label(self) -> &'static str {
        match self {
            UnitCategory::TwoRoom => "2-Room",
            UnitCategory::ThreeRoom => "3-Room",
        }
    }
}

impl FromStr for UnitCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let compact: String = value
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "tworoom" | "2room" => Ok(Self::TwoRoom),
            "threeroom" | "3room" => Ok(Self::ThreeRoom),
            _ => Err(format!("unknown unit category '{}'", value.trim())),
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive date range during which a project accepts applications and registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationWindow {
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
}

impl ApplicationWindow {
    /// Returns `None` when the closing date precedes the opening date.
    pub fn new(opening_date: NaiveDate, closing_date: NaiveDate) -> Option<Self> {
        (closing_date >= opening_date).then_some(Self {
            opening_date,
            closing_date,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.opening_date <= date && date <= self.closing_date
    }

    pub fn overlaps(&self, other: &ApplicationWindow) -> bool {
        super::conflict::overlaps(self, other)
    }
}

impl fmt::Display for ApplicationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.opening_date, self.closing_date)
    }
}

/// A person's single officer slot: a pending request or an approved assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficerPost {
    pub project: ProjectName,
    pub standing: OfficerStanding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficerStanding {
    Pending,
    Assigned,
}

impl OfficerStanding {
    pub const fn label(self) -> &'static str {
        match self {
            OfficerStanding::Pending => "pending",
            OfficerStanding::Assigned => "assigned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub age: u16,
    pub marital_status: MaritalStatus,
    pub roles: BTreeSet<Role>,
    pub current_application: Option<ApplicationId>,
    pub officer_post: Option<OfficerPost>,
}

impl Person {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Registration payload for a new person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub id: String,
    pub age: u16,
    pub marital_status: MaritalStatus,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: ProjectName,
    pub neighbourhood: String,
    pub inventory: UnitInventory,
    pub window: ApplicationWindow,
    pub visible: bool,
    pub manager: Option<PersonId>,
    pub officer_slots: usize,
    pub officers: BTreeSet<PersonId>,
    pub pending_officers: BTreeSet<PersonId>,
    pub applicants: BTreeSet<PersonId>,
}

impl Project {
    pub fn remaining_officer_slots(&self) -> usize {
        self.officer_slots.saturating_sub(self.officers.len())
    }

    pub fn is_managed_by(&self, person: &PersonId) -> bool {
        self.manager.as_ref() == Some(person)
    }
}

/// Manager-supplied description of a new project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    pub neighbourhood: String,
    pub units: std::collections::BTreeMap<UnitCategory, u32>,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub officer_slots: Option<usize>,
}

/// Status tracked throughout the application lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Successful,
    Unsuccessful,
    Booked,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Successful => "SUCCESSFUL",
            ApplicationStatus::Unsuccessful => "UNSUCCESSFUL",
            ApplicationStatus::Booked => "BOOKED",
        }
    }

    /// Active applications occupy the person's single application slot.
    pub const fn is_active(self) -> bool {
        !matches!(self, ApplicationStatus::Unsuccessful)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Applicant withdrawal record awaiting (or having received) manager acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub requested_from: ApplicationStatus,
    pub requested_on: NaiveDate,
    pub acknowledged: bool,
}

impl Withdrawal {
    /// A withdrawal from SUCCESSFUL still holds the unit until acknowledged.
    pub fn holds_unit(&self) -> bool {
        self.requested_from == ApplicationStatus::Successful && !self.acknowledged
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant: PersonId,
    pub project: ProjectName,
    pub category: UnitCategory,
    pub status: ApplicationStatus,
    pub submitted_on: NaiveDate,
    pub booked_on: Option<NaiveDate>,
    pub withdrawal: Option<Withdrawal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_id_normalizes_and_validates() {
        assert_eq!(
            PersonId::parse(" s1234567a "),
            Some(PersonId("S1234567A".to_string()))
        );
        assert!(PersonId::parse("X1234567A").is_none());
        assert!(PersonId::parse("S123456A").is_none());
        assert!(PersonId::parse("S12345678").is_none());
    }

    #[test]
    fn unit_category_parses_loose_spellings() {
        assert_eq!("TWOROOM".parse::<UnitCategory>(), Ok(UnitCategory::TwoRoom));
        assert_eq!("3-room".parse::<UnitCategory>(), Ok(UnitCategory::ThreeRoom));
        assert_eq!("two_room".parse::<UnitCategory>(), Ok(UnitCategory::TwoRoom));
        assert!("studio".parse::<UnitCategory>().is_err());
        assert!(UnitCategory::TwoRoom < UnitCategory::ThreeRoom);
    }

    #[test]
    fn window_rejects_inverted_dates() {
        let open = NaiveDate::from_ymd_opt(2025, 3, 20).expect("valid");
        let close = NaiveDate::from_ymd_opt(2025, 2, 15).expect("valid");
        assert!(ApplicationWindow::new(open, close).is_none());
        let same_day = ApplicationWindow::new(open, open).expect("single day window");
        assert!(same_day.contains(open));
    }
}

use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};

use super::RosterImportError;
use crate::workflows::allocation::{MaritalStatus, NewPerson, ProjectDraft, Role, UnitCategory};

#[derive(Debug)]
pub(crate) struct PersonRecord {
    pub(crate) line: u64,
    pub(crate) person: NewPerson,
}

#[derive(Debug)]
pub(crate) struct ProjectRecord {
    pub(crate) line: u64,
    pub(crate) draft: ProjectDraft,
    pub(crate) manager: Option<String>,
}

pub(crate) fn parse_people<R: Read>(reader: R) -> Result<Vec<PersonRecord>, RosterImportError> {
    let mut records = Vec::new();

    for (line, row) in read_rows::<PersonRow, R>(reader)? {
        let marital_status = row
            .marital_status
            .parse::<MaritalStatus>()
            .map_err(|message| RosterImportError::InvalidRow { line, message })?;
        let roles = match row.roles.as_deref() {
            Some(raw) => parse_roles(raw)
                .map_err(|message| RosterImportError::InvalidRow { line, message })?,
            None => Vec::new(),
        };

        records.push(PersonRecord {
            line,
            person: NewPerson {
                id: row.nric,
                age: row.age,
                marital_status,
                roles,
            },
        });
    }

    Ok(records)
}

pub(crate) fn parse_projects<R: Read>(reader: R) -> Result<Vec<ProjectRecord>, RosterImportError> {
    let mut records = Vec::new();

    for (line, row) in read_rows::<ProjectRow, R>(reader)? {
        let invalid = |message: String| RosterImportError::InvalidRow { line, message };

        let mut units = BTreeMap::new();
        if let Some(count) = row.two_room_units {
            units.insert(UnitCategory::TwoRoom, count);
        }
        if let Some(count) = row.three_room_units {
            units.insert(UnitCategory::ThreeRoom, count);
        }

        let opening_date = parse_date(&row.opening_date).ok_or_else(|| {
            invalid(format!("opening date '{}' is not a date", row.opening_date))
        })?;
        let closing_date = parse_date(&row.closing_date).ok_or_else(|| {
            invalid(format!("closing date '{}' is not a date", row.closing_date))
        })?;
        let visible = match row.visible.as_deref() {
            Some(raw) => Some(parse_flag(raw).ok_or_else(|| {
                invalid(format!("visibility '{raw}' is not yes/no"))
            })?),
            None => None,
        };

        records.push(ProjectRecord {
            line,
            draft: ProjectDraft {
                name: row.name,
                neighbourhood: row.neighbourhood,
                units,
                opening_date,
                closing_date,
                visible,
                officer_slots: row.officer_slots,
            },
            manager: row.manager,
        });
    }

    Ok(records)
}

/// Reads every data row, pairing it with its 1-based line in the source file.
fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<(u64, T)>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        rows.push((line, record.deserialize::<T>(Some(&headers))?));
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct PersonRow {
    #[serde(rename = "NRIC")]
    nric: String,
    #[serde(rename = "Age")]
    age: u16,
    #[serde(rename = "Marital Status")]
    marital_status: String,
    #[serde(rename = "Roles", default, deserialize_with = "empty_string_as_none")]
    roles: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectRow {
    #[serde(rename = "Project Name")]
    name: String,
    #[serde(rename = "Neighbourhood")]
    neighbourhood: String,
    #[serde(rename = "Two Room Units", default)]
    two_room_units: Option<u32>,
    #[serde(rename = "Three Room Units", default)]
    three_room_units: Option<u32>,
    #[serde(rename = "Opening Date")]
    opening_date: String,
    #[serde(rename = "Closing Date")]
    closing_date: String,
    #[serde(rename = "Manager", default, deserialize_with = "empty_string_as_none")]
    manager: Option<String>,
    #[serde(rename = "Officer Slots", default)]
    officer_slots: Option<usize>,
    #[serde(rename = "Visible", default, deserialize_with = "empty_string_as_none")]
    visible: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_roles(raw: &str) -> Result<Vec<Role>, String> {
    raw.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse::<Role>)
        .collect()
}

/// Accepts ISO dates and the day-first form used by exported spreadsheets.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn dates_accept_iso_and_day_first_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 2, 15).expect("valid date");
        assert_eq!(parse_date("2025-02-15"), Some(expected));
        assert_eq!(parse_date(" 15/02/2025 "), Some(expected));
        assert!(parse_date("Feb 15").is_none());
    }

    #[test]
    fn blank_roles_mean_the_default_capability() {
        let csv = "NRIC,Age,Marital Status,Roles\nS1234567A,35,Single,\nT2109876H,36,single,Applicant; Officer\n";
        let records = parse_people(Cursor::new(csv)).expect("parses");

        assert_eq!(records.len(), 2);
        assert!(records[0].person.roles.is_empty());
        assert_eq!(records[0].line, 2);
        assert_eq!(
            records[1].person.roles,
            vec![Role::Applicant, Role::Officer]
        );
        assert_eq!(records[1].person.marital_status, MaritalStatus::Single);
    }

    #[test]
    fn unknown_marital_status_names_the_row() {
        let csv = "NRIC,Age,Marital Status\nS1234567A,35,Single\nS7654321Z,40,Widowed\n";

        match parse_people(Cursor::new(csv)) {
            Err(RosterImportError::InvalidRow { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("widowed"), "{message}");
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn project_rows_skip_blank_categories_and_optional_cells() {
        let csv = "\
Project Name,Neighbourhood,Two Room Units,Three Room Units,Opening Date,Closing Date,Manager,Officer Slots,Visible
Acacia Breeze,Yishun,2,3,2025-02-15,2025-03-20,S5678901G,,
Cedar Point, Tampines ,,4,01/05/2025,30/06/2025,,3,no
";
        let records = parse_projects(Cursor::new(csv)).expect("parses");

        assert_eq!(records.len(), 2);
        let acacia = &records[0];
        assert_eq!(acacia.draft.units.len(), 2);
        assert_eq!(acacia.manager.as_deref(), Some("S5678901G"));
        assert_eq!(acacia.draft.officer_slots, None);
        assert_eq!(acacia.draft.visible, None);

        let cedar = &records[1];
        assert_eq!(cedar.draft.neighbourhood, "Tampines");
        assert_eq!(
            cedar.draft.units.keys().copied().collect::<Vec<_>>(),
            vec![UnitCategory::ThreeRoom]
        );
        assert_eq!(cedar.draft.officer_slots, Some(3));
        assert_eq!(cedar.draft.visible, Some(false));
        assert!(cedar.manager.is_none());
    }

    #[test]
    fn malformed_numbers_surface_as_csv_errors() {
        let csv = "NRIC,Age,Marital Status\nS1234567A,thirty,Single\n";
        assert!(matches!(
            parse_people(Cursor::new(csv)),
            Err(RosterImportError::Csv(_))
        ));
    }
}

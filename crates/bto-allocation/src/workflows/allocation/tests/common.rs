use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::AllocationConfig;
use crate::workflows::allocation::{
    allocation_router, AllocationCoordinator, AllocationNotice, AllocationService, ApplicationId,
    MaritalStatus, NewPerson, NoticeError, NoticePublisher, PersonId, ProjectDraft, ProjectName,
    Role, UnitCategory,
};

pub(super) const MANAGER: &str = "S5678901G";
pub(super) const SECOND_MANAGER: &str = "T0172419Z";
pub(super) const OFFICER: &str = "T2109876H";
pub(super) const SECOND_OFFICER: &str = "S6543210I";
pub(super) const SINGLE_35: &str = "S1234567A";
pub(super) const MARRIED_40: &str = "T7654321B";
pub(super) const MARRIED_37: &str = "S9876543C";
pub(super) const MARRIED_30: &str = "T2345678D";
pub(super) const SINGLE_25: &str = "S3456789E";

pub(super) const ACACIA: &str = "Acacia Breeze";

pub(super) fn day(year: i32, month: u32, date: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, date).expect("valid date")
}

/// A date inside the Acacia Breeze window.
pub(super) fn today() -> NaiveDate {
    day(2025, 2, 20)
}

pub(super) fn pid(raw: &str) -> PersonId {
    PersonId::parse(raw).expect("fixture id is a valid NRIC")
}

pub(super) fn acacia() -> ProjectName {
    ProjectName::new(ACACIA)
}

pub(super) fn person(
    id: &str,
    age: u16,
    marital_status: MaritalStatus,
    roles: &[Role],
) -> NewPerson {
    NewPerson {
        id: id.to_string(),
        age,
        marital_status,
        roles: roles.to_vec(),
    }
}

pub(super) fn draft(
    name: &str,
    units: &[(UnitCategory, u32)],
    opening_date: NaiveDate,
    closing_date: NaiveDate,
) -> ProjectDraft {
    ProjectDraft {
        name: name.to_string(),
        neighbourhood: "Yishun".to_string(),
        units: units.iter().copied().collect::<BTreeMap<_, _>>(),
        opening_date,
        closing_date,
        visible: None,
        officer_slots: None,
    }
}

pub(super) fn acacia_draft() -> ProjectDraft {
    draft(
        ACACIA,
        &[(UnitCategory::TwoRoom, 2), (UnitCategory::ThreeRoom, 3)],
        day(2025, 2, 15),
        day(2025, 3, 20),
    )
}

/// Everyone from the sample roster, plus Acacia Breeze managed by [`MANAGER`].
pub(super) fn seeded_coordinator() -> AllocationCoordinator {
    let mut engine = AllocationCoordinator::new(&AllocationConfig::default());
    let roster = [
        person(MANAGER, 26, MaritalStatus::Married, &[Role::Manager]),
        person(SECOND_MANAGER, 26, MaritalStatus::Married, &[Role::Manager]),
        person(
            OFFICER,
            36,
            MaritalStatus::Single,
            &[Role::Applicant, Role::Officer],
        ),
        person(
            SECOND_OFFICER,
            28,
            MaritalStatus::Single,
            &[Role::Applicant, Role::Officer],
        ),
        person(SINGLE_35, 35, MaritalStatus::Single, &[]),
        person(MARRIED_40, 40, MaritalStatus::Married, &[]),
        person(MARRIED_37, 37, MaritalStatus::Married, &[]),
        person(MARRIED_30, 30, MaritalStatus::Married, &[]),
        person(SINGLE_25, 25, MaritalStatus::Single, &[]),
    ];
    for entry in roster {
        engine.register_person(entry).expect("roster entry registers");
    }
    engine
        .create_project(&pid(MANAGER), acacia_draft())
        .expect("acacia breeze is created");
    assert_consistent(&engine);
    engine
}

/// Seeded coordinator with [`OFFICER`] already assigned to Acacia Breeze.
pub(super) fn staffed_coordinator() -> AllocationCoordinator {
    let mut engine = seeded_coordinator();
    engine
        .register_officer(&pid(OFFICER), &acacia())
        .expect("officer registers");
    engine
        .approve_officer_registration(&pid(MANAGER), &pid(OFFICER), &acacia())
        .expect("manager approves officer");
    engine
}

pub(super) fn submit(
    engine: &mut AllocationCoordinator,
    applicant: &str,
    category: UnitCategory,
) -> ApplicationId {
    engine
        .submit_application(&pid(applicant), &acacia(), category, today())
        .expect("application is accepted")
        .id
}

pub(super) fn assert_consistent(engine: &AllocationCoordinator) {
    if let Err(violation) = engine.state().check_invariants() {
        panic!("allocation state is inconsistent: {violation}");
    }
}

pub(super) fn build_service() -> (AllocationService<MemoryNotices>, Arc<MemoryNotices>) {
    let notices = Arc::new(MemoryNotices::default());
    let service = AllocationService::new(staffed_coordinator(), notices.clone());
    (service, notices)
}

pub(super) fn router_with_service(service: AllocationService<MemoryNotices>) -> axum::Router {
    allocation_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotices {
    events: Arc<Mutex<Vec<AllocationNotice>>>,
}

impl MemoryNotices {
    pub(super) fn events(&self) -> Vec<AllocationNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NoticePublisher for MemoryNotices {
    fn publish(&self, notice: AllocationNotice) -> Result<(), NoticeError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct OfflineNotices;

impl NoticePublisher for OfflineNotices {
    fn publish(&self, _notice: AllocationNotice) -> Result<(), NoticeError> {
        Err(NoticeError::Transport("mail relay offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

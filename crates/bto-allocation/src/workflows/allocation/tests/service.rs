use std::sync::Arc;
use std::thread;

use super::common::*;
use crate::workflows::allocation::{
    AllocationError, AllocationService, AllocationServiceError, ApplicationStatus, NoticeKind,
    UnitCategory,
};

#[test]
fn approval_publishes_a_notice_after_commit() {
    let (service, notices) = build_service();
    let application = service
        .submit_application(&pid(MARRIED_40), &acacia(), UnitCategory::TwoRoom, today())
        .expect("submitted");
    assert!(notices.events().is_empty(), "submission is silent");

    service
        .approve_application(&pid(MANAGER), &application.id)
        .expect("approved");

    let events = notices.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NoticeKind::ApplicationApproved);
    assert_eq!(events[0].subject, application.id.to_string());
    assert_eq!(events[0].project, acacia());
    assert_eq!(
        events[0].details.get("status").map(String::as_str),
        Some("SUCCESSFUL")
    );
}

#[test]
fn refused_operations_publish_nothing() {
    let (service, notices) = build_service();
    let application = service
        .submit_application(&pid(MARRIED_40), &acacia(), UnitCategory::TwoRoom, today())
        .expect("submitted");

    match service.approve_application(&pid(SECOND_MANAGER), &application.id) {
        Err(AllocationServiceError::Allocation(AllocationError::NotProjectManager { .. })) => {}
        other => panic!("expected manager authorization failure, got {other:?}"),
    }
    assert!(notices.events().is_empty());
}

#[test]
fn notice_failure_does_not_undo_the_decision() {
    let service = AllocationService::new(staffed_coordinator(), Arc::new(OfflineNotices));
    let application = service
        .submit_application(&pid(MARRIED_40), &acacia(), UnitCategory::TwoRoom, today())
        .expect("submitted");

    let approved = service
        .approve_application(&pid(MANAGER), &application.id)
        .expect("decision stands without delivery");
    assert_eq!(approved.status, ApplicationStatus::Successful);
    assert_eq!(
        service
            .remaining_units(&acacia(), UnitCategory::TwoRoom)
            .expect("offered"),
        1
    );
}

#[test]
fn booking_and_officer_approval_emit_notices() {
    let (service, notices) = build_service();
    let application = service
        .submit_application(&pid(MARRIED_40), &acacia(), UnitCategory::ThreeRoom, today())
        .expect("submitted");
    service
        .approve_application(&pid(MANAGER), &application.id)
        .expect("approved");
    service
        .book_flat(&pid(OFFICER), &application.id, today())
        .expect("booked");
    service
        .register_officer(&pid(SECOND_OFFICER), &acacia())
        .expect("registers");
    service
        .approve_officer_registration(&pid(MANAGER), &pid(SECOND_OFFICER), &acacia())
        .expect("approved");

    let kinds: Vec<_> = notices.events().iter().map(|notice| notice.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NoticeKind::ApplicationApproved,
            NoticeKind::FlatBooked,
            NoticeKind::OfficerApproved,
        ]
    );
    let officer_notice = notices.events().pop().expect("officer notice");
    assert_eq!(officer_notice.subject, SECOND_OFFICER);
    assert_eq!(
        officer_notice.details.get("remaining_slots").map(String::as_str),
        Some("8")
    );
}

#[test]
fn concurrent_approvals_never_oversell_units() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    let applications: Vec<_> = [MARRIED_40, MARRIED_37, MARRIED_30]
        .into_iter()
        .map(|applicant| {
            service
                .submit_application(&pid(applicant), &acacia(), UnitCategory::TwoRoom, today())
                .expect("submitted")
                .id
        })
        .collect();

    let handles: Vec<_> = applications
        .into_iter()
        .map(|id| {
            let service = Arc::clone(&service);
            thread::spawn(move || service.approve_application(&pid(MANAGER), &id))
        })
        .collect();
    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("approval thread completes"))
        .collect();

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 2);
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        Err(AllocationServiceError::Allocation(
            AllocationError::NoUnitsAvailable { .. }
        ))
    )));
    assert_eq!(
        service
            .remaining_units(&acacia(), UnitCategory::TwoRoom)
            .expect("offered"),
        0
    );
    assert_eq!(service.check_invariants().expect("lock healthy"), Ok(()));
}

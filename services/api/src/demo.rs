use crate::infra::{sample_today, InMemoryNoticePublisher};
use crate::server::seed_coordinator;
use bto_allocation::config::AppConfig;
use bto_allocation::error::AppError;
use bto_allocation::workflows::allocation::{
    AllocationCoordinator, AllocationService, AllocationServiceError, Application,
    ApplicationStatus, PersonId, Project, ProjectFilter, ReportFilter, UnitCategory,
};
use chrono::NaiveDate;
use clap::Args;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

const SAMPLE_APPLICANTS: [(&str, UnitCategory); 5] = [
    ("T7654321B", UnitCategory::ThreeRoom),
    ("S9876543C", UnitCategory::TwoRoom),
    ("T2345678D", UnitCategory::TwoRoom),
    ("S1234567A", UnitCategory::TwoRoom),
    ("S3456789E", UnitCategory::TwoRoom),
];
const SAMPLE_OFFICER: &str = "T2109876H";
const SAMPLE_WITHDRAWER: &str = "S1234567A";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the walkthrough runs on (YYYY-MM-DD). Defaults to a day inside the sample window.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// People roster CSV; needs --projects-csv. The bundled sample roster is used when both are omitted
    #[arg(long, requires = "projects_csv")]
    pub(crate) people_csv: Option<PathBuf>,
    /// Project roster CSV; needs --people-csv
    #[arg(long, requires = "people_csv")]
    pub(crate) projects_csv: Option<PathBuf>,
    /// Skip the officer registration step, leaving bookings without an officer
    #[arg(long)]
    pub(crate) skip_officer: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        people_csv,
        projects_csv,
        skip_officer,
    } = args;
    let today = today.unwrap_or_else(sample_today);

    let coordinator = demo_coordinator(people_csv.zip(projects_csv))?;
    let notices = Arc::new(InMemoryNoticePublisher::default());
    let service = AllocationService::new(coordinator, notices.clone());

    println!("BTO allocation walkthrough for {today}");
    let projects = match service.filter_projects(&ProjectFilter::default()) {
        Ok(projects) => projects,
        Err(err) => {
            println!("  Projects unavailable: {}", err);
            return Ok(());
        }
    };
    render_projects(&projects);

    let Some(project) = projects.into_iter().find(|project| project.manager.is_some()) else {
        println!("\nNo managed project to walk through");
        return Ok(());
    };
    let Some(manager) = project.manager.clone() else {
        return Ok(());
    };

    println!("\nEligible listings on {today}");
    for (raw, _) in SAMPLE_APPLICANTS {
        let Some(applicant) = PersonId::parse(raw) else {
            continue;
        };
        match service.list_eligible_projects(&applicant, today) {
            Ok(listings) if listings.is_empty() => println!("- {applicant}: nothing open"),
            Ok(listings) => {
                for listing in listings {
                    let categories: Vec<_> = listing
                        .eligible_categories
                        .iter()
                        .map(|category| category.label())
                        .collect();
                    println!(
                        "- {applicant}: {} ({})",
                        listing.name,
                        categories.join(", ")
                    );
                }
            }
            Err(err) => println!("- {applicant}: {err}"),
        }
    }

    let officer = PersonId::parse(SAMPLE_OFFICER);
    if !skip_officer {
        println!("\nOfficer registration");
        if let Some(officer) = &officer {
            outcome(
                "register",
                service.register_officer(officer, &project.name),
                |view| format!("{} is {:?} on {}", view.officer, view.standing, view.project),
            );
            outcome(
                "approve",
                service.approve_officer_registration(&manager, officer, &project.name),
                |view| format!("{} slots remain on {}", view.remaining_slots, view.project),
            );
        }
    }

    println!("\nApplications");
    let mut submitted = Vec::new();
    for (raw, category) in SAMPLE_APPLICANTS {
        let Some(applicant) = PersonId::parse(raw) else {
            continue;
        };
        let result = service.submit_application(&applicant, &project.name, category, today);
        if let Some(application) = outcome(
            &format!("{applicant} applies for {}", category.label()),
            result,
            describe,
        ) {
            submitted.push(application);
        }
    }

    if let Some(withdrawing) = submitted
        .iter()
        .position(|application| application.applicant.as_str() == SAMPLE_WITHDRAWER)
    {
        let application = submitted.remove(withdrawing);
        println!("\nWithdrawal");
        outcome(
            "request",
            service.request_withdrawal(&application.applicant, &application.id, today),
            describe,
        );
        outcome(
            "acknowledge",
            service.acknowledge_withdrawal(&manager, &application.id),
            describe,
        );
    }

    println!("\nManager decisions");
    let mut approved = Vec::new();
    for application in &submitted {
        if let Some(application) = outcome(
            &format!("approve {}", application.id),
            service.approve_application(&manager, &application.id),
            describe,
        ) {
            approved.push(application);
        }
    }
    for category in UnitCategory::ordered() {
        if let Ok(remaining) = service.remaining_units(&project.name, category) {
            println!("  {} units remaining: {}", category.label(), remaining);
        }
    }

    if let (Some(officer), Some(application)) = (&officer, approved.first()) {
        println!("\nBooking");
        outcome(
            "book",
            service.book_flat(officer, &application.id, today),
            describe,
        );
        if let Ok(receipt) = service.booking_receipt(officer, &application.id) {
            match serde_json::to_string_pretty(&receipt) {
                Ok(json) => println!("  Receipt:\n{}", json),
                Err(err) => println!("  Receipt unavailable: {}", err),
            }
        }
    }

    println!("\nApplication report for {}", project.name);
    match service.application_report(&manager, &project.name, &ReportFilter::default()) {
        Ok(rows) => {
            for row in rows {
                println!(
                    "- {} | {} ({}, {}) | {} | {}",
                    row.application_id,
                    row.applicant,
                    row.age,
                    row.marital_status,
                    row.category.label(),
                    row.status
                );
            }
        }
        Err(err) => println!("  Report unavailable: {}", err),
    }

    let events = notices.events();
    if events.is_empty() {
        println!("\nNotices: none dispatched");
    } else {
        println!("\nNotices:");
        for notice in events {
            println!("  - template={} -> {}", notice.kind.template(), notice.subject);
        }
    }

    match service.check_invariants() {
        Ok(Ok(())) => println!("\nState check: consistent"),
        Ok(Err(violation)) => println!("\nState check failed: {}", violation),
        Err(err) => println!("\nState check unavailable: {}", err),
    }

    Ok(())
}

/// Seeds the walkthrough with the same allocation settings the server loads.
fn demo_coordinator(
    roster: Option<(PathBuf, PathBuf)>,
) -> Result<AllocationCoordinator, AppError> {
    let config = AppConfig::load()?;
    seed_coordinator(&config.allocation, roster)
}

fn render_projects(projects: &[Project]) {
    println!("Projects ({})", projects.len());
    for project in projects {
        let units: Vec<_> = project
            .inventory
            .snapshot()
            .iter()
            .map(|(category, count)| format!("{} x{}", category.label(), count))
            .collect();
        let manager = project
            .manager
            .as_ref()
            .map(|manager| manager.to_string())
            .unwrap_or_else(|| "unassigned".to_string());
        println!(
            "- {} [{}] {} | {} | manager {} | {}",
            project.name,
            project.neighbourhood,
            project.window,
            units.join(", "),
            manager,
            if project.visible { "visible" } else { "hidden" }
        );
    }
}

fn describe(application: &Application) -> String {
    let mut line = format!("{} -> {}", application.id, application.status);
    if application.status == ApplicationStatus::Unsuccessful && application.withdrawal.is_some() {
        line.push_str(" (withdrawn)");
    }
    line
}

/// Prints one step of the walkthrough and hands back the value when it succeeded.
fn outcome<T, D: Display>(
    label: &str,
    result: Result<T, AllocationServiceError>,
    render: impl Fn(&T) -> D,
) -> Option<T> {
    match result {
        Ok(value) => {
            println!("  {label}: {}", render(&value));
            Some(value)
        }
        Err(err) => {
            println!("  {label}: refused ({err})");
            None
        }
    }
}

use bto_allocation::workflows::allocation::{AllocationNotice, NoticeError, NoticePublisher};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

/// Sample roster used when no CSV files are supplied.
pub(crate) const SAMPLE_PEOPLE_CSV: &str = "NRIC,Age,Marital Status,Roles
S5678901G,26,Married,Manager
T0172419Z,26,Married,Manager
T2109876H,36,Single,Applicant;Officer
S6543210I,28,Single,Applicant;Officer
S1234567A,35,Single,
T7654321B,40,Married,
S9876543C,37,Married,
T2345678D,30,Married,
S3456789E,25,Single,
";

pub(crate) const SAMPLE_PROJECTS_CSV: &str = "Project Name,Neighbourhood,Two Room Units,Three Room Units,Opening Date,Closing Date,Manager,Officer Slots,Visible
Acacia Breeze,Yishun,2,3,2025-02-15,2025-03-20,S5678901G,3,yes
";

/// A date inside the sample project's application window.
pub(crate) fn sample_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 20).unwrap_or_default()
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNoticePublisher {
    events: Arc<Mutex<Vec<AllocationNotice>>>,
}

impl NoticePublisher for InMemoryNoticePublisher {
    fn publish(&self, notice: AllocationNotice) -> Result<(), NoticeError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NoticeError::Transport("notice log poisoned".to_string()))?;
        guard.push(notice);
        Ok(())
    }
}

impl InMemoryNoticePublisher {
    pub(crate) fn events(&self) -> Vec<AllocationNotice> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

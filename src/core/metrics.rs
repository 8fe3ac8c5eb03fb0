use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_quiz_attempt(passed: bool, unscored_questions: usize) {
    let outcome = if passed { "passed" } else { "failed" };
    metrics::counter!("lms_quiz_attempts_total", "outcome" => outcome).increment(1);
    if unscored_questions > 0 {
        metrics::counter!("lms_unscored_questions_total").increment(unscored_questions as u64);
    }
}

pub(crate) fn record_enrollment_transition(status: &'static str) {
    metrics::counter!("lms_enrollment_transitions_total", "status" => status).increment(1);
}

pub(crate) fn record_login(outcome: &'static str) {
    metrics::counter!("lms_logins_total", "outcome" => outcome).increment(1);
}

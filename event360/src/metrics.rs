//! Domain counters layered on top of the runtime instrumentation.
//!
//! The runtime already measures stores, reducers and effects; this module
//! adds the business-level counters (submission chains, event creation,
//! community sign-ups, check-in scans). Recorders are free functions so
//! reducers can call them without threading a handle through every
//! environment.

use metrics::{counter, describe_counter};

/// Register descriptions for every domain counter.
///
/// Idempotent; called once by the app bootstrap after the exporter is
/// installed.
pub fn describe_domain_metrics() {
    describe_counter!(
        "registrations_started_total",
        "Submission chains started after passing validation"
    );
    describe_counter!(
        "registrations_completed_total",
        "Submission chains that reached Done, by QR availability"
    );
    describe_counter!(
        "registrations_failed_total",
        "Submission chains that failed, by step"
    );
    describe_counter!("events_created_total", "Event drafts accepted by the backend");
    describe_counter!(
        "community_registrations_total",
        "Community sign-up attempts, by outcome"
    );
    describe_counter!("ticket_scans_total", "Check-in scan attempts, by outcome");
}

/// A submission chain passed validation and issued its save call.
pub fn record_registration_started() {
    counter!("registrations_started_total").increment(1);
}

/// A submission chain reached Done.
pub fn record_registration_completed(has_qr: bool) {
    let has_qr = if has_qr { "true" } else { "false" };
    counter!("registrations_completed_total", "has_qr" => has_qr).increment(1);
}

/// A submission chain failed at the given step (`save`, `qr`, `email`).
pub fn record_registration_failed(step: &'static str) {
    counter!("registrations_failed_total", "step" => step).increment(1);
}

/// The backend accepted a composed event draft.
pub fn record_event_created() {
    counter!("events_created_total").increment(1);
}

/// A community sign-up finished, one way or the other.
pub fn record_community_registration(outcome: &'static str) {
    counter!("community_registrations_total", "outcome" => outcome).increment(1);
}

/// A check-in scan finished, one way or the other.
pub fn record_ticket_scan(outcome: &'static str) {
    counter!("ticket_scans_total", "outcome" => outcome).increment(1);
}

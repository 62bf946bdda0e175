//! Door check-in: scanning attendee tickets with the station's barcode
//! scanner.
//!
//! Availability is probed once when the station screen opens; the scan
//! button is only offered when a scanner is present. One capture runs at a
//! time, its outcome ends the capture, and a late outcome arriving after
//! the operator already dismissed the scanner is dropped.

use crate::error::ScanError;
use crate::scanner::TicketScanner;
use crate::types::ScannedTicket;
use event360_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

type Effects = SmallVec<[Effect<CheckinAction>; 4]>;

/// State of the check-in station screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckinState {
    /// Whether a scanner is present, as of the last probe.
    pub available: bool,

    /// Whether a capture is running.
    pub capturing: bool,

    /// The most recently scanned ticket value.
    pub last_scan: Option<ScannedTicket>,

    /// Notice shown when a scan failed.
    pub notice: Option<String>,
}

/// Actions handled by the check-in reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckinAction {
    /// Probe for a scanner.
    Probe,

    /// The probe answered.
    Probed {
        /// Whether a scanner is present.
        available: bool,
    },

    /// Start a capture.
    BeginCapture,

    /// A ticket was scanned.
    Captured {
        /// The decoded ticket value.
        ticket: ScannedTicket,
    },

    /// The capture failed or was dismissed on the device.
    CaptureFailed {
        /// What went wrong.
        error: ScanError,
    },

    /// Stop capturing. Safe to send at any time.
    EndCapture,

    /// Clear the scan notice.
    DismissNotice,
}

/// Environment for the check-in feature.
#[derive(Clone)]
pub struct CheckinEnvironment {
    /// The station's scanner device.
    pub scanner: Arc<dyn TicketScanner>,
}

impl CheckinEnvironment {
    /// Creates a new `CheckinEnvironment`.
    #[must_use]
    pub fn new(scanner: Arc<dyn TicketScanner>) -> Self {
        Self { scanner }
    }
}

/// Reducer driving [`CheckinState`].
#[derive(Clone, Debug, Default)]
pub struct CheckinReducer;

impl CheckinReducer {
    /// Creates a new check-in reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn probe(env: &CheckinEnvironment) -> Effects {
        let scanner = env.scanner.clone();
        smallvec![Effect::future(async move {
            let available = scanner.availability().await;
            Some(CheckinAction::Probed { available })
        })]
    }

    fn begin_capture(state: &mut CheckinState, env: &CheckinEnvironment) -> Effects {
        if !state.available {
            debug!("Capture rejected, no scanner is available");
            return smallvec![Effect::None];
        }
        if state.capturing {
            debug!("Capture rejected, one is already running");
            return smallvec![Effect::None];
        }

        state.capturing = true;
        state.notice = None;
        debug!("Capture started");

        let scanner = env.scanner.clone();
        smallvec![Effect::future(async move {
            match scanner.capture().await {
                Ok(ticket) => Some(CheckinAction::Captured { ticket }),
                Err(error) => Some(CheckinAction::CaptureFailed { error }),
            }
        })]
    }

    fn on_captured(state: &mut CheckinState, ticket: ScannedTicket) -> Effects {
        if !state.capturing {
            debug!("Dropping scan result, capture was already dismissed");
            return smallvec![Effect::None];
        }

        info!(ticket = %ticket.as_str(), "Ticket scanned");
        crate::metrics::record_ticket_scan("captured");
        state.capturing = false;
        state.last_scan = Some(ticket);
        smallvec![Effect::None]
    }

    fn on_capture_failed(state: &mut CheckinState, error: &ScanError) -> Effects {
        if !state.capturing {
            debug!(%error, "Dropping scan failure, capture was already dismissed");
            return smallvec![Effect::None];
        }

        warn!(%error, "Scan failed");
        crate::metrics::record_ticket_scan("failed");
        state.capturing = false;
        state.notice = Some(error.to_string());
        smallvec![Effect::None]
    }
}

impl Reducer for CheckinReducer {
    type State = CheckinState;
    type Action = CheckinAction;
    type Environment = CheckinEnvironment;

    fn reduce(
        &self,
        state: &mut CheckinState,
        action: CheckinAction,
        env: &CheckinEnvironment,
    ) -> SmallVec<[Effect<CheckinAction>; 4]> {
        match action {
            CheckinAction::Probe => Self::probe(env),
            CheckinAction::Probed { available } => {
                debug!(available, "Scanner probe answered");
                state.available = available;
                smallvec![Effect::None]
            }
            CheckinAction::BeginCapture => Self::begin_capture(state, env),
            CheckinAction::Captured { ticket } => Self::on_captured(state, ticket),
            CheckinAction::CaptureFailed { error } => Self::on_capture_failed(state, &error),
            CheckinAction::EndCapture => {
                // Idempotent; the operator can mash the dismiss button.
                state.capturing = false;
                smallvec![Effect::None]
            }
            CheckinAction::DismissNotice => {
                state.notice = None;
                smallvec![Effect::None]
            }
        }
    }
}

//! The check-in scanner device boundary.
//!
//! [`TicketScanner`] abstracts whatever barcode hardware the check-in
//! station runs on. Availability is probed before the scan button is ever
//! offered; capture resolves to the decoded ticket value or a
//! [`ScanError`]. The scripted [`MockScanner`] lives here next to the
//! trait so tests and the demo binary share it.

use crate::error::ScanError;
use crate::types::ScannedTicket;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Boxed future returned by scanner calls.
pub type ScannerFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Barcode scanner attached to the check-in station.
pub trait TicketScanner: Send + Sync {
    /// Whether a scanner is present and ready. Probing never fails; an
    /// absent device is simply unavailable.
    fn availability(&self) -> ScannerFuture<bool>;

    /// Capture one scan.
    ///
    /// Resolves when the user scans a code or dismisses the scanner; a
    /// dismissal surfaces as [`ScanError::Failed`].
    fn capture(&self) -> ScannerFuture<Result<ScannedTicket, ScanError>>;
}

/// One recorded invocation of the [`MockScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerCall {
    /// `availability` was called.
    Availability,

    /// `capture` was called.
    Capture,
}

#[derive(Debug, Default)]
struct MockScannerState {
    availability: VecDeque<bool>,
    captures: VecDeque<Result<ScannedTicket, ScanError>>,
    calls: Vec<ScannerCall>,
}

/// Scripted scanner for tests and demos.
///
/// Results are queued with the `with_*` builders and handed out in FIFO
/// order. An unscripted `availability` probe answers false; an unscripted
/// `capture` fails with [`ScanError::Unavailable`]. Every invocation is
/// recorded.
#[derive(Debug, Default)]
pub struct MockScanner {
    state: Mutex<MockScannerState>,
    latency: Option<Duration>,
}

impl MockScanner {
    /// Creates an empty mock with no scripted results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped instance for sharing.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Delay every call by `latency` before resolving.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue an answer for `availability`.
    #[must_use]
    pub fn with_availability(self, available: bool) -> Self {
        self.lock().availability.push_back(available);
        self
    }

    /// Queue a result for `capture`.
    #[must_use]
    pub fn with_capture(self, result: Result<ScannedTicket, ScanError>) -> Self {
        self.lock().captures.push_back(result);
        self
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ScannerCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockScannerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver<T>(&self, result: T) -> ScannerFuture<T>
    where
        T: Send + 'static,
    {
        let latency = self.latency;
        Box::pin(async move {
            if let Some(delay) = latency {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

impl TicketScanner for MockScanner {
    fn availability(&self) -> ScannerFuture<bool> {
        let answer = {
            let mut state = self.lock();
            state.calls.push(ScannerCall::Availability);
            state.availability.pop_front()
        }
        .unwrap_or(false);
        self.deliver(answer)
    }

    fn capture(&self) -> ScannerFuture<Result<ScannedTicket, ScanError>> {
        let result = {
            let mut state = self.lock();
            state.calls.push(ScannerCall::Capture);
            state.captures.pop_front()
        }
        .unwrap_or(Err(ScanError::Unavailable));
        self.deliver(result)
    }
}

//! Dependencies injected into the registration reducer.

use super::observer::RegistrationObserver;
use crate::gateway::EventGateway;
use std::sync::Arc;

/// Environment for the registration feature.
///
/// The reducer clones these handles into the effect futures it builds, so
/// everything here is shared behind `Arc`.
#[derive(Clone)]
pub struct RegistrationEnvironment {
    /// Backend gateway for catalog, save, QR and email calls.
    pub gateway: Arc<dyn EventGateway>,

    /// Listener notified when a registration completes.
    pub observer: Arc<dyn RegistrationObserver>,
}

impl RegistrationEnvironment {
    /// Creates a new `RegistrationEnvironment`.
    #[must_use]
    pub fn new(gateway: Arc<dyn EventGateway>, observer: Arc<dyn RegistrationObserver>) -> Self {
        Self { gateway, observer }
    }
}

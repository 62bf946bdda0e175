//! # Event360
//!
//! Event marketing and registration workflows: browsing and composing
//! events, registering attendees, issuing QR tickets and checking them in
//! at the door.
//!
//! Every feature is a plain state struct driven by a pure reducer; side
//! effects (backend calls, the scanner device, completion notifications)
//! are described as [`Effect`](event360_core::effect::Effect) values and
//! executed by the [`Store`](event360_runtime::store::Store) runtime.
//! The backend itself stays behind the [`EventGateway`] trait, so every
//! workflow runs identically against the real API, the demo gateway and
//! the scripted test mock.
//!
//! ## Features
//!
//! - [`listing`]: public event listing, paged by four with a price facet
//! - [`detail`]: one event's display record and session schedule
//! - [`composer`]: organizer-facing draft editor with session rows
//! - [`registration`]: attendee form, validation gate and the
//!   save → QR → email submission chain
//! - [`community`]: lightweight sign-up with an email pre-check
//! - [`checkin`]: door scanning against the station's barcode scanner
//!
//! ## Example
//!
//! ```ignore
//! use event360::gateway::DemoGateway;
//! use event360::registration::{
//!     LoggingObserver, RegistrationAction, RegistrationEnvironment,
//!     RegistrationReducer, RegistrationState,
//! };
//! use event360::types::EventId;
//! use event360_runtime::Store;
//! use std::sync::Arc;
//!
//! let env = RegistrationEnvironment::new(DemoGateway::shared(), Arc::new(LoggingObserver::new()));
//! let store = Store::new(
//!     RegistrationState::new(EventId::new("EV-001")),
//!     RegistrationReducer::new(),
//!     env,
//! );
//! store.send(RegistrationAction::LoadCatalog).await?;
//! ```

pub mod checkin;
pub mod community;
pub mod composer;
pub mod config;
pub mod detail;
pub mod error;
pub mod gateway;
pub mod listing;
pub mod metrics;
pub mod qr;
pub mod registration;
pub mod scanner;
pub mod types;

pub use checkin::{CheckinAction, CheckinEnvironment, CheckinReducer, CheckinState};
pub use community::{
    CommunityAction, CommunityEnvironment, CommunityObserver, CommunityReducer,
    CommunityRegistrationCompleted, CommunityState,
};
pub use composer::{ComposerAction, ComposerEnvironment, ComposerReducer, ComposerState};
pub use config::Config;
pub use detail::{DetailAction, DetailEnvironment, DetailReducer, DetailState};
pub use error::{FieldError, GatewayError, GatewayResult, ScanError, normalize_remote_error};
pub use gateway::{DemoGateway, EventGateway, MockGateway, QrPayload};
pub use listing::{ListingAction, ListingEnvironment, ListingReducer, ListingState};
pub use registration::{
    RegistrationAction, RegistrationCompleted, RegistrationEnvironment, RegistrationObserver,
    RegistrationReducer, RegistrationState,
};
pub use scanner::{MockScanner, TicketScanner};

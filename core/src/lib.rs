//! # Event360 Core
//!
//! Core traits and types for the event360 workflow architecture.
//!
//! This crate provides the fundamental abstractions for building event-driven
//! registration and ticketing workflows using the Reducer pattern.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state for a feature (form fields, submission phase, catalog)
//! - **Action**: All possible inputs to a reducer (commands and completion events)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits (clock, remote gateway)
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Explicit Effects (no hidden I/O)
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```ignore
//! use event360_core::*;
//!
//! #[derive(Clone, Debug, Default)]
//! enum SubmissionState {
//!     #[default]
//!     Idle,
//!     Saving { request: RegistrationRequest },
//! }
//!
//! #[derive(Clone, Debug)]
//! enum SubmissionAction {
//!     Submit,
//!     Saved { contact_id: String },
//! }
//!
//! impl Reducer for SubmissionReducer {
//!     type State = SubmissionState;
//!     type Action = SubmissionAction;
//!     type Environment = SubmissionEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut SubmissionState,
//!         action: SubmissionAction,
//!         env: &SubmissionEnvironment,
//!     ) -> SmallVec<[Effect<SubmissionAction>; 4]> {
//!         // Business logic goes here
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

pub mod effect;
pub mod environment;
pub mod event;
pub mod reducer;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

//! Public event listing: pages of four, show-more, and a price facet.
//!
//! Pages are keyed by their offset. A page answer whose offset no longer
//! matches the state is stale (the filter changed while it was in flight)
//! and is dropped, so a slow old page can never leak into a fresh listing.

use crate::error::normalize_remote_error;
use crate::gateway::EventGateway;
use crate::types::{EventSummary, PriceFilter};
use event360_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Rows requested per page. A full page is the signal that more may exist.
pub const DEFAULT_PAGE_SIZE: usize = 4;

type Effects = SmallVec<[Effect<ListingAction>; 4]>;

/// State of the public event listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingState {
    /// Rows accumulated so far, across every loaded page.
    pub events: Vec<EventSummary>,

    /// Offset of the most recently requested page.
    pub offset: usize,

    /// Page size used for every request.
    pub page_size: usize,

    /// Active price facet.
    pub filter: PriceFilter,

    /// Whether the show-more button is offered.
    pub show_more: bool,

    /// Whether a page request is in flight.
    pub loading: bool,

    /// Notice shown when a page could not be loaded.
    pub notice: Option<String>,
}

impl ListingState {
    /// Fresh listing state with the given page size.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            events: Vec::new(),
            offset: 0,
            page_size,
            filter: PriceFilter::All,
            show_more: false,
            loading: false,
            notice: None,
        }
    }
}

impl Default for ListingState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Actions handled by the listing reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingAction {
    /// Load the first page.
    Load,

    /// A page arrived.
    PageLoaded {
        /// Offset the page was requested at.
        offset: usize,
        /// The rows of that page.
        rows: Vec<EventSummary>,
    },

    /// A page could not be loaded.
    LoadFailed {
        /// Normalized failure message.
        message: String,
    },

    /// The show-more button was pressed.
    ShowMorePressed,

    /// The price facet changed.
    FilterChanged {
        /// The new facet.
        filter: PriceFilter,
    },
}

/// Environment for the listing feature.
#[derive(Clone)]
pub struct ListingEnvironment {
    /// Backend gateway serving listing pages.
    pub gateway: Arc<dyn EventGateway>,
}

impl ListingEnvironment {
    /// Creates a new `ListingEnvironment`.
    #[must_use]
    pub fn new(gateway: Arc<dyn EventGateway>) -> Self {
        Self { gateway }
    }
}

/// Reducer driving [`ListingState`].
#[derive(Clone, Debug, Default)]
pub struct ListingReducer;

impl ListingReducer {
    /// Creates a new listing reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn fetch_page(state: &ListingState, env: &ListingEnvironment) -> Effects {
        let gateway = env.gateway.clone();
        let offset = state.offset;
        let limit = state.page_size;
        let filter = state.filter;
        debug!(offset, limit, %filter, "Requesting listing page");

        smallvec![Effect::future(async move {
            match gateway.events_page(offset, limit, filter).await {
                Ok(rows) => Some(ListingAction::PageLoaded { offset, rows }),
                Err(error) => Some(ListingAction::LoadFailed {
                    message: normalize_remote_error(&error),
                }),
            }
        })]
    }
}

impl Reducer for ListingReducer {
    type State = ListingState;
    type Action = ListingAction;
    type Environment = ListingEnvironment;

    fn reduce(
        &self,
        state: &mut ListingState,
        action: ListingAction,
        env: &ListingEnvironment,
    ) -> SmallVec<[Effect<ListingAction>; 4]> {
        match action {
            ListingAction::Load => {
                if state.loading {
                    debug!("Load ignored, a page request is already in flight");
                    return smallvec![Effect::None];
                }
                state.loading = true;
                Self::fetch_page(state, env)
            }
            ListingAction::PageLoaded { offset, rows } => {
                if offset != state.offset {
                    debug!(
                        offset,
                        current = state.offset,
                        "Dropping stale page for an old offset"
                    );
                    return smallvec![Effect::None];
                }
                state.loading = false;
                state.notice = None;
                state.show_more = rows.len() == state.page_size;
                debug!(offset, rows = rows.len(), show_more = state.show_more, "Listing page stored");
                if offset == 0 {
                    state.events = rows;
                } else {
                    state.events.extend(rows);
                }
                smallvec![Effect::None]
            }
            ListingAction::LoadFailed { message } => {
                warn!(%message, "Listing page failed to load");
                state.loading = false;
                state.notice = Some(message);
                smallvec![Effect::None]
            }
            ListingAction::ShowMorePressed => {
                if state.loading || !state.show_more {
                    debug!("Show-more ignored");
                    return smallvec![Effect::None];
                }
                state.offset += state.page_size;
                state.loading = true;
                Self::fetch_page(state, env)
            }
            ListingAction::FilterChanged { filter } => {
                debug!(%filter, "Price facet changed, restarting the listing");
                state.filter = filter;
                state.offset = 0;
                state.events.clear();
                state.show_more = false;
                state.loading = true;
                Self::fetch_page(state, env)
            }
        }
    }
}

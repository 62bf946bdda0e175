//! End-to-end tests of the event listing through a real store.
//!
//! Pages accumulate, the show-more button tracks whether the last page was
//! full, and a filter change throws the accumulated rows away and starts
//! over from offset zero.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use event360::gateway::{GatewayCall, MockGateway};
use event360::listing::{ListingAction, ListingEnvironment, ListingReducer, ListingState};
use event360::types::{EventId, EventSummary, PriceFilter};
use event360_runtime::Store;
use event360_testing::wait_for_state;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn listing(
    gateway: MockGateway,
) -> (
    Store<ListingState, ListingAction, ListingEnvironment, ListingReducer>,
    Arc<MockGateway>,
) {
    let gateway = Arc::new(gateway);
    let env = ListingEnvironment::new(gateway.clone());
    let store = Store::new(ListingState::default(), ListingReducer::new(), env);
    (store, gateway)
}

fn summary(id: &str, price_cents: u64) -> EventSummary {
    EventSummary {
        id: EventId::new(id),
        name: format!("Event {id}"),
        starts_at: None,
        duration_minutes: 60,
        location: "Main Hall".to_string(),
        price_cents,
        image_url: None,
    }
}

fn page(ids: &[&str]) -> Vec<EventSummary> {
    ids.iter().map(|id| summary(id, 2500)).collect()
}

#[tokio::test]
async fn show_more_appends_the_next_page() {
    let (store, gateway) = listing(
        MockGateway::new()
            .with_page(Ok(page(&["EV-1", "EV-2", "EV-3", "EV-4"])))
            .with_page(Ok(page(&["EV-5", "EV-6"]))),
    );

    store.send(ListingAction::Load).await.unwrap();
    assert!(wait_for_state(&store, |state| state.events.len() == 4, WAIT).await);
    assert!(
        store.state(|state| state.show_more).await,
        "a full page offers more"
    );

    store.send(ListingAction::ShowMorePressed).await.unwrap();
    assert!(wait_for_state(&store, |state| state.events.len() == 6, WAIT).await);

    let state = store.state(Clone::clone).await;
    assert!(!state.show_more, "a short page is the last page");
    assert!(!state.loading);
    assert_eq!(state.offset, 4);
    assert_eq!(state.events[4].id, EventId::new("EV-5"));

    assert_eq!(
        gateway.calls(),
        vec![
            GatewayCall::EventsPage {
                offset: 0,
                limit: 4,
                filter: PriceFilter::All,
            },
            GatewayCall::EventsPage {
                offset: 4,
                limit: 4,
                filter: PriceFilter::All,
            },
        ]
    );
}

#[tokio::test]
async fn changing_the_filter_starts_over() {
    let (store, gateway) = listing(
        MockGateway::new()
            .with_page(Ok(page(&["EV-1", "EV-2", "EV-3", "EV-4"])))
            .with_page(Ok(vec![summary("EV-9", 0)])),
    );

    store.send(ListingAction::Load).await.unwrap();
    assert!(wait_for_state(&store, |state| state.events.len() == 4, WAIT).await);

    store
        .send(ListingAction::FilterChanged {
            filter: PriceFilter::Free,
        })
        .await
        .unwrap();
    assert!(
        wait_for_state(
            &store,
            |state| state.events.len() == 1 && !state.loading,
            WAIT,
        )
        .await,
        "the filtered page replaces the accumulated rows"
    );

    let state = store.state(Clone::clone).await;
    assert_eq!(state.events[0].id, EventId::new("EV-9"));
    assert_eq!(state.offset, 0);
    assert_eq!(state.filter, PriceFilter::Free);

    let calls = gateway.calls();
    assert_eq!(
        calls[1],
        GatewayCall::EventsPage {
            offset: 0,
            limit: 4,
            filter: PriceFilter::Free,
        }
    );
}

#[tokio::test]
async fn a_failed_page_leaves_a_notice() {
    let (store, _gateway) =
        listing(MockGateway::new().with_page(Err(event360::error::GatewayError::message(
            "Listing unavailable",
        ))));

    store.send(ListingAction::Load).await.unwrap();
    assert!(
        wait_for_state(
            &store,
            |state| !state.loading && state.notice.is_some(),
            WAIT,
        )
        .await
    );

    let state = store.state(Clone::clone).await;
    assert_eq!(state.notice.as_deref(), Some("Listing unavailable"));
    assert!(state.events.is_empty());
    assert!(!state.show_more);
}

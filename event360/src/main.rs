//! End-to-end walkthrough of the event360 workflows against the demo
//! gateway.
//!
//! Runs every feature once: browse the listing, register an attendee
//! through the full save → QR → email chain, sign up a community member
//! (including the already-registered rejection), and scan a ticket at the
//! door. No external services are needed.
//!
//! ```bash
//! cargo run --bin event360
//! # with the Prometheus exporter:
//! EVENT360_METRICS_ADDR=127.0.0.1:9090 cargo run --bin event360
//! ```

use event360::checkin::{CheckinAction, CheckinEnvironment, CheckinReducer, CheckinState};
use event360::community::{
    CommunityAction, CommunityEnvironment, CommunityReducer, CommunityState,
    LoggingCommunityObserver,
};
use event360::config::Config;
use event360::gateway::{DemoGateway, EventGateway};
use event360::listing::{ListingAction, ListingEnvironment, ListingReducer, ListingState};
use event360::registration::{
    LoggingObserver, RegistrationAction, RegistrationEnvironment, RegistrationReducer,
    RegistrationState,
};
use event360::scanner::MockScanner;
use event360::types::{CommunityRegistrationRequest, ScannedTicket};
use event360_runtime::Store;
use event360_runtime::metrics::MetricsServer;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long each walkthrough step may wait for its chain to finish.
const STEP_TIMEOUT: Duration = Duration::from_secs(10);

/// Matched actions are broadcast just before the reducer applies them, so
/// each scene pauses this long before reading state or sending a follow-up.
const SETTLE: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(addr) = config.metrics_addr {
        let mut server = MetricsServer::new(addr);
        server.start()?;
        event360::metrics::describe_domain_metrics();
        tracing::info!(%addr, "Prometheus exporter installed");
    }

    println!("\nevent360 walkthrough (demo gateway, no external services)\n");

    let gateway = DemoGateway::shared();

    browse_listing(&config, gateway.clone()).await?;
    let booking_id = register_attendee(&config, gateway.clone()).await?;
    sign_up_community(&config, gateway).await?;
    scan_ticket(&config, booking_id).await?;

    println!("\nWalkthrough complete.");
    Ok(())
}

/// Scene 1: browse the public listing, one show-more press included.
async fn browse_listing(config: &Config, gateway: Arc<dyn EventGateway>) -> anyhow::Result<()> {
    println!("1. Browsing the event listing");

    let store = Store::with_config(
        ListingState::new(config.page_size),
        ListingReducer::new(),
        ListingEnvironment::new(gateway),
        config.store_config(),
    );

    store
        .send_and_wait_for(
            ListingAction::Load,
            |action| matches!(action, ListingAction::PageLoaded { .. } | ListingAction::LoadFailed { .. }),
            STEP_TIMEOUT,
        )
        .await?;
    tokio::time::sleep(SETTLE).await;
    store
        .send_and_wait_for(
            ListingAction::ShowMorePressed,
            |action| matches!(action, ListingAction::PageLoaded { .. } | ListingAction::LoadFailed { .. }),
            STEP_TIMEOUT,
        )
        .await?;
    tokio::time::sleep(SETTLE).await;

    let (events, show_more) = store
        .state(|state| (state.events.clone(), state.show_more))
        .await;
    for event in &events {
        println!(
            "   {:<30} {:>8}  {}",
            event.name,
            event.display_price(),
            event.location
        );
    }
    println!("   ✓ {} events loaded, more available: {show_more}\n", events.len());

    store.shutdown(config.shutdown_timeout()).await?;
    Ok(())
}

/// Scene 2: register an attendee and run the whole ticket chain.
async fn register_attendee(
    config: &Config,
    gateway: Arc<dyn EventGateway>,
) -> anyhow::Result<Option<String>> {
    println!("2. Registering an attendee for {}", config.default_event_id);

    let env = RegistrationEnvironment::new(gateway, Arc::new(LoggingObserver::new()));
    let store = Store::with_config(
        RegistrationState::new(config.default_event_id.clone()),
        RegistrationReducer::new(),
        env,
        config.store_config(),
    );

    store
        .send_and_wait_for(
            RegistrationAction::LoadCatalog,
            |action| {
                matches!(
                    action,
                    RegistrationAction::CatalogLoaded { .. } | RegistrationAction::CatalogFailed { .. }
                )
            },
            STEP_TIMEOUT,
        )
        .await?;
    tokio::time::sleep(SETTLE).await;

    let catalog = store.state(|state| state.catalog.clone()).await;
    println!("   ✓ {} sessions available", catalog.len());

    for action in [
        RegistrationAction::FirstNameChanged { value: "Ada".to_string() },
        RegistrationAction::LastNameChanged { value: "Lovelace".to_string() },
        RegistrationAction::EmailChanged { value: "ada@example.com".to_string() },
        RegistrationAction::CompanyChanged { value: "Analytical Society".to_string() },
        RegistrationAction::SkillsChanged { value: "Rust, mathematics".to_string() },
        RegistrationAction::QuantityChanged { raw: "2".to_string() },
    ] {
        store.send(action).await?;
    }
    if let Some(option) = catalog.first() {
        store
            .send(RegistrationAction::SessionPicked { option: option.clone() })
            .await?;
    }

    store
        .send_and_wait_for(
            RegistrationAction::Submit,
            |action| {
                matches!(
                    action,
                    RegistrationAction::EmailSent { .. } | RegistrationAction::StepFailed { .. }
                )
            },
            STEP_TIMEOUT,
        )
        .await?;
    tokio::time::sleep(SETTLE).await;

    let presentation = store.state(RegistrationState::presentation).await;
    let booking_id = match &presentation {
        Some(qr) => {
            println!("   ✓ Registered for {}", qr.event_name);
            println!("   ✓ Booking {}", qr.booking_id);
            match &qr.image_url {
                Some(url) => println!("   ✓ Ticket QR at {url}"),
                None => println!("   - Ticket issued without a QR image"),
            }
            Some(qr.booking_id.to_string())
        }
        None => {
            let notice = store.state(|state| state.notice.clone()).await;
            println!("   ✗ Registration failed: {}", notice.unwrap_or_default());
            None
        }
    };
    println!();

    store.shutdown(config.shutdown_timeout()).await?;
    Ok(booking_id)
}

/// Scene 3: community sign-up, once with a fresh email and once with an
/// address the backend already knows.
async fn sign_up_community(config: &Config, gateway: Arc<dyn EventGateway>) -> anyhow::Result<()> {
    println!("3. Community sign-up");

    let env = CommunityEnvironment::new(gateway, Arc::new(LoggingCommunityObserver::new()));
    let store = Store::with_config(
        CommunityState::default(),
        CommunityReducer::new(),
        env,
        config.store_config(),
    );

    let fresh = CommunityRegistrationRequest {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: "grace@example.com".to_string(),
        event_id: config.default_event_id.clone(),
    };
    store
        .send_and_wait_for(
            CommunityAction::Submit { request: fresh },
            |action| {
                matches!(
                    action,
                    CommunityAction::Saved { .. } | CommunityAction::Failed { .. }
                )
            },
            STEP_TIMEOUT,
        )
        .await?;
    tokio::time::sleep(SETTLE).await;
    let completed = store.state(|state| state.completed.clone()).await;
    let contact = completed.map_or_else(String::new, |id| id.to_string());
    println!("   ✓ Signed up, contact {contact}");

    // The demo gateway treats this domain as already registered.
    let taken = CommunityRegistrationRequest {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: "grace@taken.example".to_string(),
        event_id: config.default_event_id.clone(),
    };
    store
        .send_and_wait_for(
            CommunityAction::Submit { request: taken },
            |action| {
                matches!(
                    action,
                    CommunityAction::EmailChecked { registered: true, .. }
                        | CommunityAction::Failed { .. }
                )
            },
            STEP_TIMEOUT,
        )
        .await?;
    tokio::time::sleep(SETTLE).await;
    let errors = store.state(|state| state.field_errors.clone()).await;
    if let Some(error) = errors.first() {
        println!("   ✓ Duplicate rejected: {}\n", error.message);
    }

    store.shutdown(config.shutdown_timeout()).await?;
    Ok(())
}

/// Scene 4: scan the freshly issued ticket at the door.
async fn scan_ticket(config: &Config, booking_id: Option<String>) -> anyhow::Result<()> {
    println!("4. Door check-in");

    let ticket = ScannedTicket::new(booking_id.unwrap_or_else(|| "BK-WALKIN".to_string()));
    let scanner = MockScanner::new()
        .with_availability(true)
        .with_capture(Ok(ticket))
        .shared();

    let store = Store::with_config(
        CheckinState::default(),
        CheckinReducer::new(),
        CheckinEnvironment::new(scanner),
        config.store_config(),
    );

    store
        .send_and_wait_for(
            CheckinAction::Probe,
            |action| matches!(action, CheckinAction::Probed { .. }),
            STEP_TIMEOUT,
        )
        .await?;
    tokio::time::sleep(SETTLE).await;
    store
        .send_and_wait_for(
            CheckinAction::BeginCapture,
            |action| {
                matches!(
                    action,
                    CheckinAction::Captured { .. } | CheckinAction::CaptureFailed { .. }
                )
            },
            STEP_TIMEOUT,
        )
        .await?;
    tokio::time::sleep(SETTLE).await;

    let scanned = store.state(|state| state.last_scan.clone()).await;
    match scanned {
        Some(ticket) => println!("   ✓ Ticket {} checked in", ticket.as_str()),
        None => println!("   ✗ Scan failed"),
    }

    store.shutdown(config.shutdown_timeout()).await?;
    Ok(())
}

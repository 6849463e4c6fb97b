//! Browse command - load a city and print the list and marker windows.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use mapfolio::config::ConfigFile;
use mapfolio::entity::GeoEntity;
use mapfolio::error::StatusLevel;
use mapfolio::geo::try_parse_point;
use mapfolio::provider::FixedLocation;
use mapfolio::screen::{
    is_settled, DiscoveryController, DiscoveryEvent, DiscoveryServices, ScreenHandle, ScreenState,
    ViewCommand,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use super::common::{
    build_runtime, listing_service, optional_places_service, EntityTypeArg, PurposeArg,
};
use crate::error::CliError;

/// Arguments for the browse command.
pub struct BrowseArgs {
    pub city: Option<String>,
    pub near: Option<String>,
    pub search: Option<String>,
    pub entity_type: Option<EntityTypeArg>,
    pub purpose: Option<PurposeArg>,
    pub pages: usize,
}

/// Run the browse command.
pub fn run(config: &ConfigFile, args: BrowseArgs) -> Result<(), CliError> {
    let near = args
        .near
        .as_deref()
        .map(try_parse_point)
        .transpose()
        .map_err(|e| CliError::InvalidArgument(format!("--near: {}", e)))?;

    let services = DiscoveryServices {
        listings: Arc::new(listing_service(config)?),
        places: Arc::new(optional_places_service(config)?),
        location: Arc::new(FixedLocation(near)),
    };

    let mut discovery = config.discovery();
    if let Some(city) = &args.city {
        discovery = discovery.with_default_city(city.clone());
    }

    // Generous bound on top of the HTTP timeout.
    let settle_secs = config.listing.timeout_secs + 10;
    let mut events = Vec::new();
    if let Some(mode) = args.entity_type {
        events.push(DiscoveryEvent::SetEntityType(mode.into()));
    }
    if let Some(mode) = args.purpose {
        events.push(DiscoveryEvent::SetSubMode(mode.into()));
    }
    if let Some(text) = args.search.clone() {
        events.push(DiscoveryEvent::SetSearchText(text));
    }
    for _ in 1..args.pages.max(1) {
        events.push(DiscoveryEvent::LoadMore);
    }

    let runtime = build_runtime()?;
    let state = runtime.block_on(async move {
        let (controller, handle, mut view) = DiscoveryController::new(discovery, services);
        let task = tokio::spawn(controller.run());

        let first = if near.is_some() {
            DiscoveryEvent::UseMyLocation
        } else {
            DiscoveryEvent::Mount
        };
        let outcome = browse(&handle, &mut view, first, events, settle_secs).await;

        handle.teardown();
        let _ = task.await;
        outcome
    })?;

    print_state(&state);
    match state.error() {
        Some(error) => Err(CliError::Discovery(error.clone())),
        None => Ok(()),
    }
}

async fn browse(
    handle: &ScreenHandle,
    view: &mut UnboundedReceiver<ViewCommand>,
    first: DiscoveryEvent,
    events: Vec<DiscoveryEvent>,
    settle_secs: u64,
) -> Result<ScreenState, CliError> {
    handle.send(first);
    let settled = tokio::time::timeout(Duration::from_secs(settle_secs), async {
        loop {
            let snapshot = handle.snapshot();
            if is_settled(&snapshot) {
                return Ok(snapshot);
            }
            match view.recv().await {
                Some(ViewCommand::RedirectToSignIn) => {
                    return Err(CliError::Config(
                        "The listing API rejected the token. Set [listing] token in config.ini \
                         or MAPFOLIO_TOKEN"
                            .to_string(),
                    ))
                }
                Some(command) => debug!(?command, "View command"),
                None => return Err(CliError::Runtime("screen stopped".to_string())),
            }
        }
    })
    .await
    .map_err(|_| CliError::Timeout(settle_secs))??;

    if settled.error().is_some() {
        return Ok(settled);
    }
    while view.try_recv().is_ok() {}

    // Filter and pagination events are handled synchronously; each one
    // publishes exactly one render.
    for event in events {
        handle.send(event);
        loop {
            match view.recv().await {
                Some(ViewCommand::Render) => break,
                Some(_) => {}
                None => return Err(CliError::Runtime("screen stopped".to_string())),
            }
        }
    }
    Ok(handle.snapshot())
}

fn print_state(state: &ScreenState) {
    if let Some(status) = state.status() {
        let line = match status.level {
            StatusLevel::Info => style(status.to_string()).cyan(),
            StatusLevel::Warning => style(status.to_string()).yellow(),
            StatusLevel::Error => style(status.to_string()).red(),
        };
        println!("{}", line);
    }
    if state.error().is_some() {
        return;
    }

    let list = state.list_slice();
    println!(
        "{}",
        style(format!(
            "{} - {} of {} listings (page {}{})",
            state.city(),
            list.len(),
            state.filtered().len(),
            state.pagination().page(),
            if state.has_more() { ", more available" } else { "" }
        ))
        .bold()
    );
    println!();

    for (index, entity) in list.iter().enumerate() {
        println!("{}", format_entity(index, entity));
    }

    println!();
    println!(
        "Map: {} markers in view, {} polygons ({})",
        state.markers().len(),
        state.polygons().len(),
        state.presentation().label()
    );
}

fn format_entity(index: usize, entity: &GeoEntity) -> String {
    let at = entity.representative_point();
    let (detail, approximate) = match entity {
        GeoEntity::Point(p) => (
            p.purpose.map(|purpose| purpose.label()).unwrap_or("-").to_string(),
            p.location_defaulted(),
        ),
        GeoEntity::Area(a) => (format!("{} vertices", a.vertices().len()), false),
    };
    format!(
        "{:>3}. [{:<5}] {:<32} {:<14} {:<12} {}{}",
        index + 1,
        entity.kind().as_str(),
        truncate(entity.name(), 32),
        entity.city().unwrap_or("-"),
        detail,
        at,
        if approximate { " (approx.)" } else { "" }
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

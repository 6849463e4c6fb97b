//! Event loop owning the discovery screen.
//!
//! The controller is the only writer of [`ScreenState`]. User gestures and
//! async completions arrive as [`DiscoveryEvent`]s on one channel and are
//! handled one at a time, so no update is ever partially visible. After each
//! event the new state is published to the shared snapshot read through
//! [`ScreenHandle`], and side effects for the view are sent as
//! [`ViewCommand`]s.
//!
//! # Request slots
//!
//! | Slot | Superseded by |
//! |------|---------------|
//! | listings | any new load (mount, refresh, city change, location) |
//! | suggestions | next keystroke (inside [`SearchSuggester`]) |
//! | place details | next suggestion selection |
//! | place label | next card tap or load |
//! | device location | next "use my location" |

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{ScreenPhase, ScreenState, Transition};
use crate::config::DiscoveryConfig;
use crate::display::{EntityTypeMode, PropertySubMode};
use crate::entity::{EntityCatalog, EntityKey};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::geo::{LatLon, Viewport, CITY_SPAN};
use crate::pagination::PaginationWindow;
use crate::provider::{ListingQuery, ListingService, LocationProvider, PlaceName, PlacesService};
use crate::search::{
    spawn_cancellable, InputOutcome, RequestSlot, SearchEvent, SearchSink, SearchSuggester,
    SuggestionUpdate, Ticket,
};
use crate::selection::{NavigationRequest, SelectionEffect, SelectionSynchronizer};
use crate::viewport::fit_viewport;

/// The collaborators a discovery screen talks to.
#[derive(Clone)]
pub struct DiscoveryServices {
    pub listings: Arc<dyn ListingService>,
    pub places: Arc<dyn PlacesService>,
    pub location: Arc<dyn LocationProvider>,
}

/// Device position plus its reverse-geocoded name, if one was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub point: LatLon,
    pub place: Option<PlaceName>,
}

/// Input to the controller.
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    /// The screen became visible. Starts the first load.
    Mount,
    /// Reload the current city. A load scoped to a region is repeated for
    /// the region the camera shows now.
    Refresh,
    /// Text in the location search field changed.
    LocationInput(String),
    SelectSuggestion(usize),
    UseMyLocation,
    CycleEntityType,
    CycleSubMode,
    CyclePresentation,
    SetEntityType(EntityTypeMode),
    SetSubMode(PropertySubMode),
    /// Text in the listing filter field changed.
    SetSearchText(String),
    LoadMore,
    ViewportChanged(Viewport),
    MarkerTapped(EntityKey),
    CardTapped(EntityKey),
    /// The list finished scrolling to the requested card.
    ScrollCompleted(EntityKey),
    /// The list could not scroll to the requested card.
    ScrollFailed(EntityKey),
    /// Open the detail view of the selected entity.
    ConfirmSelection,
    DismissStatus,

    ListingsFetched {
        ticket: Ticket,
        result: DiscoveryResult<EntityCatalog>,
    },
    Search(SearchEvent),
    PlaceNameResolved {
        ticket: Ticket,
        key: EntityKey,
        result: DiscoveryResult<PlaceName>,
    },
    LocationResolved {
        ticket: Ticket,
        result: DiscoveryResult<ResolvedLocation>,
    },
    ScrollRetryDue(EntityKey),

    /// Release timers and in-flight requests and stop the loop.
    Teardown,
}

/// Side effects the view must perform.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    /// The snapshot changed; re-read it.
    Render,
    AnimateCamera(Viewport),
    ScrollToIndex { key: EntityKey, index: usize },
    Navigate(NavigationRequest),
    RedirectToSignIn,
}

/// UI-side handle to a running screen.
#[derive(Clone)]
pub struct ScreenHandle {
    state: Arc<Mutex<ScreenState>>,
    events: mpsc::UnboundedSender<DiscoveryEvent>,
    shutdown: CancellationToken,
}

impl ScreenHandle {
    /// A copy of the latest published state.
    pub fn snapshot(&self) -> ScreenState {
        self.state.lock().clone()
    }

    /// Queue an event. Returns false once the screen is gone.
    pub fn send(&self, event: DiscoveryEvent) -> bool {
        !self.shutdown.is_cancelled() && self.events.send(event).is_ok()
    }

    /// Tear the screen down. Pending debounce timers and requests are dropped.
    pub fn teardown(&self) {
        let _ = self.events.send(DiscoveryEvent::Teardown);
        self.shutdown.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

pub struct DiscoveryController {
    config: DiscoveryConfig,
    services: DiscoveryServices,
    state: ScreenState,
    shared: Arc<Mutex<ScreenState>>,
    search: SearchSuggester,
    selection: SelectionSynchronizer,
    listings_slot: RequestSlot,
    label_slot: RequestSlot,
    location_slot: RequestSlot,
    last_query: ListingQuery,
    events_tx: mpsc::UnboundedSender<DiscoveryEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<DiscoveryEvent>>,
    view_tx: mpsc::UnboundedSender<ViewCommand>,
    shutdown: CancellationToken,
}

impl DiscoveryController {
    /// Build a controller, the handle the UI keeps, and the view command stream.
    pub fn new(
        config: DiscoveryConfig,
        services: DiscoveryServices,
    ) -> (Self, ScreenHandle, mpsc::UnboundedReceiver<ViewCommand>) {
        let shutdown = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = mpsc::unbounded_channel();

        let sink_tx = events_tx.clone();
        let sink: SearchSink = Arc::new(move |event: SearchEvent| {
            let _ = sink_tx.send(DiscoveryEvent::Search(event));
        });
        let search = SearchSuggester::new(
            Arc::clone(&services.places),
            sink,
            config.debounce,
            &shutdown,
        );

        let state = ScreenState::new(
            config.default_city.clone(),
            PaginationWindow::new(config.items_per_page, config.markers_per_page),
        );
        let shared = Arc::new(Mutex::new(state.clone()));
        let handle = ScreenHandle {
            state: Arc::clone(&shared),
            events: events_tx.clone(),
            shutdown: shutdown.clone(),
        };

        let controller = Self {
            selection: SelectionSynchronizer::new(config.selection),
            listings_slot: RequestSlot::new("listings", &shutdown),
            label_slot: RequestSlot::new("place_label", &shutdown),
            location_slot: RequestSlot::new("device_location", &shutdown),
            last_query: ListingQuery::for_city(config.default_city.clone()),
            config,
            services,
            state,
            shared,
            search,
            events_tx,
            events_rx: Some(events_rx),
            view_tx,
            shutdown,
        };
        (controller, handle, view_rx)
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    /// Drive the screen until it is torn down.
    pub async fn run(mut self) {
        let Some(mut events) = self.events_rx.take() else {
            return;
        };
        info!(city = %self.state.city(), "Discovery screen started");

        loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            if !self.handle(event) {
                break;
            }
        }

        self.shutdown.cancel();
        info!("Discovery screen torn down");
    }

    /// Apply one event. Returns false when the screen has been torn down.
    pub fn handle(&mut self, event: DiscoveryEvent) -> bool {
        if self.shutdown.is_cancelled() {
            return false;
        }
        let keep_running = self.dispatch(event);
        self.publish();
        keep_running
    }

    fn dispatch(&mut self, event: DiscoveryEvent) -> bool {
        match event {
            DiscoveryEvent::Mount => {
                let query = ListingQuery::for_city(self.config.default_city.clone());
                self.load(query);
            }
            DiscoveryEvent::Refresh => self.refresh(),
            DiscoveryEvent::LocationInput(text) => self.location_input(text),
            DiscoveryEvent::SelectSuggestion(index) => {
                if self.search.select(index).is_some() {
                    self.transition(Transition::SetLocationQuery(self.search.query().to_string()));
                    self.transition(Transition::SetSuggestions(Vec::new()));
                }
            }
            DiscoveryEvent::UseMyLocation => self.locate(),
            DiscoveryEvent::CycleEntityType => self.transition(Transition::CycleEntityType),
            DiscoveryEvent::CycleSubMode => self.transition(Transition::CycleSubMode),
            DiscoveryEvent::CyclePresentation => self.transition(Transition::CyclePresentation),
            DiscoveryEvent::SetEntityType(mode) => self.transition(Transition::SetEntityType(mode)),
            DiscoveryEvent::SetSubMode(mode) => self.transition(Transition::SetSubMode(mode)),
            DiscoveryEvent::SetSearchText(text) => self.transition(Transition::SetSearchText(text)),
            DiscoveryEvent::LoadMore => self.transition(Transition::LoadMore),
            DiscoveryEvent::ViewportChanged(viewport) => {
                self.transition(Transition::ViewportChanged(viewport))
            }
            DiscoveryEvent::MarkerTapped(key) => self.marker_tapped(key),
            DiscoveryEvent::CardTapped(key) => self.card_tapped(key),
            DiscoveryEvent::ScrollCompleted(key) => self.selection.scroll_completed(&key),
            DiscoveryEvent::ScrollFailed(key) => {
                let effects = self.selection.scroll_failed(&key);
                self.run_effects(effects);
            }
            DiscoveryEvent::ScrollRetryDue(key) => {
                let effects = self.selection.retry_due(&key, self.state.list_slice());
                self.run_effects(effects);
            }
            DiscoveryEvent::ConfirmSelection => {
                if let Some(request) = self.selection.confirm() {
                    info!(key = %request.key, "Opening detail view");
                    self.send_view(ViewCommand::Navigate(request));
                }
            }
            DiscoveryEvent::DismissStatus => self.transition(Transition::ClearStatus),
            DiscoveryEvent::ListingsFetched { ticket, result } => {
                self.listings_fetched(ticket, result)
            }
            DiscoveryEvent::Search(event) => self.search_event(event),
            DiscoveryEvent::PlaceNameResolved {
                ticket,
                key,
                result,
            } => self.place_name_resolved(ticket, key, result),
            DiscoveryEvent::LocationResolved { ticket, result } => {
                self.location_resolved(ticket, result)
            }
            DiscoveryEvent::Teardown => {
                self.shutdown.cancel();
                return false;
            }
        }
        true
    }

    fn transition(&mut self, transition: Transition) {
        let before = self.state.phase();
        self.state = self.state.apply(transition);
        let after = self.state.phase();
        if before != after {
            info!(from = ?before, to = ?after, city = %self.state.city(), "Screen phase changed");
        }
    }

    fn publish(&self) {
        *self.shared.lock() = self.state.clone();
        self.send_view(ViewCommand::Render);
    }

    fn send_view(&self, command: ViewCommand) {
        if self.view_tx.send(command).is_err() {
            debug!("View command dropped; no receiver");
        }
    }

    /// Surface an error as the status message, redirecting on auth failure.
    fn surface(&mut self, error: &DiscoveryError) {
        self.transition(Transition::SetStatus(error.status_message()));
        if error.requires_sign_in() {
            self.send_view(ViewCommand::RedirectToSignIn);
        }
    }

    // Loading

    fn load(&mut self, query: ListingQuery) {
        let city = query
            .city
            .clone()
            .unwrap_or_else(|| self.state.city().to_string());

        self.selection.clear();
        self.label_slot.invalidate();
        self.transition(Transition::BeginLoading {
            city,
            viewport: query.viewport,
        });
        if let Some(viewport) = query.viewport {
            self.send_view(ViewCommand::AnimateCamera(viewport));
        }
        self.last_query = query.clone();

        let (ticket, token) = self.listings_slot.begin();
        info!(city = ?query.city, ticket = ticket.generation(), "Loading listings");

        let listings = Arc::clone(&self.services.listings);
        let tx = self.events_tx.clone();
        spawn_cancellable(token, async move {
            let result = listings.fetch(query).await;
            let _ = tx.send(DiscoveryEvent::ListingsFetched { ticket, result });
        });
    }

    fn refresh(&mut self) {
        let mut query = ListingQuery::for_city(self.state.city().to_string());
        if self.last_query.viewport.is_some() {
            query = query.with_viewport(*self.state.viewport());
        }
        self.load(query);
    }

    fn listings_fetched(&mut self, ticket: Ticket, result: DiscoveryResult<EntityCatalog>) {
        if !self.listings_slot.finish(ticket) {
            return;
        }
        match result {
            Ok(catalog) => {
                // Loads without an explicit region frame whatever came back.
                let fitted = match self.last_query.viewport {
                    Some(_) => None,
                    None => fit_viewport(&catalog.merged(), CITY_SPAN),
                };
                self.transition(Transition::ListingsLoaded(catalog));
                if let Some(viewport) = fitted {
                    self.transition(Transition::ViewportChanged(viewport));
                    self.send_view(ViewCommand::AnimateCamera(viewport));
                }
            }
            Err(error) => {
                warn!(error = %error, city = %self.state.city(), "Listing fetch failed");
                let redirect = error.requires_sign_in();
                self.transition(Transition::LoadFailed(error));
                if redirect {
                    self.send_view(ViewCommand::RedirectToSignIn);
                }
            }
        }
    }

    // Location search

    fn location_input(&mut self, text: String) {
        self.transition(Transition::SetLocationQuery(text.clone()));
        match self.search.input(&text) {
            InputOutcome::Scheduled(_) => {}
            InputOutcome::Cleared => {
                self.transition(Transition::SetSuggestions(Vec::new()));
                if self.state.city() != self.config.default_city {
                    info!(
                        city = %self.config.default_city,
                        "Location cleared; back to default city"
                    );
                    self.load(ListingQuery::for_city(self.config.default_city.clone()));
                }
            }
        }
    }

    fn search_event(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::SuggestionsReady { ticket, result, .. } => {
                match self.search.apply_suggestions(ticket, result) {
                    SuggestionUpdate::Stale => {}
                    SuggestionUpdate::Updated => {
                        let suggestions = self.search.suggestions().to_vec();
                        self.transition(Transition::SetSuggestions(suggestions));
                    }
                    SuggestionUpdate::Failed(error) => {
                        self.transition(Transition::SetSuggestions(Vec::new()));
                        self.surface(&error);
                    }
                }
            }
            SearchEvent::PlaceResolved { ticket, result, .. } => {
                match self.search.apply_place(ticket, result) {
                    None => {}
                    Some(Ok(details)) => {
                        info!(city = %details.city, location = %details.location, "Place selected");
                        let viewport = Viewport::around(details.location, CITY_SPAN);
                        self.load(ListingQuery::for_city(details.city).with_viewport(viewport));
                    }
                    Some(Err(error)) => self.surface(&error),
                }
            }
        }
    }

    // Device location

    fn locate(&mut self) {
        let (ticket, token) = self.location_slot.begin();
        let location = Arc::clone(&self.services.location);
        let places = Arc::clone(&self.services.places);
        let tx = self.events_tx.clone();
        spawn_cancellable(token, async move {
            let result = resolve_location(location.as_ref(), places.as_ref()).await;
            let _ = tx.send(DiscoveryEvent::LocationResolved { ticket, result });
        });
    }

    fn location_resolved(&mut self, ticket: Ticket, result: DiscoveryResult<ResolvedLocation>) {
        if !self.location_slot.finish(ticket) {
            return;
        }
        match result {
            Ok(found) => {
                let city = found
                    .place
                    .as_ref()
                    .and_then(|place| place.city.clone())
                    .unwrap_or_else(|| self.state.city().to_string());
                info!(city = %city, location = %found.point, "Using device location");

                self.search.clear();
                self.transition(Transition::SetSuggestions(Vec::new()));
                self.transition(Transition::SetLocationQuery(city.clone()));
                let viewport = Viewport::around(found.point, CITY_SPAN);
                self.load(ListingQuery::for_city(city).with_viewport(viewport));
            }
            Err(error) => {
                warn!(error = %error, "Device location unavailable");
                self.surface(&error);
            }
        }
    }

    // Selection

    fn marker_tapped(&mut self, key: EntityKey) {
        let Some(entity) = self.state.catalog().find(&key) else {
            debug!(key = %key, "Tap on unknown marker");
            return;
        };
        let effects = self.selection.marker_tapped(&entity, self.state.list_slice());
        self.transition(Transition::Select(Some(key)));
        self.run_effects(effects);
    }

    fn card_tapped(&mut self, key: EntityKey) {
        let Some(entity) = self.state.catalog().find(&key) else {
            debug!(key = %key, "Tap on unknown card");
            return;
        };
        let effects = self.selection.card_tapped(&entity);
        self.transition(Transition::Select(Some(key)));
        self.transition(Transition::SetPlaceLabel(None));
        self.run_effects(effects);
    }

    fn place_name_resolved(
        &mut self,
        ticket: Ticket,
        key: EntityKey,
        result: DiscoveryResult<PlaceName>,
    ) {
        if !self.label_slot.finish(ticket) || !self.selection.is_card_selection(&key) {
            return;
        }
        match result {
            Ok(name) => self.transition(Transition::SetPlaceLabel(Some(name.label))),
            // The card stays usable without a label.
            Err(error) => debug!(key = %key, error = %error, "No place name for card"),
        }
    }

    fn run_effects(&mut self, effects: Vec<SelectionEffect>) {
        for effect in effects {
            match effect {
                SelectionEffect::AnimateCamera(viewport) => {
                    self.send_view(ViewCommand::AnimateCamera(viewport))
                }
                SelectionEffect::ScrollToIndex { key, index } => {
                    self.send_view(ViewCommand::ScrollToIndex { key, index })
                }
                SelectionEffect::ScheduleScrollRetry { key, delay } => {
                    let tx = self.events_tx.clone();
                    spawn_cancellable(self.shutdown.child_token(), async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(DiscoveryEvent::ScrollRetryDue(key));
                    });
                }
                SelectionEffect::ResolvePlaceName { key, point } => {
                    let (ticket, token) = self.label_slot.begin();
                    let places = Arc::clone(&self.services.places);
                    let tx = self.events_tx.clone();
                    spawn_cancellable(token, async move {
                        let result = places.reverse_geocode(point).await;
                        let _ = tx.send(DiscoveryEvent::PlaceNameResolved {
                            ticket,
                            key,
                            result,
                        });
                    });
                }
                SelectionEffect::Notify(message) => self.transition(Transition::SetStatus(message)),
            }
        }
    }
}

async fn resolve_location(
    location: &dyn LocationProvider,
    places: &dyn PlacesService,
) -> DiscoveryResult<ResolvedLocation> {
    let point = location.current_location().await?;
    let place = match places.reverse_geocode(point).await {
        Ok(place) => Some(place),
        Err(error) => {
            warn!(error = %error, location = %point, "Reverse geocode of device location failed");
            None
        }
    };
    Ok(ResolvedLocation { point, place })
}

/// True once the screen has left `Loading`.
pub fn is_settled(state: &ScreenState) -> bool {
    matches!(state.phase(), ScreenPhase::Ready | ScreenPhase::Error)
}

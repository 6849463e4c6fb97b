//! The screen state record and its named transitions.
//!
//! [`ScreenState`] is never mutated in place. [`ScreenState::apply`] takes a
//! [`Transition`] and returns the next state, recomputing the filtered set
//! from the catalog and the marker slice from the pagination window and
//! viewport. Keeping every update in one function keeps pagination and
//! filter consistency checkable in one place.

use std::sync::Arc;

use crate::display::{DisplayModes, EntityTypeMode, MapPresentation, PropertySubMode};
use crate::entity::{EntityCatalog, EntityKey, GeoEntity};
use crate::error::{DiscoveryError, StatusMessage};
use crate::geo::Viewport;
use crate::pagination::PaginationWindow;
use crate::provider::PlaceSuggestion;
use crate::viewport::{filter_viewport, polygon_overlays, PolygonOverlay};

/// Screen lifecycle: `Idle -> Loading -> Ready | Error`.
///
/// `Error` is left only through a new `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Named updates to [`ScreenState`].
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A dataset fetch started for `city`, optionally recentring the map.
    BeginLoading {
        city: String,
        viewport: Option<Viewport>,
    },
    ListingsLoaded(EntityCatalog),
    LoadFailed(DiscoveryError),
    CycleEntityType,
    CycleSubMode,
    CyclePresentation,
    SetEntityType(EntityTypeMode),
    SetSubMode(PropertySubMode),
    SetSearchText(String),
    LoadMore,
    ViewportChanged(Viewport),
    SetLocationQuery(String),
    SetSuggestions(Vec<PlaceSuggestion>),
    SetStatus(StatusMessage),
    ClearStatus,
    SetPlaceLabel(Option<String>),
    Select(Option<EntityKey>),
}

/// Everything the discovery screen renders.
#[derive(Debug, Clone)]
pub struct ScreenState {
    phase: ScreenPhase,
    city: String,
    catalog: Arc<EntityCatalog>,
    modes: DisplayModes,
    pagination: PaginationWindow,
    viewport: Viewport,
    filtered: Vec<GeoEntity>,
    markers: Vec<GeoEntity>,
    status: Option<StatusMessage>,
    error: Option<DiscoveryError>,
    location_query: String,
    suggestions: Vec<PlaceSuggestion>,
    place_label: Option<String>,
    selected: Option<EntityKey>,
}

impl ScreenState {
    /// Idle state for `city` with the given pagination window.
    pub fn new(city: impl Into<String>, pagination: PaginationWindow) -> Self {
        Self {
            phase: ScreenPhase::Idle,
            city: city.into(),
            catalog: Arc::new(EntityCatalog::empty()),
            modes: DisplayModes::default(),
            pagination,
            viewport: Viewport::default(),
            filtered: Vec::new(),
            markers: Vec::new(),
            status: None,
            error: None,
            location_query: String::new(),
            suggestions: Vec::new(),
            place_label: None,
            selected: None,
        }
    }

    /// The state after `transition`.
    pub fn apply(&self, transition: Transition) -> ScreenState {
        let mut next = self.clone();
        match transition {
            Transition::BeginLoading { city, viewport } => {
                next.phase = ScreenPhase::Loading;
                next.city = city;
                if let Some(viewport) = viewport {
                    next.viewport = viewport;
                }
                next.status = None;
                next.error = None;
                next.selected = None;
                next.place_label = None;
                next.pagination.reset();
            }
            Transition::ListingsLoaded(catalog) => {
                next.phase = ScreenPhase::Ready;
                next.status = if catalog.is_empty() {
                    Some(DiscoveryError::NotFound(next.city.clone()).status_message())
                } else {
                    None
                };
                next.catalog = Arc::new(catalog);
                next.pagination.reset();
                next.refilter();
            }
            Transition::LoadFailed(error) => {
                next.phase = ScreenPhase::Error;
                next.status = Some(error.status_message());
                next.error = Some(error);
                next.catalog = Arc::new(EntityCatalog::empty());
                next.pagination.reset();
                next.refilter();
            }
            Transition::CycleEntityType => {
                next.modes.entity_type = next.modes.entity_type.next();
                next.reset_and_refilter();
            }
            Transition::CycleSubMode => {
                next.modes.sub_mode = next.modes.sub_mode.next();
                next.reset_and_refilter();
            }
            Transition::CyclePresentation => {
                next.modes.presentation = next.modes.presentation.next();
            }
            Transition::SetEntityType(mode) => {
                next.modes.entity_type = mode;
                next.reset_and_refilter();
            }
            Transition::SetSubMode(mode) => {
                next.modes.sub_mode = mode;
                next.reset_and_refilter();
            }
            Transition::SetSearchText(text) => {
                next.modes.search_text = text;
                next.reset_and_refilter();
            }
            Transition::LoadMore => {
                if next.pagination.load_more(next.filtered.len()) {
                    next.remark();
                }
            }
            Transition::ViewportChanged(viewport) => {
                next.viewport = viewport;
                next.remark();
            }
            Transition::SetLocationQuery(query) => next.location_query = query,
            Transition::SetSuggestions(suggestions) => next.suggestions = suggestions,
            Transition::SetStatus(status) => next.status = Some(status),
            Transition::ClearStatus => next.status = None,
            Transition::SetPlaceLabel(label) => next.place_label = label,
            Transition::Select(key) => next.selected = key,
        }
        next
    }

    fn reset_and_refilter(&mut self) {
        self.pagination.reset();
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = self.modes.filter(&self.catalog);
        self.remark();
    }

    fn remark(&mut self) {
        let window = self.pagination.marker_window(&self.filtered);
        self.markers = filter_viewport(window, &self.viewport);
    }

    pub fn phase(&self) -> ScreenPhase {
        self.phase
    }

    /// City the current dataset was (or is being) loaded for.
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn modes(&self) -> &DisplayModes {
        &self.modes
    }

    pub fn presentation(&self) -> MapPresentation {
        self.modes.presentation
    }

    pub fn pagination(&self) -> &PaginationWindow {
        &self.pagination
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The full filtered set, before pagination.
    pub fn filtered(&self) -> &[GeoEntity] {
        &self.filtered
    }

    /// The list cards currently revealed.
    pub fn list_slice(&self) -> &[GeoEntity] {
        self.pagination.list_slice(&self.filtered)
    }

    /// Markers inside the viewport, drawn from the marker window.
    pub fn markers(&self) -> &[GeoEntity] {
        &self.markers
    }

    /// Polygon outlines for the area markers that can be drawn.
    pub fn polygons(&self) -> Vec<PolygonOverlay> {
        polygon_overlays(&self.markers)
    }

    pub fn has_more(&self) -> bool {
        self.pagination.has_more(self.filtered.len())
    }

    /// Index of `key` in the list window.
    pub fn list_index_of(&self, key: &EntityKey) -> Option<usize> {
        self.list_slice().iter().position(|e| e.has_key(key))
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// The failure that put the screen into [`ScreenPhase::Error`].
    pub fn error(&self) -> Option<&DiscoveryError> {
        self.error.as_ref()
    }

    pub fn location_query(&self) -> &str {
        &self.location_query
    }

    pub fn suggestions(&self) -> &[PlaceSuggestion] {
        &self.suggestions
    }

    /// Reverse-geocoded label for the selected card.
    pub fn place_label(&self) -> Option<&str> {
        self.place_label.as_deref()
    }

    pub fn selected(&self) -> Option<&EntityKey> {
        self.selected.as_ref()
    }
}

impl Default for ScreenState {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CITY, PaginationWindow::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{AreaEntity, ListingPurpose, PointEntity};
    use crate::error::StatusLevel;
    use crate::geo::LatLon;

    fn lahore() -> Viewport {
        Viewport::around(LatLon::new(31.5, 74.3), 1.0)
    }

    fn catalog(properties: usize, projects: usize) -> EntityCatalog {
        let props = (0..properties)
            .map(|i| {
                PointEntity::new(
                    i.to_string(),
                    format!("Flat {i}"),
                    LatLon::new(31.5, 74.3 + i as f64 * 0.001),
                )
                .with_purpose(if i % 2 == 0 {
                    ListingPurpose::ForSale
                } else {
                    ListingPurpose::ForRent
                })
            })
            .collect();
        let projs = (0..projects)
            .map(|i| {
                AreaEntity::new(
                    i.to_string(),
                    format!("Estate {i}"),
                    vec![
                        LatLon::new(31.4, 74.2),
                        LatLon::new(31.4, 74.4),
                        LatLon::new(31.6, 74.3),
                    ],
                )
            })
            .collect();
        EntityCatalog::new(props, projs)
    }

    fn loaded(catalog: EntityCatalog) -> ScreenState {
        ScreenState::default()
            .apply(Transition::BeginLoading {
                city: "Lahore".to_string(),
                viewport: Some(lahore()),
            })
            .apply(Transition::ListingsLoaded(catalog))
    }

    mod phases {
        use super::*;

        #[test]
        fn test_idle_loading_ready() {
            let idle = ScreenState::default();
            assert_eq!(idle.phase(), ScreenPhase::Idle);

            let loading = idle.apply(Transition::BeginLoading {
                city: "Lahore".to_string(),
                viewport: None,
            });
            assert_eq!(loading.phase(), ScreenPhase::Loading);

            let ready = loading.apply(Transition::ListingsLoaded(catalog(1, 0)));
            assert_eq!(ready.phase(), ScreenPhase::Ready);
            assert!(ready.status().is_none());
        }

        #[test]
        fn test_failure_enters_error_until_next_load() {
            let failed = loaded(catalog(3, 0))
                .apply(Transition::BeginLoading {
                    city: "Karachi".to_string(),
                    viewport: None,
                })
                .apply(Transition::LoadFailed(DiscoveryError::Network("offline".into())));

            assert_eq!(failed.phase(), ScreenPhase::Error);
            assert_eq!(failed.status().unwrap().level, StatusLevel::Error);
            assert!(failed.list_slice().is_empty());

            // Filter changes do not leave the error phase.
            let still = failed.apply(Transition::CycleEntityType);
            assert_eq!(still.phase(), ScreenPhase::Error);

            let retry = still.apply(Transition::BeginLoading {
                city: "Karachi".to_string(),
                viewport: None,
            });
            assert_eq!(retry.phase(), ScreenPhase::Loading);
            assert!(retry.status().is_none());
            assert!(retry.error().is_none());
        }

        #[test]
        fn test_empty_result_is_ready_with_notice() {
            let state = loaded(EntityCatalog::empty());
            assert_eq!(state.phase(), ScreenPhase::Ready);
            assert_eq!(
                state.status(),
                Some(&StatusMessage::warning("No data for this selection."))
            );
        }
    }

    mod pagination {
        use super::*;

        #[test]
        fn test_small_dataset_fits_first_page() {
            let state = loaded(catalog(3, 2));
            assert_eq!(state.list_slice().len(), 5);
            assert!(!state.has_more());
            assert_eq!(state.markers().len(), 5);
        }

        #[test]
        fn test_load_more_grows_both_windows() {
            let state = loaded(catalog(25, 0));
            assert_eq!(state.list_slice().len(), 8);
            assert_eq!(state.markers().len(), 10);

            let more = state.apply(Transition::LoadMore);
            assert_eq!(more.pagination().page(), 2);
            assert_eq!(more.list_slice().len(), 16);
            assert_eq!(more.markers().len(), 20);
        }

        #[test]
        fn test_load_more_without_more_is_noop() {
            let state = loaded(catalog(3, 2));
            let after = state.apply(Transition::LoadMore);
            assert_eq!(after.pagination().page(), 1);
            assert_eq!(after.list_slice(), state.list_slice());
        }

        #[test]
        fn test_filter_change_resets_page() {
            let state = loaded(catalog(25, 3)).apply(Transition::LoadMore);
            assert_eq!(state.pagination().page(), 2);

            let typed = state.apply(Transition::SetSearchText("flat".to_string()));
            assert_eq!(typed.pagination().page(), 1);

            let cycled = state.apply(Transition::CycleSubMode);
            assert_eq!(cycled.pagination().page(), 1);
        }

        #[test]
        fn test_presentation_change_keeps_page() {
            let state = loaded(catalog(25, 0)).apply(Transition::LoadMore);
            let next = state.apply(Transition::CyclePresentation);
            assert_eq!(next.pagination().page(), 2);
            assert_eq!(next.presentation(), MapPresentation::Satellite);
        }
    }

    mod filtering {
        use super::*;

        #[test]
        fn test_filters_recompute_from_source() {
            let state = loaded(catalog(4, 2));

            let projects = state.apply(Transition::SetEntityType(EntityTypeMode::Projects));
            assert_eq!(projects.filtered().len(), 2);

            // Narrowing then widening again must not compound.
            let both = projects.apply(Transition::SetEntityType(EntityTypeMode::Both));
            assert_eq!(both.filtered().len(), 6);

            let rent = both.apply(Transition::SetSubMode(PropertySubMode::ForRent));
            assert_eq!(rent.filtered().len(), 4);
        }

        #[test]
        fn test_search_text_is_case_insensitive() {
            let state = loaded(catalog(3, 2)).apply(Transition::SetSearchText("ESTATE".into()));
            assert_eq!(state.filtered().len(), 2);
        }
    }

    mod viewport {
        use super::*;

        #[test]
        fn test_markers_follow_viewport() {
            let state = loaded(catalog(3, 0));
            let away = state.apply(Transition::ViewportChanged(Viewport::around(
                LatLon::new(24.86, 67.0),
                0.5,
            )));
            assert!(away.markers().is_empty());
            assert_eq!(away.list_slice().len(), 3);
        }

        #[test]
        fn test_two_vertex_area_keeps_marker_and_card() {
            let catalog = EntityCatalog::new(
                vec![],
                vec![AreaEntity::new(
                    "9",
                    "Thin",
                    vec![LatLon::new(31.5, 74.3), LatLon::new(31.6, 74.4)],
                )],
            );
            let state = loaded(catalog);

            assert_eq!(state.list_slice().len(), 1);
            assert_eq!(state.markers().len(), 1);
            assert!(state.polygons().is_empty());
        }

        #[test]
        fn test_polygons_for_renderable_areas() {
            let state = loaded(catalog(1, 2));
            assert_eq!(state.polygons().len(), 2);
        }
    }

    #[test]
    fn test_list_index_uses_composite_key() {
        let state = loaded(catalog(2, 1));
        assert_eq!(state.list_index_of(&EntityKey::point("0")), Some(0));
        assert_eq!(state.list_index_of(&EntityKey::area("0")), Some(2));
        assert_eq!(state.list_index_of(&EntityKey::area("5")), None);
    }
}

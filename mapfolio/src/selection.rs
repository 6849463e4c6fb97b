//! Bidirectional link between map markers, list cards and the camera.
//!
//! The synchronizer is a small state machine over one selection at a time.
//! It does no I/O and never waits: every operation returns the
//! [`SelectionEffect`]s the owner must carry out (move the camera, scroll the
//! list, arm a retry timer, look up a place name, show a message).
//!
//! # Scroll retries
//!
//! ```text
//! marker tap ──► ScrollToIndex ──► scroll_completed ──► done
//!                     │
//!                     └─ scroll_failed ──► ScheduleScrollRetry ──► retry_due
//!                                                                    │
//!                           ScrollToIndex ◄── found ─────────────────┤
//!                                │                                   └─ missing ──► Notify
//!                                └─ scroll_failed (second) ──► Notify
//! ```

use std::time::Duration;

use tracing::{debug, info};

use crate::entity::{EntityKey, GeoEntity};
use crate::error::{DiscoveryError, StatusMessage};
use crate::geo::{LatLon, Viewport, CARD_OVERVIEW_SPAN, MARKER_FOCUS_SPAN};

/// Default delay before a failed list scroll is retried.
pub const DEFAULT_SCROLL_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Camera spans and retry timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    /// Span of the camera after a marker tap.
    pub marker_span: f64,
    /// Span of the camera after a card tap.
    pub card_span: f64,
    pub scroll_retry_delay: Duration,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            marker_span: MARKER_FOCUS_SPAN,
            card_span: CARD_OVERVIEW_SPAN,
            scroll_retry_delay: DEFAULT_SCROLL_RETRY_DELAY,
        }
    }
}

/// Where the current selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Marker,
    Card,
}

/// The selected entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub key: EntityKey,
    pub source: SelectionSource,
}

/// Request to open the detail view of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub key: EntityKey,
}

/// Work the owner must perform after a selection operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEffect {
    /// Move the map camera.
    AnimateCamera(Viewport),
    /// Scroll the card list so `index` is visible.
    ScrollToIndex { key: EntityKey, index: usize },
    /// Call [`SelectionSynchronizer::retry_due`] after `delay`.
    ScheduleScrollRetry { key: EntityKey, delay: Duration },
    /// Reverse-geocode `point` to label the card selection.
    ResolvePlaceName { key: EntityKey, point: LatLon },
    /// Show a status message.
    Notify(StatusMessage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingScroll {
    key: EntityKey,
    retried: bool,
}

#[derive(Debug, Default)]
pub struct SelectionSynchronizer {
    config: SelectionConfig,
    selected: Option<Selection>,
    pending_scroll: Option<PendingScroll>,
}

impl SelectionSynchronizer {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            selected: None,
            pending_scroll: None,
        }
    }

    pub fn selected(&self) -> Option<&Selection> {
        self.selected.as_ref()
    }

    /// True when `key` is the current card selection.
    pub fn is_card_selection(&self, key: &EntityKey) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|s| s.source == SelectionSource::Card && &s.key == key)
    }

    /// A marker was tapped. `list` is the current list window.
    pub fn marker_tapped(
        &mut self,
        entity: &GeoEntity,
        list: &[GeoEntity],
    ) -> Vec<SelectionEffect> {
        let key = entity.key();
        self.selected = Some(Selection {
            key: key.clone(),
            source: SelectionSource::Marker,
        });

        let mut effects = vec![SelectionEffect::AnimateCamera(Viewport::around(
            entity.representative_point(),
            self.config.marker_span,
        ))];
        effects.push(self.scroll_to(key, list, false));
        effects
    }

    /// A card was tapped. The list scroll position is left alone.
    pub fn card_tapped(&mut self, entity: &GeoEntity) -> Vec<SelectionEffect> {
        let key = entity.key();
        let point = entity.representative_point();
        self.pending_scroll = None;
        self.selected = Some(Selection {
            key: key.clone(),
            source: SelectionSource::Card,
        });

        vec![
            SelectionEffect::AnimateCamera(Viewport::around(point, self.config.card_span)),
            SelectionEffect::ResolvePlaceName { key, point },
        ]
    }

    /// The list reported a successful scroll to `key`.
    pub fn scroll_completed(&mut self, key: &EntityKey) {
        if self.pending_scroll.as_ref().is_some_and(|p| &p.key == key) {
            self.pending_scroll = None;
        }
    }

    /// The list could not scroll to `key`. The first failure schedules one
    /// retry; the second degrades to the not-in-list message.
    pub fn scroll_failed(&mut self, key: &EntityKey) -> Vec<SelectionEffect> {
        let Some(pending) = self.pending_scroll.as_mut().filter(|p| &p.key == key) else {
            debug!(key = %key, "Ignoring scroll failure for superseded selection");
            return Vec::new();
        };

        if pending.retried {
            self.pending_scroll = None;
            return vec![not_in_list(key)];
        }

        pending.retried = true;
        info!(
            key = %key,
            delay_ms = self.config.scroll_retry_delay.as_millis() as u64,
            "Retrying list scroll"
        );
        vec![SelectionEffect::ScheduleScrollRetry {
            key: key.clone(),
            delay: self.config.scroll_retry_delay,
        }]
    }

    /// The retry timer for `key` elapsed. The index is looked up again since
    /// the list may have changed in the meantime.
    pub fn retry_due(&mut self, key: &EntityKey, list: &[GeoEntity]) -> Vec<SelectionEffect> {
        if !self.pending_scroll.as_ref().is_some_and(|p| &p.key == key) {
            return Vec::new();
        }
        vec![self.scroll_to(key.clone(), list, true)]
    }

    /// Confirm the current selection.
    pub fn confirm(&self) -> Option<NavigationRequest> {
        self.selected.as_ref().map(|s| NavigationRequest { key: s.key.clone() })
    }

    /// Drop the selection and any pending scroll.
    pub fn clear(&mut self) {
        self.selected = None;
        self.pending_scroll = None;
    }

    fn scroll_to(&mut self, key: EntityKey, list: &[GeoEntity], retried: bool) -> SelectionEffect {
        match list.iter().position(|e| e.has_key(&key)) {
            Some(index) => {
                self.pending_scroll = Some(PendingScroll {
                    key: key.clone(),
                    retried,
                });
                SelectionEffect::ScrollToIndex { key, index }
            }
            None => {
                self.pending_scroll = None;
                not_in_list(&key)
            }
        }
    }
}

fn not_in_list(key: &EntityKey) -> SelectionEffect {
    info!(key = %key, "Selected entity is not in the list window");
    SelectionEffect::Notify(DiscoveryError::ScrollTargetMissing(key.to_string()).status_message())
}

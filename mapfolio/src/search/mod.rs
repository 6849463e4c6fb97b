//! Location search: debounced autocomplete and place-details resolution.
//!
//! The suggester owns two logical request slots. The suggestion slot lives
//! inside a [`Debouncer`], so every keystroke cancels the previous timer or
//! request. The details slot is restarted on every selection. Completions do
//! not touch state directly: the spawned task hands a [`SearchEvent`] to the
//! sink, and the owner feeds it back through [`SearchSuggester::apply_suggestions`]
//! or [`SearchSuggester::apply_place`], where stale tickets are discarded.

mod debounce;
mod slot;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use debounce::{Debouncer, DEFAULT_DEBOUNCE, MAX_DEBOUNCE, MIN_DEBOUNCE};
pub use slot::{spawn_cancellable, RequestSlot, Ticket};

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::provider::{PlaceDetails, PlaceSuggestion, PlacesService, SessionToken};

/// Completion of a search request, delivered to the suggester's owner.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    SuggestionsReady {
        ticket: Ticket,
        query: String,
        result: DiscoveryResult<Vec<PlaceSuggestion>>,
    },
    PlaceResolved {
        ticket: Ticket,
        suggestion: PlaceSuggestion,
        result: DiscoveryResult<PlaceDetails>,
    },
}

/// Receives search completions, typically by forwarding them into an event loop.
pub type SearchSink = Arc<dyn Fn(SearchEvent) + Send + Sync>;

/// What a keystroke did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// The query is blank; suggestions were cleared and nothing was scheduled.
    Cleared,
    /// A debounced request was scheduled under this ticket.
    Scheduled(Ticket),
}

/// How a suggestion completion changed the suggester.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionUpdate {
    /// Superseded by a newer keystroke; ignored.
    Stale,
    Updated,
    /// The request failed; suggestions were cleared.
    Failed(DiscoveryError),
}

pub struct SearchSuggester {
    places: Arc<dyn PlacesService>,
    sink: SearchSink,
    debouncer: Debouncer,
    details: RequestSlot,
    session: SessionToken,
    query: String,
    suggestions: Vec<PlaceSuggestion>,
}

impl SearchSuggester {
    /// # Arguments
    ///
    /// * `places` - The geocoding service
    /// * `sink` - Where completions are delivered
    /// * `debounce` - Quiet period before a keystroke issues a request
    /// * `parent` - Screen lifetime token; cancelling it releases all timers
    pub fn new(
        places: Arc<dyn PlacesService>,
        sink: SearchSink,
        debounce: Duration,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            places,
            sink,
            debouncer: Debouncer::new("suggestions", debounce, parent),
            details: RequestSlot::new("place_details", parent),
            session: SessionToken::generate(),
            query: String::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[PlaceSuggestion] {
        &self.suggestions
    }

    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    /// Handle one keystroke worth of input.
    pub fn input(&mut self, text: &str) -> InputOutcome {
        self.query = text.to_string();
        // Editing the field supersedes a selection still waiting for details.
        self.details.invalidate();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.debouncer.cancel();
            self.suggestions.clear();
            return InputOutcome::Cleared;
        }

        let places = Arc::clone(&self.places);
        let sink = Arc::clone(&self.sink);
        let session = self.session.clone();
        let query = trimmed.to_string();

        let ticket = self.debouncer.schedule(move |ticket| async move {
            debug!(query = %query, "Requesting suggestions");
            let result = places.autocomplete(&query, &session).await;
            sink(SearchEvent::SuggestionsReady {
                ticket,
                query,
                result,
            });
        });
        InputOutcome::Scheduled(ticket)
    }

    /// Commit a suggestion completion if it belongs to the latest keystroke.
    pub fn apply_suggestions(
        &mut self,
        ticket: Ticket,
        result: DiscoveryResult<Vec<PlaceSuggestion>>,
    ) -> SuggestionUpdate {
        if !self.debouncer.finish(ticket) {
            return SuggestionUpdate::Stale;
        }
        match result {
            Ok(suggestions) => {
                debug!(count = suggestions.len(), "Suggestions updated");
                self.suggestions = suggestions;
                SuggestionUpdate::Updated
            }
            Err(e) => {
                warn!(error = %e, "Suggestion request failed");
                self.suggestions.clear();
                SuggestionUpdate::Failed(e)
            }
        }
    }

    /// Start the place-details lookup for the suggestion at `index`.
    ///
    /// Returns `None` when the index is out of range.
    pub fn select(&mut self, index: usize) -> Option<Ticket> {
        let suggestion = self.suggestions.get(index).cloned()?;
        self.debouncer.cancel();
        self.query = suggestion.description.clone();
        self.suggestions.clear();

        let (ticket, token) = self.details.begin();
        let places = Arc::clone(&self.places);
        let sink = Arc::clone(&self.sink);
        let session = self.session.clone();

        spawn_cancellable(token, async move {
            debug!(place_id = %suggestion.place_id, "Resolving place details");
            let result = places.place_details(&suggestion.place_id, &session).await;
            sink(SearchEvent::PlaceResolved {
                ticket,
                suggestion,
                result,
            });
        });
        Some(ticket)
    }

    /// Commit a place-details completion. `None` means the result was stale.
    ///
    /// A committed lookup ends the autocomplete session, so the session token
    /// is rotated.
    pub fn apply_place(
        &mut self,
        ticket: Ticket,
        result: DiscoveryResult<PlaceDetails>,
    ) -> Option<DiscoveryResult<PlaceDetails>> {
        if !self.details.finish(ticket) {
            return None;
        }
        self.session = SessionToken::generate();
        if let Err(e) = &result {
            warn!(error = %e, "Place details lookup failed");
        }
        Some(result)
    }

    /// Forget the query and cancel anything pending.
    pub fn clear(&mut self) {
        self.query.clear();
        self.suggestions.clear();
        self.debouncer.cancel();
        self.details.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLon;
    use crate::provider::{suggestion, MockPlacesService};
    use tokio::sync::mpsc;

    fn suggester(
        places: Arc<MockPlacesService>,
    ) -> (SearchSuggester, mpsc::UnboundedReceiver<SearchEvent>, CancellationToken) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink: SearchSink = Arc::new(move |event: SearchEvent| {
            let _ = tx.send(event);
        });
        let root = CancellationToken::new();
        let suggester = SearchSuggester::new(places, sink, DEFAULT_DEBOUNCE, &root);
        (suggester, rx, root)
    }

    fn lahore_details() -> PlaceDetails {
        PlaceDetails {
            location: LatLon::new(31.5204, 74.3587),
            city: "Lahore".to_string(),
            formatted_address: "Lahore, Pakistan".to_string(),
        }
    }

    mod suggestions {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_rapid_keystrokes_issue_one_request() {
            let places = Arc::new(
                MockPlacesService::default()
                    .suggest("abc", Ok(vec![suggestion("p1", "Abc Town")])),
            );
            let (mut search, mut rx, _root) = suggester(places.clone());

            for text in ["a", "ab", "abc"] {
                search.input(text);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }

            let event = rx.recv().await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;

            assert_eq!(places.autocomplete_calls(), vec!["abc"]);
            match event {
                SearchEvent::SuggestionsReady {
                    ticket,
                    query,
                    result,
                } => {
                    assert_eq!(query, "abc");
                    assert_eq!(search.apply_suggestions(ticket, result), SuggestionUpdate::Updated);
                    assert_eq!(search.suggestions().len(), 1);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_stale_result_is_rejected() {
            let places = Arc::new(MockPlacesService::default());
            let (mut search, _rx, _root) = suggester(places);

            let InputOutcome::Scheduled(old) = search.input("ka") else {
                panic!("expected schedule");
            };
            let InputOutcome::Scheduled(new) = search.input("kar") else {
                panic!("expected schedule");
            };

            let update = search.apply_suggestions(old, Ok(vec![suggestion("old", "Kasur")]));
            assert_eq!(update, SuggestionUpdate::Stale);
            assert!(search.suggestions().is_empty());

            let update = search.apply_suggestions(new, Ok(vec![suggestion("new", "Karachi")]));
            assert_eq!(update, SuggestionUpdate::Updated);
            assert_eq!(search.suggestions()[0].place_id, "new");
        }

        #[tokio::test(start_paused = true)]
        async fn test_blank_input_clears_without_request() {
            let places = Arc::new(MockPlacesService::default());
            let (mut search, _rx, _root) = suggester(places.clone());

            let InputOutcome::Scheduled(ticket) = search.input("lah") else {
                panic!("expected schedule");
            };
            search.apply_suggestions(ticket, Ok(vec![suggestion("p", "Lahore")]));

            assert_eq!(search.input("   "), InputOutcome::Cleared);
            assert!(search.suggestions().is_empty());

            tokio::time::sleep(Duration::from_secs(1)).await;
            assert!(places.autocomplete_calls().is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_failure_clears_suggestions() {
            let places = Arc::new(MockPlacesService::default());
            let (mut search, _rx, _root) = suggester(places);

            let InputOutcome::Scheduled(first) = search.input("is") else {
                panic!("expected schedule");
            };
            search.apply_suggestions(first, Ok(vec![suggestion("p", "Islamabad")]));

            let InputOutcome::Scheduled(second) = search.input("isl") else {
                panic!("expected schedule");
            };
            let update =
                search.apply_suggestions(second, Err(DiscoveryError::Network("offline".into())));

            assert!(matches!(update, SuggestionUpdate::Failed(DiscoveryError::Network(_))));
            assert!(search.suggestions().is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_teardown_releases_pending_timer() {
            let places = Arc::new(MockPlacesService::default());
            let (mut search, _rx, root) = suggester(places.clone());

            search.input("mul");
            root.cancel();
            tokio::time::sleep(Duration::from_secs(1)).await;

            assert!(places.autocomplete_calls().is_empty());
        }
    }

    mod details {
        use super::*;

        fn with_suggestions(
            places: Arc<MockPlacesService>,
        ) -> (SearchSuggester, mpsc::UnboundedReceiver<SearchEvent>, CancellationToken) {
            let (mut search, rx, root) = suggester(places);
            let InputOutcome::Scheduled(ticket) = search.input("lah") else {
                panic!("expected schedule");
            };
            search.apply_suggestions(
                ticket,
                Ok(vec![suggestion("lhr", "Lahore"), suggestion("lhc", "Lahore Cantt")]),
            );
            (search, rx, root)
        }

        #[tokio::test(start_paused = true)]
        async fn test_select_resolves_place_with_session() {
            let places =
                Arc::new(MockPlacesService::default().detail("lhr", Ok(lahore_details())));
            let (mut search, mut rx, _root) = with_suggestions(places.clone());
            let session = search.session().clone();

            let ticket = search.select(0).unwrap();
            assert_eq!(search.query(), "Lahore");
            assert!(search.suggestions().is_empty());

            let Some(SearchEvent::PlaceResolved {
                ticket: got,
                suggestion,
                result,
            }) = rx.recv().await
            else {
                panic!("expected place event");
            };
            assert_eq!(got, ticket);
            assert_eq!(suggestion.place_id, "lhr");

            let resolved = search.apply_place(got, result).unwrap().unwrap();
            assert_eq!(resolved.city, "Lahore");

            let calls = places.detail_calls.lock().clone();
            assert_eq!(calls, vec![("lhr".to_string(), session.clone())]);
            assert_ne!(search.session(), &session);
        }

        #[tokio::test(start_paused = true)]
        async fn test_out_of_range_select_is_ignored() {
            let places = Arc::new(MockPlacesService::default());
            let (mut search, _rx, _root) = with_suggestions(places);
            assert!(search.select(5).is_none());
            assert_eq!(search.suggestions().len(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_superseded_details_are_dropped() {
            let places = Arc::new(MockPlacesService::default());
            let (mut search, _rx, _root) = with_suggestions(places);

            let first = search.select(0).unwrap();
            search.clear();

            assert!(search.apply_place(first, Ok(lahore_details())).is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn test_clearing_query_drops_pending_details() {
            let places = Arc::new(MockPlacesService::default());
            let (mut search, _rx, _root) = with_suggestions(places);

            let pending = search.select(0).unwrap();
            assert_eq!(search.input(""), InputOutcome::Cleared);

            assert!(search.apply_place(pending, Ok(lahore_details())).is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn test_retyping_query_drops_pending_details() {
            let places = Arc::new(MockPlacesService::default());
            let (mut search, _rx, _root) = with_suggestions(places);

            let pending = search.select(1).unwrap();
            search.input("lahore c");

            assert!(search.apply_place(pending, Ok(lahore_details())).is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn test_failed_details_are_reported() {
            let places = Arc::new(MockPlacesService::default());
            let (mut search, mut rx, _root) = with_suggestions(places);

            search.select(1).unwrap();
            let Some(SearchEvent::PlaceResolved { ticket, result, .. }) = rx.recv().await else {
                panic!("expected place event");
            };

            let outcome = search.apply_place(ticket, result).unwrap();
            assert!(matches!(outcome, Err(DiscoveryError::NotFound(_))));
        }
    }
}

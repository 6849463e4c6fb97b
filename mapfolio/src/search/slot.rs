//! Logical request slots with generation tokens.
//!
//! A slot represents "the" request for one purpose (suggestions for a field,
//! the dataset fetch, the card label lookup). Beginning a new request cancels
//! the previous one's token and bumps the generation; a completion is only
//! committed when it carries the current generation.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Generation stamp handed to a request when it begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// One logical request slot.
#[derive(Debug)]
pub struct RequestSlot {
    name: &'static str,
    generation: u64,
    in_flight: Option<CancellationToken>,
    parent: CancellationToken,
}

impl RequestSlot {
    /// Create a slot whose request tokens are children of `parent`.
    ///
    /// Cancelling `parent` cancels whatever the slot has in flight.
    pub fn new(name: &'static str, parent: &CancellationToken) -> Self {
        Self {
            name,
            generation: 0,
            in_flight: None,
            parent: parent.clone(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Supersede any in-flight request and start a new one.
    pub fn begin(&mut self) -> (Ticket, CancellationToken) {
        self.cancel_in_flight();
        self.generation += 1;
        let token = self.parent.child_token();
        self.in_flight = Some(token.clone());
        (Ticket(self.generation), token)
    }

    /// True when `ticket` belongs to the most recently begun request.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation && self.in_flight.is_some()
    }

    /// Accept a completion. Returns false for a superseded ticket.
    pub fn finish(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            debug!(
                slot = self.name,
                stale = ticket.0,
                current = self.generation,
                "Discarding superseded result"
            );
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Cancel the in-flight request, if any, so its result is never applied.
    pub fn invalidate(&mut self) {
        self.cancel_in_flight();
        self.generation += 1;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

/// Spawn `task` on the runtime, dropping it as soon as `token` is cancelled.
pub fn spawn_cancellable<F>(token: CancellationToken, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = task => {}
        }
    });
}

//! Stale-result suppression for display surfaces.
//!
//! A surface is a named result slot (a results grid, a feed) whose state must
//! always reflect the most recently issued request. Requests are never
//! cancelled; a response that lost the race is simply not committed.

use std::future::Future;
use tokio::sync::Mutex;

/// Generation number issued by [`DisplaySurface::begin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug)]
struct SurfaceState<T> {
    latest: u64,
    value: Option<T>,
}

/// Outcome of [`DisplaySurface::load`]
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    /// This load was the newest and its value was committed
    Fresh(T),
    /// A newer load was issued meanwhile; carries whatever is committed now
    Stale(Option<T>),
}

#[derive(Debug)]
pub struct DisplaySurface<T> {
    state: Mutex<SurfaceState<T>>,
}

impl<T> Default for DisplaySurface<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(SurfaceState {
                latest: 0,
                value: None,
            }),
        }
    }
}

impl<T: Clone> DisplaySurface<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket newer than every ticket issued before
    pub async fn begin(&self) -> Ticket {
        let mut state = self.state.lock().await;
        state.latest += 1;
        Ticket(state.latest)
    }

    /// Commits `value` unless a newer ticket has been issued since `ticket`
    ///
    /// Returns whether the value was applied.
    pub async fn commit(&self, ticket: Ticket, value: T) -> bool {
        let mut state = self.state.lock().await;
        if ticket.0 != state.latest {
            return false;
        }
        state.value = Some(value);
        true
    }

    pub async fn current(&self) -> Option<T> {
        self.state.lock().await.value.clone()
    }

    /// Runs one request cycle: begin, await `fetch`, commit
    pub async fn load<F>(&self, fetch: F) -> Loaded<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin().await;
        self.load_with_ticket(ticket, fetch).await
    }

    /// Finishes a cycle whose ticket was issued earlier by [`Self::begin`]
    ///
    /// Callers that do other work before the fetch take the ticket first so
    /// ordering follows request arrival.
    pub async fn load_with_ticket<F>(&self, ticket: Ticket, fetch: F) -> Loaded<T>
    where
        F: Future<Output = T>,
    {
        let value = fetch.await;
        if self.commit(ticket, value.clone()).await {
            Loaded::Fresh(value)
        } else {
            tracing::debug!(ticket = ticket.0, "Discarding stale surface result");
            Loaded::Stale(self.current().await)
        }
    }
}

//! Lifecycle transition journal.
//!
//! Provides an immutable in-memory record of the transitions a registry has
//! applied, in order. The journal is observability data only; it never feeds
//! back into dispatch.

use super::event::LifecycleEvent;
use super::state::LifecycleState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single applied lifecycle transition.
///
/// Transitions are immutable values describing a move from one state to
/// another, triggered by an event at a specific point in time.
///
/// # Example
///
/// ```rust
/// use lifeline::core::{LifecycleEvent, LifecycleState, LifecycleTransition};
/// use chrono::Utc;
///
/// let transition = LifecycleTransition {
///     from: LifecycleState::Initialized,
///     to: LifecycleState::Stopped,
///     event: LifecycleEvent::OnCreate,
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.event, LifecycleEvent::OnCreate);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LifecycleTransition {
    /// The state being transitioned from
    pub from: LifecycleState,
    /// The state being transitioned to
    pub to: LifecycleState,
    /// The event that triggered the transition
    pub event: LifecycleEvent,
    /// When the transition was applied
    pub timestamp: DateTime<Utc>,
}

/// Ordered journal of applied lifecycle transitions.
///
/// The journal is immutable: [`record`] returns a new journal with the
/// transition appended, leaving the original untouched.
///
/// # Example
///
/// ```rust
/// use lifeline::core::{
///     LifecycleEvent, LifecycleHistory, LifecycleState, LifecycleTransition,
/// };
/// use chrono::Utc;
///
/// let history = LifecycleHistory::new();
/// let history = history.record(LifecycleTransition {
///     from: LifecycleState::Initialized,
///     to: LifecycleState::Stopped,
///     event: LifecycleEvent::OnCreate,
///     timestamp: Utc::now(),
/// });
/// let history = history.record(LifecycleTransition {
///     from: LifecycleState::Stopped,
///     to: LifecycleState::Started,
///     event: LifecycleEvent::OnStart,
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(
///     history.state_path(),
///     vec![
///         LifecycleState::Initialized,
///         LifecycleState::Stopped,
///         LifecycleState::Started,
///     ],
/// );
/// ```
///
/// [`record`]: LifecycleHistory::record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LifecycleHistory {
    transitions: Vec<LifecycleTransition>,
}

impl Default for LifecycleHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleHistory {
    /// Create a new empty journal.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new journal.
    ///
    /// This is a pure function - it does not mutate the existing journal
    /// but returns a new one with the transition appended.
    pub fn record(&self, transition: LifecycleTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Get all recorded transitions in order.
    pub fn transitions(&self) -> &[LifecycleTransition] {
        &self.transitions
    }

    /// Get the path of states traversed.
    ///
    /// Returns the states in order: the initial state, then the `to` state
    /// of each transition. Empty when nothing has been recorded.
    pub fn state_path(&self) -> Vec<LifecycleState> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(first.from);
        }
        for transition in &self.transitions {
            path.push(transition.to);
        }
        path
    }

    /// Get the most recently recorded transition.
    pub fn latest(&self) -> Option<&LifecycleTransition> {
        self.transitions.last()
    }

    /// Calculate total duration from first to last transition.
    ///
    /// Returns `None` if there are no transitions. Otherwise returns the
    /// duration between the first and last transition timestamps.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// The number of recorded transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

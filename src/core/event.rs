//! Lifecycle events and the event-to-state transition function.
//!
//! Events are instantaneous occurrences reported by a host. The transition
//! function [`LifecycleEvent::state_after`] is total over the enumeration,
//! deterministic, and independent of the current state.

use super::state::LifecycleState;
use serde::{Deserialize, Serialize};

/// An instantaneous lifecycle occurrence reported by a host.
///
/// # Example
///
/// ```rust
/// use lifeline::core::{LifecycleEvent, LifecycleState};
///
/// assert_eq!(
///     LifecycleEvent::OnResume.state_after()?,
///     LifecycleState::Resumed,
/// );
/// # Ok::<(), lifeline::core::LifecycleError>(())
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// Host was created.
    OnCreate,
    /// Host became visible.
    OnStart,
    /// Host entered the foreground.
    OnResume,
    /// Host left the foreground.
    OnPause,
    /// Host is no longer visible.
    OnStop,
    /// Host is being torn down.
    OnDestroy,
    /// Registration-matching sentinel. Never dispatchable: handling it is a
    /// contract violation between host and registry.
    Any,
}

/// Errors raised by lifecycle event handling.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The event has no entry in the transition table. Raised for the `Any`
    /// sentinel so that a new event variant cannot slip through dispatch
    /// without a destination state.
    #[error("event '{}' has no destination state", .0.name())]
    NoDestinationState(LifecycleEvent),
}

impl LifecycleEvent {
    /// Get the event's name for display and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OnCreate => "OnCreate",
            Self::OnStart => "OnStart",
            Self::OnResume => "OnResume",
            Self::OnPause => "OnPause",
            Self::OnStop => "OnStop",
            Self::OnDestroy => "OnDestroy",
            Self::Any => "Any",
        }
    }

    /// The state a host is in after this event.
    ///
    /// Pure mapping with no dependence on the current state: the create and
    /// stop events both land in [`LifecycleState::Stopped`], the start and
    /// pause events both land in [`LifecycleState::Started`].
    ///
    /// Fails for [`LifecycleEvent::Any`], which matches registrations but
    /// never occurs.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lifeline::core::{LifecycleEvent, LifecycleState};
    ///
    /// assert_eq!(
    ///     LifecycleEvent::OnPause.state_after(),
    ///     Ok(LifecycleState::Started),
    /// );
    /// assert!(LifecycleEvent::Any.state_after().is_err());
    /// ```
    pub fn state_after(self) -> Result<LifecycleState, LifecycleError> {
        match self {
            Self::OnCreate | Self::OnStop => Ok(LifecycleState::Stopped),
            Self::OnStart | Self::OnPause => Ok(LifecycleState::Started),
            Self::OnResume => Ok(LifecycleState::Resumed),
            Self::OnDestroy => Ok(LifecycleState::Destroyed),
            Self::Any => Err(LifecycleError::NoDestinationState(self)),
        }
    }
}

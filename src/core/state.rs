//! Lifecycle states.
//!
//! A host is always in exactly one [`LifecycleState`], derived from the last
//! lifecycle event it reported. States are plain values with no behavior of
//! their own beyond naming and classification.

use serde::{Deserialize, Serialize};

/// Position of a host in its lifecycle.
///
/// The state is never set directly; it is always the image of the last
/// handled event under [`LifecycleEvent::state_after`].
///
/// # Example
///
/// ```rust
/// use lifeline::core::LifecycleState;
///
/// let state = LifecycleState::Resumed;
/// assert_eq!(state.name(), "Resumed");
/// assert!(state.is_started());
/// assert!(!state.is_destroyed());
/// ```
///
/// [`LifecycleEvent::state_after`]: crate::core::LifecycleEvent::state_after
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Constructed, but no event handled yet.
    Initialized,
    /// Created but not visible, or no longer visible.
    Stopped,
    /// Visible but not in the foreground.
    Started,
    /// Visible and in the foreground.
    Resumed,
    /// Torn down with its host.
    Destroyed,
}

impl LifecycleState {
    /// Get the state's name for display and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized => "Initialized",
            Self::Stopped => "Stopped",
            Self::Started => "Started",
            Self::Resumed => "Resumed",
            Self::Destroyed => "Destroyed",
        }
    }

    /// Check whether the host is visible (`Started` or `Resumed`).
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started | Self::Resumed)
    }

    /// Check whether the host has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

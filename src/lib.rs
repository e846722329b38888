//! Lifeline: a reentrancy-safe lifecycle observer registry
//!
//! Lifeline tracks the lifecycle state of a host object (a screen, a
//! component container, a session) and notifies registered observers when
//! that state changes. The state is never set directly: each incoming event
//! is mapped through a pure transition function, and observers are notified
//! in registration order - safely, even when a callback adds or removes
//! observers in the registry that is notifying it.
//!
//! # Core Concepts
//!
//! - **Events and states**: closed enumerations with a total transition
//!   function, in [`core`]
//! - **Iteration-safe map**: insertion-ordered storage that tolerates
//!   mutation during traversal, in [`map`]
//! - **Registry**: per-host state tracking and notification, in
//!   [`registry`]
//! - **Signal dispatch**: a most-recent-first chain of cancellable,
//!   lifecycle-gated callbacks, in [`dispatch`]
//!
//! # Example
//!
//! ```rust
//! use lifeline::registry::{from_fn, LifecycleRegistry};
//! use lifeline::{LifecycleEvent, LifecycleState};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let registry = LifecycleRegistry::new("main-screen");
//! let events_seen = Rc::new(Cell::new(0));
//!
//! let observer = {
//!     let events_seen = Rc::clone(&events_seen);
//!     from_fn(move |_provider: &&str, _event| {
//!         events_seen.set(events_seen.get() + 1);
//!     })
//! };
//! registry.add_observer(observer);
//!
//! registry.handle_lifecycle_event(LifecycleEvent::OnCreate)?;
//! registry.handle_lifecycle_event(LifecycleEvent::OnStart)?;
//!
//! assert_eq!(registry.current_state(), LifecycleState::Started);
//! assert_eq!(events_seen.get(), 2);
//! # Ok::<(), lifeline::LifecycleError>(())
//! ```

pub mod core;
pub mod dispatch;
pub mod map;
pub mod registry;

// Re-export commonly used types
pub use core::{
    LifecycleError, LifecycleEvent, LifecycleHistory, LifecycleState, LifecycleTransition,
};
pub use dispatch::{SignalCallback, SignalDispatcher};
pub use map::{SafeCursor, SafeIterableMap};
pub use registry::{from_fn, LifecycleObserver, LifecycleRegistry};

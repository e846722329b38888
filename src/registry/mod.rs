//! Lifecycle state registry with reentrancy-safe notification.
//!
//! [`LifecycleRegistry`] owns the current state of one host, applies the
//! transition function on each incoming event, and notifies observers in
//! registration order. Observers may add or remove observers (themselves
//! included) from inside their own callbacks; the registry never holds a
//! borrow across a callback invocation, so such reentrancy is safe.
//!
//! The model is single-threaded cooperative: every operation runs
//! synchronously on the calling thread, and the owning host is expected to
//! serialize event handling.

pub mod observer;

pub use observer::{from_fn, LifecycleObserver, ObserverId};

use crate::core::{
    LifecycleError, LifecycleEvent, LifecycleHistory, LifecycleState, LifecycleTransition,
};
use crate::map::SafeIterableMap;
use chrono::Utc;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Tracks the lifecycle state of one host and notifies its observers.
///
/// Created once per host, at [`LifecycleState::Initialized`]. The state
/// only moves through [`handle_lifecycle_event`]; it is always the image of
/// the last processed event under the transition function.
///
/// # Example
///
/// ```rust
/// use lifeline::registry::{from_fn, LifecycleRegistry};
/// use lifeline::{LifecycleEvent, LifecycleState};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let registry = LifecycleRegistry::new("detail-screen");
/// assert_eq!(registry.current_state(), LifecycleState::Initialized);
///
/// let notified = Rc::new(Cell::new(0));
/// let observer = {
///     let notified = Rc::clone(&notified);
///     from_fn(move |_: &&str, _| notified.set(notified.get() + 1))
/// };
/// registry.add_observer(observer);
///
/// registry.handle_lifecycle_event(LifecycleEvent::OnCreate)?;
/// registry.handle_lifecycle_event(LifecycleEvent::OnStart)?;
/// registry.handle_lifecycle_event(LifecycleEvent::OnResume)?;
///
/// assert_eq!(registry.current_state(), LifecycleState::Resumed);
/// assert_eq!(notified.get(), 3);
/// # Ok::<(), lifeline::LifecycleError>(())
/// ```
///
/// [`handle_lifecycle_event`]: LifecycleRegistry::handle_lifecycle_event
pub struct LifecycleRegistry<P> {
    /// The provider that owns this lifecycle, forwarded untouched to every
    /// observer callback.
    provider: P,
    /// Observers keyed by identity; tolerates removals and additions during
    /// traversal.
    observers: RefCell<SafeIterableMap<ObserverId, Rc<dyn LifecycleObserver<P>>>>,
    state: Cell<LifecycleState>,
    /// Latest event handed to `handle_lifecycle_event`, processed or not.
    last_event: Cell<Option<LifecycleEvent>>,
    history: RefCell<LifecycleHistory>,
}

impl<P> LifecycleRegistry<P> {
    /// Create a registry for the given provider, at
    /// [`LifecycleState::Initialized`].
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            observers: RefCell::new(SafeIterableMap::new()),
            state: Cell::new(LifecycleState::Initialized),
            last_event: Cell::new(None),
            history: RefCell::new(LifecycleHistory::new()),
        }
    }

    /// The provider that owns this lifecycle.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The current state. No side effects.
    pub fn current_state(&self) -> LifecycleState {
        self.state.get()
    }

    /// The number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// A copy of the transition journal recorded so far.
    pub fn history(&self) -> LifecycleHistory {
        self.history.borrow().clone()
    }

    /// Apply an incoming event and notify observers of the state change.
    ///
    /// Handing over the same event twice in a row is a no-op: the event is
    /// not reprocessed and observers are not re-notified. Only the
    /// immediately previous event is compared - repeated events with
    /// anything in between are each processed.
    ///
    /// Otherwise the new state is computed from the event alone, the
    /// transition is journaled, and every observer is notified with the
    /// provider and the event, in registration order, synchronously on the
    /// calling thread. Observers registered during the pass are not
    /// notified for it; observers removed during the pass are skipped if
    /// they have not been reached yet.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::NoDestinationState`] when the event has no entry
    /// in the transition table ([`LifecycleEvent::Any`]). The call is
    /// aborted and the state left unchanged; nothing is journaled and no
    /// observer runs.
    pub fn handle_lifecycle_event(&self, event: LifecycleEvent) -> Result<(), LifecycleError> {
        if self.last_event.get() == Some(event) {
            return Ok(());
        }
        self.last_event.set(Some(event));

        let to = event.state_after()?;
        let from = self.state.replace(to);
        self.history.replace_with(|history| {
            history.record(LifecycleTransition {
                from,
                to,
                event,
                timestamp: Utc::now(),
            })
        });

        // Hold no borrow while an observer runs: callbacks may re-enter
        // add_observer/remove_observer or even dispatch another event.
        let mut cursor = self.observers.borrow().cursor();
        loop {
            let observer = {
                let observers = self.observers.borrow();
                match cursor.next(&observers) {
                    Some((_, observer)) => Rc::clone(observer),
                    None => break,
                }
            };
            observer.on_state_changed(&self.provider, event);
        }
        Ok(())
    }

    /// Register an observer for all future events.
    ///
    /// Re-adding an already-registered observer (the same `Rc` allocation)
    /// is a no-op; it keeps its original notification position.
    pub fn add_observer(&self, observer: Rc<dyn LifecycleObserver<P>>) {
        let id = ObserverId::of(&observer);
        self.observers.borrow_mut().put_if_absent(id, observer);
    }

    /// Remove an observer; a no-op if it was never registered.
    ///
    /// May be called from inside a notification pass, including by the
    /// observer currently being notified.
    pub fn remove_observer(&self, observer: &Rc<dyn LifecycleObserver<P>>) {
        let id = ObserverId::of(observer);
        self.observers.borrow_mut().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn counting_observer(
        counter: &Rc<Cell<usize>>,
    ) -> Rc<dyn LifecycleObserver<&'static str>> {
        let counter = Rc::clone(counter);
        from_fn(move |_, _| counter.set(counter.get() + 1))
    }

    #[test]
    fn registry_starts_initialized_and_empty() {
        let registry = LifecycleRegistry::new("host");
        assert_eq!(registry.current_state(), LifecycleState::Initialized);
        assert_eq!(registry.observer_count(), 0);
        assert!(registry.history().is_empty());
    }

    #[test]
    fn state_follows_the_transition_function() {
        let registry = LifecycleRegistry::new("host");

        registry
            .handle_lifecycle_event(LifecycleEvent::OnCreate)
            .unwrap();
        assert_eq!(registry.current_state(), LifecycleState::Stopped);

        registry
            .handle_lifecycle_event(LifecycleEvent::OnStart)
            .unwrap();
        assert_eq!(registry.current_state(), LifecycleState::Started);

        registry
            .handle_lifecycle_event(LifecycleEvent::OnResume)
            .unwrap();
        assert_eq!(registry.current_state(), LifecycleState::Resumed);
    }

    #[test]
    fn repeated_event_is_not_reprocessed() {
        let registry = LifecycleRegistry::new("host");
        let count = Rc::new(Cell::new(0));
        registry.add_observer(counting_observer(&count));

        registry
            .handle_lifecycle_event(LifecycleEvent::OnStart)
            .unwrap();
        registry
            .handle_lifecycle_event(LifecycleEvent::OnStart)
            .unwrap();

        assert_eq!(count.get(), 1);
        assert_eq!(registry.history().len(), 1);
    }

    #[test]
    fn dedup_compares_only_the_previous_event() {
        let registry = LifecycleRegistry::new("host");
        let count = Rc::new(Cell::new(0));
        registry.add_observer(counting_observer(&count));

        registry
            .handle_lifecycle_event(LifecycleEvent::OnStart)
            .unwrap();
        registry
            .handle_lifecycle_event(LifecycleEvent::OnResume)
            .unwrap();
        registry
            .handle_lifecycle_event(LifecycleEvent::OnStart)
            .unwrap();

        assert_eq!(count.get(), 3);
        assert_eq!(registry.current_state(), LifecycleState::Started);
    }

    #[test]
    fn duplicate_add_registers_once() {
        let registry = LifecycleRegistry::new("host");
        let count = Rc::new(Cell::new(0));
        let observer = counting_observer(&count);

        registry.add_observer(Rc::clone(&observer));
        registry.add_observer(Rc::clone(&observer));
        assert_eq!(registry.observer_count(), 1);

        registry
            .handle_lifecycle_event(LifecycleEvent::OnCreate)
            .unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn remove_absent_observer_is_a_no_op() {
        let registry = LifecycleRegistry::new("host");
        let observer = from_fn(|_: &&'static str, _| {});
        registry.remove_observer(&observer);
        assert_eq!(registry.observer_count(), 0);
    }

    #[test]
    fn provider_is_forwarded_untouched() {
        let registry = LifecycleRegistry::new("main-screen");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let observer = {
            let seen = Rc::clone(&seen);
            from_fn(move |provider: &&'static str, event: LifecycleEvent| {
                seen.borrow_mut().push((*provider, event));
            })
        };
        registry.add_observer(observer);

        registry
            .handle_lifecycle_event(LifecycleEvent::OnCreate)
            .unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![("main-screen", LifecycleEvent::OnCreate)]
        );
        assert_eq!(*registry.provider(), "main-screen");
    }

    #[test]
    fn invalid_event_aborts_and_leaves_state_unchanged() {
        let registry = LifecycleRegistry::new("host");
        let count = Rc::new(Cell::new(0));
        registry.add_observer(counting_observer(&count));

        registry
            .handle_lifecycle_event(LifecycleEvent::OnStart)
            .unwrap();

        let result = registry.handle_lifecycle_event(LifecycleEvent::Any);
        assert_eq!(
            result,
            Err(LifecycleError::NoDestinationState(LifecycleEvent::Any))
        );
        assert_eq!(registry.current_state(), LifecycleState::Started);
        assert_eq!(count.get(), 1);
        assert_eq!(registry.history().len(), 1);
    }

    #[test]
    fn repeated_invalid_event_is_deduplicated() {
        let registry = LifecycleRegistry::new("host");

        assert!(registry.handle_lifecycle_event(LifecycleEvent::Any).is_err());
        // The failed event is still recorded as last, so the repeat is
        // swallowed by the dedup guard.
        assert!(registry.handle_lifecycle_event(LifecycleEvent::Any).is_ok());
        assert_eq!(registry.current_state(), LifecycleState::Initialized);
    }

    #[test]
    fn observer_can_remove_itself_during_notification() {
        let registry = Rc::new(LifecycleRegistry::new("host"));
        let count = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Rc<dyn LifecycleObserver<&'static str>>>>> =
            Rc::new(RefCell::new(None));

        let observer = {
            let registry = Rc::clone(&registry);
            let count = Rc::clone(&count);
            let slot = Rc::clone(&slot);
            from_fn(move |_, _| {
                count.set(count.get() + 1);
                if let Some(me) = slot.borrow_mut().take() {
                    registry.remove_observer(&me);
                }
            })
        };
        *slot.borrow_mut() = Some(Rc::clone(&observer));

        let tail_count = Rc::new(Cell::new(0));
        registry.add_observer(observer);
        registry.add_observer(counting_observer(&tail_count));

        registry
            .handle_lifecycle_event(LifecycleEvent::OnCreate)
            .unwrap();
        assert_eq!(count.get(), 1);
        assert_eq!(tail_count.get(), 1);
        assert_eq!(registry.observer_count(), 1);

        // Gone for good: the next event only reaches the survivor.
        registry
            .handle_lifecycle_event(LifecycleEvent::OnStart)
            .unwrap();
        assert_eq!(count.get(), 1);
        assert_eq!(tail_count.get(), 2);
    }

    #[test]
    fn observer_removed_mid_pass_is_not_notified() {
        let registry = Rc::new(LifecycleRegistry::new("host"));
        let victim_count = Rc::new(Cell::new(0));
        let victim = counting_observer(&victim_count);

        let remover = {
            let registry = Rc::clone(&registry);
            let victim = Rc::clone(&victim);
            from_fn(move |_, _| registry.remove_observer(&victim))
        };

        // The remover runs first and removes the not-yet-visited victim.
        registry.add_observer(remover);
        registry.add_observer(victim);

        registry
            .handle_lifecycle_event(LifecycleEvent::OnCreate)
            .unwrap();
        assert_eq!(victim_count.get(), 0);
        assert_eq!(registry.observer_count(), 1);
    }

    #[test]
    fn observer_added_mid_pass_sees_only_subsequent_events() {
        let registry = Rc::new(LifecycleRegistry::new("host"));
        let late_count = Rc::new(Cell::new(0));
        let late = counting_observer(&late_count);

        let adder = {
            let registry = Rc::clone(&registry);
            let late = Rc::clone(&late);
            from_fn(move |_, _| registry.add_observer(Rc::clone(&late)))
        };
        registry.add_observer(adder);

        registry
            .handle_lifecycle_event(LifecycleEvent::OnCreate)
            .unwrap();
        assert_eq!(late_count.get(), 0);
        assert_eq!(registry.observer_count(), 2);

        registry
            .handle_lifecycle_event(LifecycleEvent::OnStart)
            .unwrap();
        assert_eq!(late_count.get(), 1);
    }

    #[test]
    fn history_journals_each_processed_event() {
        let registry = LifecycleRegistry::new("host");

        registry
            .handle_lifecycle_event(LifecycleEvent::OnCreate)
            .unwrap();
        registry
            .handle_lifecycle_event(LifecycleEvent::OnStart)
            .unwrap();

        let history = registry.history();
        assert_eq!(history.len(), 2);
        assert_eq!(
            history.state_path(),
            vec![
                LifecycleState::Initialized,
                LifecycleState::Stopped,
                LifecycleState::Started,
            ],
        );
        assert_eq!(history.latest().unwrap().event, LifecycleEvent::OnStart);
    }
}

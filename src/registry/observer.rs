//! Observer trait and registration-time adapters.

use crate::core::LifecycleEvent;
use std::rc::Rc;

/// An entity wishing to be notified of lifecycle state changes.
///
/// `P` is the provider type owning the lifecycle; the registry forwards it
/// to every notification untouched. Implement this trait directly, or wrap
/// a plain closure with [`from_fn`].
pub trait LifecycleObserver<P> {
    /// Called once per processed event, in registration order.
    fn on_state_changed(&self, provider: &P, event: LifecycleEvent);
}

/// Identity key of a registered observer.
///
/// Two registrations refer to the same observer exactly when they share an
/// `Rc` allocation; the key is that allocation's address. The registry
/// holds a strong reference for the life of a registration, so a live key
/// cannot be reused by a new observer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObserverId(*const ());

impl ObserverId {
    pub(crate) fn of<P>(observer: &Rc<dyn LifecycleObserver<P>>) -> Self {
        Self(Rc::as_ptr(observer) as *const ())
    }
}

struct FnObserver<P> {
    callback: Box<dyn Fn(&P, LifecycleEvent)>,
}

impl<P> LifecycleObserver<P> for FnObserver<P> {
    fn on_state_changed(&self, provider: &P, event: LifecycleEvent) {
        (self.callback)(provider, event)
    }
}

/// Wrap a plain closure as a lifecycle observer.
///
/// This is the registration-time resolver: callers that do not want a named
/// observer type hand over a closure and get back a registrable handle.
/// Keep the returned `Rc` around - it is also the identity used by
/// [`LifecycleRegistry::remove_observer`].
///
/// # Example
///
/// ```rust
/// use lifeline::registry::{from_fn, LifecycleRegistry};
/// use lifeline::LifecycleEvent;
///
/// let registry = LifecycleRegistry::new("settings-screen");
/// let observer = from_fn(|provider: &&str, event: LifecycleEvent| {
///     println!("{provider}: {}", event.name());
/// });
/// registry.add_observer(observer);
/// assert_eq!(registry.observer_count(), 1);
/// ```
///
/// [`LifecycleRegistry::remove_observer`]: crate::registry::LifecycleRegistry::remove_observer
pub fn from_fn<P, F>(callback: F) -> Rc<dyn LifecycleObserver<P>>
where
    P: 'static,
    F: Fn(&P, LifecycleEvent) + 'static,
{
    Rc::new(FnObserver {
        callback: Box::new(callback),
    })
}

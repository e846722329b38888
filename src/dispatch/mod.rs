//! Signal dispatch through a chain of cancellable callbacks.
//!
//! [`SignalDispatcher`] forwards each dispatched signal to the most
//! recently added enabled callback - later registrations shadow earlier
//! ones until they are disabled or removed. Registrations can be gated on a
//! host lifecycle via [`SignalDispatcher::add_callback_for`]: the callback
//! participates only while its owner is started and is torn down with it.

use crate::core::LifecycleEvent;
use crate::map::SafeIterableMap;
use crate::registry::{LifecycleObserver, LifecycleRegistry};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Idempotent closure undoing one registration.
type Canceller = Rc<dyn Fn()>;

/// A handler in a [`SignalDispatcher`] chain.
///
/// Carries an enabled flag the handler itself may flip, and tracks every
/// live registration so that [`remove`] detaches the callback from
/// whatever it is attached to - dispatcher and lifecycle alike.
///
/// [`remove`]: SignalCallback::remove
pub struct SignalCallback {
    enabled: Cell<bool>,
    handler: Box<dyn Fn()>,
    cancellables: RefCell<Vec<(u64, Canceller)>>,
}

impl SignalCallback {
    /// Create an enabled callback.
    pub fn new(handler: impl Fn() + 'static) -> Self {
        Self {
            enabled: Cell::new(true),
            handler: Box::new(handler),
            cancellables: RefCell::new(Vec::new()),
        }
    }

    /// Create a disabled callback; it stays registered but is passed over
    /// by dispatch until enabled.
    pub fn disabled(handler: impl Fn() + 'static) -> Self {
        let callback = Self::new(handler);
        callback.enabled.set(false);
        callback
    }

    /// Whether dispatch may pick this callback.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Flip the enabled flag. Callable from inside the handler.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Cancel every live registration of this callback.
    ///
    /// Callable from inside the handler; a no-op when nothing is attached.
    pub fn remove(&self) {
        let cancellables = std::mem::take(&mut *self.cancellables.borrow_mut());
        for (_, cancel) in cancellables {
            cancel();
        }
    }

    fn invoke(&self) {
        (self.handler)()
    }

    fn add_cancellable(&self, token: u64, cancel: Canceller) {
        self.cancellables.borrow_mut().push((token, cancel));
    }

    fn remove_cancellable(&self, token: u64) {
        self.cancellables.borrow_mut().retain(|(t, _)| *t != token);
    }
}

/// Dispatches each signal to the most recently added enabled callback.
///
/// Hosts hold the dispatcher in an `Rc`; registration methods take
/// `&Rc<Self>` so that cancellation handles can refer back to it without
/// keeping it alive.
///
/// # Example
///
/// ```rust
/// use lifeline::dispatch::{SignalCallback, SignalDispatcher};
/// use std::rc::Rc;
///
/// let dispatcher = Rc::new(SignalDispatcher::new());
/// let callback = Rc::new(SignalCallback::new(|| println!("handled")));
/// dispatcher.add_callback(Rc::clone(&callback));
///
/// assert!(dispatcher.dispatch());
/// callback.remove();
/// assert!(!dispatcher.dispatch());
/// ```
pub struct SignalDispatcher {
    callbacks: RefCell<SafeIterableMap<u64, Rc<SignalCallback>>>,
    fallback: Option<Box<dyn Fn()>>,
    next_token: Cell<u64>,
}

impl Default for SignalDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalDispatcher {
    /// Create a dispatcher with no fallback.
    pub fn new() -> Self {
        Self {
            callbacks: RefCell::new(SafeIterableMap::new()),
            fallback: None,
            next_token: Cell::new(0),
        }
    }

    /// Create a dispatcher that runs `fallback` whenever a signal finds no
    /// enabled callback.
    pub fn with_fallback(fallback: impl Fn() + 'static) -> Self {
        Self {
            fallback: Some(Box::new(fallback)),
            ..Self::new()
        }
    }

    fn token(&self) -> u64 {
        let token = self.next_token.get();
        self.next_token.set(token + 1);
        token
    }

    /// Register a callback. Most recent registrations take priority.
    pub fn add_callback(self: &Rc<Self>, callback: Rc<SignalCallback>) {
        self.attach(callback);
    }

    /// Register a callback gated on `lifecycle`.
    ///
    /// The callback attaches to this dispatcher when the owner starts,
    /// detaches when it stops, and is torn down for good - gate observer
    /// included - when it is destroyed. Each start re-attaches it as the
    /// most recent registration. Against an already-destroyed lifecycle
    /// this is a no-op.
    pub fn add_callback_for<P: 'static>(
        self: &Rc<Self>,
        lifecycle: &Rc<LifecycleRegistry<P>>,
        callback: Rc<SignalCallback>,
    ) {
        if lifecycle.current_state().is_destroyed() {
            return;
        }
        let token = self.token();
        let gate = Rc::new_cyclic(|this: &Weak<LifecycleGate<P>>| LifecycleGate {
            dispatcher: Rc::downgrade(self),
            lifecycle: Rc::downgrade(lifecycle),
            callback: Rc::clone(&callback),
            active: RefCell::new(None),
            token,
            this: this.clone(),
        });
        let teardown = Rc::downgrade(&gate);
        callback.add_cancellable(
            token,
            Rc::new(move || {
                if let Some(gate) = teardown.upgrade() {
                    gate.tear_down();
                }
            }),
        );
        lifecycle.add_observer(gate);
    }

    /// Attach `callback` as the most recent registration and hand back the
    /// canceller undoing exactly this registration.
    fn attach(self: &Rc<Self>, callback: Rc<SignalCallback>) -> Canceller {
        let token = self.token();
        self.callbacks
            .borrow_mut()
            .put_if_absent(token, Rc::clone(&callback));

        let dispatcher = Rc::downgrade(self);
        let weak_callback = Rc::downgrade(&callback);
        let cancel: Canceller = Rc::new(move || {
            if let Some(dispatcher) = dispatcher.upgrade() {
                dispatcher.callbacks.borrow_mut().remove(&token);
            }
            if let Some(callback) = weak_callback.upgrade() {
                callback.remove_cancellable(token);
            }
        });
        callback.add_cancellable(token, Rc::clone(&cancel));
        cancel
    }

    /// Forward a signal to the most recently added enabled callback.
    ///
    /// Returns `true` when a callback consumed the signal. When none is
    /// enabled the fallback (if any) runs and `false` is returned. The
    /// invoked callback may disable or remove itself, or dispatch again.
    pub fn dispatch(&self) -> bool {
        let mut cursor = self.callbacks.borrow().cursor_back();
        loop {
            let callback = {
                let callbacks = self.callbacks.borrow();
                match cursor.next(&callbacks) {
                    Some((_, callback)) => Rc::clone(callback),
                    None => break,
                }
            };
            if callback.is_enabled() {
                callback.invoke();
                return true;
            }
        }
        if let Some(fallback) = &self.fallback {
            fallback();
        }
        false
    }

    /// Whether any registered callback is currently enabled.
    pub fn has_enabled_callbacks(&self) -> bool {
        self.callbacks
            .borrow()
            .iter()
            .any(|(_, callback)| callback.is_enabled())
    }

    /// The number of registered callbacks, enabled or not.
    pub fn callback_count(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

/// Observer tying one callback registration to a host lifecycle.
struct LifecycleGate<P> {
    dispatcher: Weak<SignalDispatcher>,
    lifecycle: Weak<LifecycleRegistry<P>>,
    callback: Rc<SignalCallback>,
    /// Canceller for the in-flight dispatcher registration, present only
    /// while the owner is started.
    active: RefCell<Option<Canceller>>,
    token: u64,
    this: Weak<LifecycleGate<P>>,
}

impl<P: 'static> LifecycleGate<P> {
    fn tear_down(&self) {
        if let Some(cancel) = self.active.borrow_mut().take() {
            cancel();
        }
        self.callback.remove_cancellable(self.token);
        if let (Some(lifecycle), Some(this)) = (self.lifecycle.upgrade(), self.this.upgrade()) {
            let observer: Rc<dyn LifecycleObserver<P>> = this;
            lifecycle.remove_observer(&observer);
        }
    }
}

impl<P: 'static> LifecycleObserver<P> for LifecycleGate<P> {
    fn on_state_changed(&self, _provider: &P, event: LifecycleEvent) {
        match event {
            LifecycleEvent::OnStart => {
                if let Some(dispatcher) = self.dispatcher.upgrade() {
                    let cancel = dispatcher.attach(Rc::clone(&self.callback));
                    *self.active.borrow_mut() = Some(cancel);
                }
            }
            LifecycleEvent::OnStop => {
                if let Some(cancel) = self.active.borrow_mut().take() {
                    cancel();
                }
            }
            LifecycleEvent::OnDestroy => self.tear_down(),
            _ => {}
        }
    }
}

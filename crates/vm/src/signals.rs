//! Default one-shot event hub.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::continuation::Continuation;
use crate::object::{Object, ObjectId, ObjectRef};
use crate::tables::EventHub;

#[derive(Debug)]
struct Waiter {
    target: Weak<Object>,
    continuation: Continuation,
}

impl Waiter {
    fn is_live(&self) -> bool {
        self.target.strong_count() > 0 && self.continuation.is_valid()
    }
}

/// Continuations waiting on `(object, signal)` pairs.
///
/// Only signals the target declares (through its script or
/// [`Object::add_user_signal`](crate::Object::add_user_signal)) accept
/// registrations. Registrations die with their target: whenever the hub is
/// touched, waiters on dropped objects are abandoned and waiters resumed or
/// abandoned elsewhere are forgotten.
#[derive(Debug, Default)]
pub struct SignalHub {
    pending: HashMap<(ObjectId, String), Vec<Waiter>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live continuations waiting on `event` of `target`.
    pub fn pending(&self, target: ObjectId, event: &str) -> usize {
        self.pending
            .get(&(target, event.to_string()))
            .map_or(0, |waiters| waiters.iter().filter(|w| w.is_live()).count())
    }

    fn prune(&mut self) {
        self.pending.retain(|_, waiters| {
            waiters.retain(|waiter| {
                if waiter.target.strong_count() == 0 {
                    waiter.continuation.abandon();
                    return false;
                }
                waiter.continuation.is_valid()
            });
            !waiters.is_empty()
        });
    }
}

impl EventHub for SignalHub {
    fn register_one_shot(
        &mut self,
        target: &ObjectRef,
        event: &str,
        continuation: Continuation,
    ) -> bool {
        if !target.has_signal(event) {
            return false;
        }
        self.prune();
        self.pending
            .entry((target.id(), event.to_string()))
            .or_default()
            .push(Waiter {
                target: Rc::downgrade(target),
                continuation,
            });
        true
    }

    fn take(&mut self, target: ObjectId, event: &str) -> Vec<Continuation> {
        self.prune();
        self.pending
            .remove(&(target, event.to_string()))
            .map(|waiters| waiters.into_iter().map(|w| w.continuation).collect())
            .unwrap_or_default()
    }
}

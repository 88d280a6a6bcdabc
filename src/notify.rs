use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

use crate::error::CoreError;

/// A single scheduled delivery: the event name, the optional sub-key, and
/// the payload handed to every matching callback.
#[derive(Debug, Clone)]
pub struct Emission {
    pub event: String,
    pub key: Option<String>,
    pub payload: Value,
}

pub type Callback = Box<dyn FnMut(&Value) + Send>;

/// Subscriber table for one event name. An event is committed to one
/// keying mode by its first registration and may never mix the two.
enum Subscribers {
    Unkeyed(Vec<Callback>),
    Keyed(HashMap<String, Vec<Callback>>),
}

/// Keyed publish/subscribe bus with deferred delivery.
///
/// `signal` never invokes callbacks inline; it enqueues an [`Emission`] on
/// a channel that the application loop drains after the current handling
/// turn, feeding each one back into [`Notifier::deliver`]. That keeps a
/// callback that itself signals from re-entering half-finished mutation.
pub struct Notifier {
    subscriptions: HashMap<String, Subscribers>,
    tx: UnboundedSender<Emission>,
}

/// Cheap clonable emitter for background tasks. Holds only the channel
/// side of the notifier, so fetch and build tasks can signal without any
/// access to the subscriber table.
#[derive(Clone)]
pub struct NotifierHandle {
    tx: UnboundedSender<Emission>,
}

impl NotifierHandle {
    pub fn signal(&self, event: &str, key: Option<&str>, payload: Value) {
        // A closed receiver just means the UI is shutting down.
        let _ = self.tx.send(Emission {
            event: event.to_string(),
            key: key.map(str::to_string),
            payload,
        });
    }
}

impl Notifier {
    /// Create a notifier and the receiving end of its delivery queue.
    /// The caller owns the receiver and is responsible for draining it
    /// into [`Notifier::deliver`] once per idle turn.
    pub fn new() -> (Self, UnboundedReceiver<Emission>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                subscriptions: HashMap::new(),
                tx,
            },
            rx,
        )
    }

    pub fn handle(&self) -> NotifierHandle {
        NotifierHandle {
            tx: self.tx.clone(),
        }
    }

    /// Append `callback` to the subscriber list for `(event, key)`.
    ///
    /// The first registration fixes the event's keying mode; registering
    /// the opposite mode afterwards is `InvalidSubscription`.
    pub fn register<F>(
        &mut self,
        event: &str,
        key: Option<&str>,
        callback: F,
    ) -> Result<(), CoreError>
    where
        F: FnMut(&Value) + Send + 'static,
    {
        trace!(target: "notify", "registering callback on {}/{:?}", event, key);
        let entry = self.subscriptions.entry(event.to_string()).or_insert_with(|| match key {
            Some(_) => Subscribers::Keyed(HashMap::new()),
            None => Subscribers::Unkeyed(Vec::new()),
        });

        match (entry, key) {
            (Subscribers::Unkeyed(callbacks), None) => {
                callbacks.push(Box::new(callback));
                Ok(())
            }
            (Subscribers::Keyed(map), Some(key)) => {
                map.entry(key.to_string())
                    .or_default()
                    .push(Box::new(callback));
                Ok(())
            }
            _ => Err(CoreError::InvalidSubscription {
                event: event.to_string(),
            }),
        }
    }

    /// Schedule every matching callback to run on the next idle turn.
    /// Nothing runs inside this call, but a keying-mode mismatch against
    /// the subscriber table is an error here, at the offending call;
    /// nothing is enqueued for it. The table-less [`NotifierHandle`]
    /// cannot perform this check, so its mismatches surface at delivery.
    pub fn signal(&self, event: &str, key: Option<&str>, payload: Value) -> Result<(), CoreError> {
        match (self.subscriptions.get(event), key) {
            (Some(Subscribers::Unkeyed(_)), Some(_)) | (Some(Subscribers::Keyed(_)), None) => {
                return Err(CoreError::InvalidSubscription {
                    event: event.to_string(),
                });
            }
            _ => {}
        }
        let _ = self.tx.send(Emission {
            event: event.to_string(),
            key: key.map(str::to_string),
            payload,
        });
        Ok(())
    }

    /// Run the callbacks for one drained emission, in registration order.
    ///
    /// An event nobody registered (or a key nobody registered under a keyed
    /// event) is a no-op; a keying-mode mismatch is `InvalidSubscription`.
    /// Returns the number of callbacks invoked.
    pub fn deliver(&mut self, emission: &Emission) -> Result<usize, CoreError> {
        let entry = match self.subscriptions.get_mut(&emission.event) {
            Some(entry) => entry,
            None => return Ok(0),
        };

        let callbacks = match (entry, &emission.key) {
            (Subscribers::Unkeyed(callbacks), None) => callbacks,
            (Subscribers::Keyed(map), Some(key)) => match map.get_mut(key) {
                Some(callbacks) => callbacks,
                None => return Ok(0),
            },
            _ => {
                return Err(CoreError::InvalidSubscription {
                    event: emission.event.clone(),
                })
            }
        };

        if !callbacks.is_empty() {
            trace!(
                target: "notify",
                "triggering {} callbacks on {}/{:?}",
                callbacks.len(),
                emission.event,
                emission.key
            );
        }
        for callback in callbacks.iter_mut() {
            callback(&emission.payload);
        }
        Ok(callbacks.len())
    }
}

use model::events::Event;
use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

type Senders = HashMap<u64, Box<dyn Any + Send + Sync>>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    event_type_id: TypeId,
    subscriber_id: u64,
}

/// Typed fan-out of lifecycle events to bounded channels.
///
/// Publishing never waits on a subscriber: when a subscriber's channel is
/// full or closed the event is dropped for that subscriber only.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<HashMap<TypeId, Senders>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber for `E` and returns its receiving end.
    pub async fn subscribe<E>(&self, capacity: usize) -> (Subscription, mpsc::Receiver<Arc<E>>)
    where
        E: Event + Clone,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let event_type_id = TypeId::of::<E>();
        let subscriber_id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.subscribers
            .write()
            .await
            .entry(event_type_id)
            .or_default()
            .insert(subscriber_id, Box::new(sender));

        debug!(
            event_type = type_name::<E>(),
            subscriber_id, "Subscribed to events"
        );

        let subscription = Subscription {
            event_type_id,
            subscriber_id,
        };
        (subscription, receiver)
    }

    pub async fn publish<E>(&self, event: E)
    where
        E: Event + Clone,
    {
        let subscribers = self.subscribers.read().await;
        let Some(senders) = subscribers.get(&TypeId::of::<E>()) else {
            return;
        };

        let event = Arc::new(event);
        for (subscriber_id, sender) in senders {
            let Some(sender) = sender.downcast_ref::<mpsc::Sender<Arc<E>>>() else {
                continue;
            };
            if let Err(err) = sender.try_send(event.clone()) {
                warn!(
                    event_type = event.event_type(),
                    subscriber_id,
                    error = %err,
                    "Dropped event for subscriber"
                );
            }
        }
    }

    pub async fn unsubscribe(&self, subscription: Subscription) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(senders) = subscribers.get_mut(&subscription.event_type_id) {
            senders.remove(&subscription.subscriber_id);
            if senders.is_empty() {
                subscribers.remove(&subscription.event_type_id);
            }
        }
    }

    pub async fn subscriber_count<E: Event>(&self) -> usize {
        self.subscribers
            .read()
            .await
            .get(&TypeId::of::<E>())
            .map_or(0, HashMap::len)
    }
}

//! Change-notification feed for order and product collections.
//!
//! Every mutation publishes a `{collection, action, id}` event to an
//! in-process broadcast channel; subscribers receive them over SSE and decide
//! whether to refetch or patch their local copy. Events are dropped when no
//! subscriber is listening, which is fine: they are notifications, not a
//! durable log.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Orders,
    Products,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Orders => "orders",
            Collection::Products => "products",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub action: ChangeAction,
    pub id: Uuid,
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, collection: Collection, action: ChangeAction, id: Uuid) {
        let event = ChangeEvent {
            collection,
            action,
            id,
        };
        // send only fails when there are no receivers; nothing to do then.
        if self.sender.send(event).is_err() {
            tracing::debug!(collection = collection.as_str(), "change event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();

        let id = Uuid::new_v4();
        feed.publish(Collection::Orders, ChangeAction::Updated, id);

        let event = rx.recv().await.expect("event");
        assert_eq!(event.collection, Collection::Orders);
        assert_eq!(event.action, ChangeAction::Updated);
        assert_eq!(event.id, id);
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_a_no_op() {
        let feed = ChangeFeed::default();
        feed.publish(Collection::Products, ChangeAction::Deleted, Uuid::new_v4());
    }
}

//! Mock queue implementation for testing.
//!
//! Messages move from `pending` to `in_flight` on receive and are removed
//! on acknowledge. `release_unacknowledged` plays the role of an expired
//! visibility timeout.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AckToken, MessageQueue, QueueError, QueueMessage, Result};

#[derive(Debug, Clone)]
struct StoredMessage {
    seq: u64,
    id: String,
    body: Vec<u8>,
}

#[derive(Default)]
struct State {
    pending: VecDeque<StoredMessage>,
    in_flight: HashMap<AckToken, StoredMessage>,
    acknowledged: Vec<AckToken>,
    published: usize,
    next_id: u64,
    receive_calls: usize,
}

/// Mock message queue for testing.
#[derive(Default)]
pub struct MockQueue {
    state: RwLock<State>,
    fail_on_publish: RwLock<bool>,
    fail_on_receive: RwLock<bool>,
    fail_on_acknowledge: RwLock<bool>,
}

impl MockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue pre-loaded with the given bodies, in order.
    pub async fn with_messages<I, B>(bodies: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        let queue = Self::new();
        for body in bodies {
            queue.enqueue(body.into()).await;
        }
        queue
    }

    async fn enqueue(&self, body: Vec<u8>) -> String {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = format!("msg-{}", state.next_id);
        let seq = state.next_id;
        state.pending.push_back(StoredMessage {
            seq,
            id: id.clone(),
            body,
        });
        id
    }

    pub async fn set_fail_on_publish(&self, fail: bool) {
        *self.fail_on_publish.write().await = fail;
    }

    pub async fn set_fail_on_receive(&self, fail: bool) {
        *self.fail_on_receive.write().await = fail;
    }

    pub async fn set_fail_on_acknowledge(&self, fail: bool) {
        *self.fail_on_acknowledge.write().await = fail;
    }

    /// Total number of successful publish calls.
    pub async fn published_count(&self) -> usize {
        self.state.read().await.published
    }

    /// Messages waiting to be received.
    pub async fn pending_count(&self) -> usize {
        self.state.read().await.pending.len()
    }

    /// Messages received but not yet acknowledged.
    pub async fn in_flight_count(&self) -> usize {
        self.state.read().await.in_flight.len()
    }

    /// Tokens acknowledged so far, in acknowledgment order.
    pub async fn acknowledged(&self) -> Vec<AckToken> {
        self.state.read().await.acknowledged.clone()
    }

    pub async fn receive_calls(&self) -> usize {
        self.state.read().await.receive_calls
    }

    /// Bodies of all pending messages, in queue order.
    pub async fn pending_bodies(&self) -> Vec<Vec<u8>> {
        self.state
            .read()
            .await
            .pending
            .iter()
            .map(|m| m.body.clone())
            .collect()
    }

    /// Return every in-flight message to the queue, as if its visibility
    /// timeout expired.
    pub async fn release_unacknowledged(&self) -> usize {
        let mut state = self.state.write().await;
        let mut released: Vec<StoredMessage> = state.in_flight.drain().map(|(_, m)| m).collect();
        released.sort_by_key(|m| m.seq);
        let count = released.len();
        for message in released.into_iter().rev() {
            state.pending.push_front(message);
        }
        count
    }
}

#[async_trait]
impl MessageQueue for MockQueue {
    async fn publish(&self, body: &[u8]) -> Result<Option<String>> {
        if *self.fail_on_publish.read().await {
            return Err(QueueError::Publish("Mock publish failure".to_string()));
        }
        let id = self.enqueue(body.to_vec()).await;
        self.state.write().await.published += 1;
        Ok(Some(id))
    }

    async fn receive(&self, max_messages: usize, _wait: Duration) -> Result<Vec<QueueMessage>> {
        if *self.fail_on_receive.read().await {
            return Err(QueueError::Receive("Mock receive failure".to_string()));
        }
        let mut state = self.state.write().await;
        state.receive_calls += 1;

        let take = max_messages.min(state.pending.len());
        let drained: Vec<StoredMessage> = state.pending.drain(..take).collect();
        let mut batch = Vec::with_capacity(take);
        for message in drained {
            let token = AckToken::new(format!("receipt-{}-{}", message.id, state.receive_calls));
            batch.push(QueueMessage {
                message_id: Some(message.id.clone()),
                body: message.body.clone(),
                ack_token: Some(token.clone()),
            });
            state.in_flight.insert(token, message);
        }
        Ok(batch)
    }

    async fn acknowledge(&self, token: &AckToken) -> Result<()> {
        if *self.fail_on_acknowledge.read().await {
            return Err(QueueError::Acknowledge("Mock acknowledge failure".to_string()));
        }
        let mut state = self.state.write().await;
        if state.in_flight.remove(token).is_none() {
            return Err(QueueError::Acknowledge(format!(
                "Unknown or expired receipt: {}",
                token
            )));
        }
        state.acknowledged.push(token.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_WAIT: Duration = Duration::ZERO;

    #[tokio::test]
    async fn test_mock_queue_publish_then_receive_in_order() {
        let queue = MockQueue::new();
        queue.publish(b"one").await.unwrap();
        queue.publish(b"two").await.unwrap();

        let batch = queue.receive(10, NO_WAIT).await.unwrap();
        let bodies: Vec<&[u8]> = batch.iter().map(|m| m.body.as_slice()).collect();
        assert_eq!(bodies, vec![b"one".as_slice(), b"two".as_slice()]);
        assert_eq!(queue.published_count().await, 2);
    }

    #[tokio::test]
    async fn test_mock_queue_receive_respects_max() {
        let queue = MockQueue::with_messages(["a", "b", "c"]).await;

        let batch = queue.receive(2, NO_WAIT).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(queue.pending_count().await, 1);
        assert_eq!(queue.in_flight_count().await, 2);
    }

    #[tokio::test]
    async fn test_mock_queue_receive_empty() {
        let queue = MockQueue::new();
        assert!(queue.receive(10, NO_WAIT).await.unwrap().is_empty());
        assert_eq!(queue.receive_calls().await, 1);
    }

    #[tokio::test]
    async fn test_mock_queue_acknowledge_removes_message() {
        let queue = MockQueue::with_messages(["a"]).await;
        let batch = queue.receive(10, NO_WAIT).await.unwrap();

        queue.acknowledge(batch[0].ack_token.as_ref().unwrap()).await.unwrap();

        assert_eq!(queue.in_flight_count().await, 0);
        assert_eq!(queue.acknowledged().await, vec![batch[0].ack_token.clone().unwrap()]);
        assert_eq!(queue.release_unacknowledged().await, 0);
    }

    #[tokio::test]
    async fn test_mock_queue_double_acknowledge_fails() {
        let queue = MockQueue::with_messages(["a"]).await;
        let batch = queue.receive(10, NO_WAIT).await.unwrap();

        queue.acknowledge(batch[0].ack_token.as_ref().unwrap()).await.unwrap();
        let result = queue.acknowledge(batch[0].ack_token.as_ref().unwrap()).await;
        assert!(matches!(result, Err(QueueError::Acknowledge(_))));
    }

    #[tokio::test]
    async fn test_mock_queue_release_redelivers_in_original_order() {
        let queue = MockQueue::with_messages(["a", "b", "c"]).await;
        let _ = queue.receive(2, NO_WAIT).await.unwrap();

        assert_eq!(queue.release_unacknowledged().await, 2);
        assert_eq!(
            queue.pending_bodies().await,
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_mock_queue_fail_on_publish() {
        let queue = MockQueue::new();
        queue.set_fail_on_publish(true).await;

        assert!(queue.publish(b"x").await.is_err());
        assert_eq!(queue.published_count().await, 0);
        assert_eq!(queue.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_mock_queue_fail_on_receive() {
        let queue = MockQueue::with_messages(["a"]).await;
        queue.set_fail_on_receive(true).await;

        let result = queue.receive(10, NO_WAIT).await;
        assert!(matches!(result, Err(QueueError::Receive(_))));
        assert_eq!(queue.pending_count().await, 1);
    }
}

//! Outbox — per-user ordered outbound queue with pacing and cancellation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::notifier::{Notifier, OutboundMessage};

enum OutboxItem {
    Message(OutboundMessage),
    /// Resolved once every item queued before it has been handled.
    Barrier(oneshot::Sender<()>),
}

struct UserQueue {
    tx: mpsc::UnboundedSender<OutboxItem>,
    handle: JoinHandle<()>,
}

/// Delivers messages to each user in order, at most one per `delay`.
///
/// Every user gets a drainer task feeding their messages to the notifier.
/// [`Outbox::cancel`] aborts that task, so messages that were queued but not
/// yet sent are dropped; a later [`Outbox::enqueue`] starts a fresh queue.
pub struct Outbox {
    notifier: Arc<dyn Notifier>,
    delay: Duration,
    queues: Mutex<HashMap<String, UserQueue>>,
}

impl Outbox {
    pub fn new(notifier: Arc<dyn Notifier>, delay: Duration) -> Self {
        Self {
            notifier,
            delay,
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Queue messages for a user, preserving their order.
    pub async fn enqueue(&self, user_id: &str, messages: Vec<OutboundMessage>) {
        if messages.is_empty() {
            return;
        }
        let mut queues = self.queues.lock().await;
        for message in messages {
            self.push(&mut queues, user_id, OutboxItem::Message(message));
        }
    }

    /// Drop everything still queued for a user. Returns whether a queue existed.
    pub async fn cancel(&self, user_id: &str) -> bool {
        let removed = self.queues.lock().await.remove(user_id);
        match removed {
            Some(queue) => {
                queue.handle.abort();
                debug!(user_id, "Cancelled outbound queue");
                true
            }
            None => false,
        }
    }

    /// Wait until everything queued so far for a user has been handed to the
    /// notifier. Returns early if the queue is cancelled meanwhile.
    pub async fn flush(&self, user_id: &str) {
        let (done_tx, done_rx) = oneshot::channel();
        {
            let mut queues = self.queues.lock().await;
            if !queues.contains_key(user_id) {
                return;
            }
            self.push(&mut queues, user_id, OutboxItem::Barrier(done_tx));
        }
        let _ = done_rx.await;
    }

    /// Number of users with a live queue.
    pub async fn active_queues(&self) -> usize {
        self.queues.lock().await.len()
    }

    fn push(&self, queues: &mut HashMap<String, UserQueue>, user_id: &str, item: OutboxItem) {
        let item = match queues.get(user_id) {
            Some(queue) => match queue.tx.send(item) {
                Ok(()) => return,
                // Drainer is gone; fall through and start a new one.
                Err(mpsc::error::SendError(item)) => item,
            },
            None => item,
        };

        let queue = self.spawn_queue(user_id);
        if queue.tx.send(item).is_err() {
            warn!(user_id, "Fresh outbound queue rejected message");
        }
        queues.insert(user_id.to_string(), queue);
    }

    fn spawn_queue(&self, user_id: &str) -> UserQueue {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(drain(
            user_id.to_string(),
            Arc::clone(&self.notifier),
            self.delay,
            rx,
        ));
        UserQueue { tx, handle }
    }
}

impl Drop for Outbox {
    fn drop(&mut self) {
        for (_, queue) in self.queues.get_mut().drain() {
            queue.handle.abort();
        }
    }
}

async fn drain(
    user_id: String,
    notifier: Arc<dyn Notifier>,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<OutboxItem>,
) {
    let mut last_sent: Option<Instant> = None;

    while let Some(item) = rx.recv().await {
        match item {
            OutboxItem::Message(message) => {
                if let Some(last) = last_sent {
                    tokio::time::sleep_until(last + delay).await;
                }
                if let Err(e) = notifier.send(&user_id, &message).await {
                    warn!(
                        user_id = %user_id,
                        channel = notifier.name(),
                        error = %e,
                        "Failed to deliver outbound message"
                    );
                }
                last_sent = Some(Instant::now());
            }
            OutboxItem::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::ChannelError;

    #[derive(Default)]
    struct Recorder {
        sent: std::sync::Mutex<Vec<(String, String)>>,
    }

    impl Recorder {
        fn bodies(&self, user: &str) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|(u, _)| u == user)
                .map(|(_, b)| b.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Notifier for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn send(&self, user_id: &str, message: &OutboundMessage) -> Result<(), ChannelError> {
            if message.body() == "boom" {
                return Err(ChannelError::SendFailed {
                    name: "recorder".into(),
                    reason: "boom".into(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((user_id.to_string(), message.body().to_string()));
            Ok(())
        }
    }

    fn texts(items: &[&str]) -> Vec<OutboundMessage> {
        items.iter().map(|t| OutboundMessage::text(*t)).collect()
    }

    #[tokio::test]
    async fn delivers_in_order_per_user() {
        let recorder = Arc::new(Recorder::default());
        let outbox = Outbox::new(recorder.clone(), Duration::ZERO);

        outbox.enqueue("a", texts(&["1", "2"])).await;
        outbox.enqueue("b", texts(&["x"])).await;
        outbox.enqueue("a", texts(&["3"])).await;
        outbox.flush("a").await;
        outbox.flush("b").await;

        assert_eq!(recorder.bodies("a"), vec!["1", "2", "3"]);
        assert_eq!(recorder.bodies("b"), vec!["x"]);
        assert_eq!(outbox.active_queues().await, 2);
    }

    #[tokio::test]
    async fn send_failures_do_not_stop_the_queue() {
        let recorder = Arc::new(Recorder::default());
        let outbox = Outbox::new(recorder.clone(), Duration::ZERO);

        outbox.enqueue("a", texts(&["1", "boom", "2"])).await;
        outbox.flush("a").await;

        assert_eq!(recorder.bodies("a"), vec!["1", "2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn paces_consecutive_messages() {
        let recorder = Arc::new(Recorder::default());
        let outbox = Outbox::new(recorder.clone(), Duration::from_secs(1));
        let started = Instant::now();

        outbox.enqueue("a", texts(&["1", "2", "3"])).await;
        outbox.flush("a").await;

        assert_eq!(recorder.bodies("a").len(), 3);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_undelivered_messages() {
        let recorder = Arc::new(Recorder::default());
        let outbox = Outbox::new(recorder.clone(), Duration::from_secs(10));

        outbox.enqueue("a", texts(&["1", "2", "3"])).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(outbox.cancel("a").await);

        outbox.enqueue("a", texts(&["fresh"])).await;
        outbox.flush("a").await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(recorder.bodies("a"), vec!["1", "fresh"]);
    }

    #[tokio::test]
    async fn flush_and_cancel_without_queue() {
        let outbox = Outbox::new(Arc::new(Recorder::default()), Duration::ZERO);
        outbox.flush("nobody").await;
        assert!(!outbox.cancel("nobody").await);
    }
}

//! Orchestrator — applies inbound events to sessions and queues the replies.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, info, warn};

use crate::channels::{Notifier, OutboundMessage, Outbox};
use crate::config::ConversationConfig;
use crate::dataset::DatasetSource;
use crate::matching::MatchEngine;
use crate::session::{Question, Session, SessionStore, Stage, Transition};

use super::InboundEvent;
use super::prompts;

/// An event waiting for its user's worker, with the span it arrived under.
type QueuedEvent = (InboundEvent, Span);

struct UserInbox {
    tx: mpsc::UnboundedSender<QueuedEvent>,
    handle: JoinHandle<()>,
}

/// Drives every user's conversation.
pub struct Orchestrator {
    config: ConversationConfig,
    engine: MatchEngine,
    sessions: SessionStore,
    source: Arc<dyn DatasetSource>,
    outbox: Outbox,
    inboxes: Mutex<HashMap<String, UserInbox>>,
}

impl Orchestrator {
    pub fn new(
        config: ConversationConfig,
        engine: MatchEngine,
        source: Arc<dyn DatasetSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let outbox = Outbox::new(notifier, config.message_delay);
        Self {
            config,
            engine,
            sessions: SessionStore::new(),
            source,
            outbox,
            inboxes: Mutex::new(HashMap::new()),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Queue an event behind every earlier event from the same user.
    ///
    /// Each user has a worker task applying their events one at a time in
    /// submission order; different users proceed in parallel. Returns once the
    /// event is queued, not once it is handled.
    pub async fn submit(self: &Arc<Self>, event: InboundEvent) {
        let item = (event, Span::current());
        let mut inboxes = self.inboxes.lock().await;
        let user_id = item.0.sender_id.clone();

        let item = match inboxes.get(&user_id) {
            Some(inbox) => match inbox.tx.send(item) {
                Ok(()) => return,
                // Worker is gone; fall through and start a new one.
                Err(mpsc::error::SendError(item)) => item,
            },
            None => item,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(process_inbox(Arc::downgrade(self), rx));
        if tx.send(item).is_err() {
            warn!(user_id = %user_id, "Fresh inbound queue rejected event");
        }
        debug!(user_id = %user_id, "Started inbound queue");
        inboxes.insert(user_id, UserInbox { tx, handle });
    }

    /// Number of users with a live inbound queue.
    pub async fn active_inboxes(&self) -> usize {
        self.inboxes.lock().await.len()
    }

    /// Apply one inbound event.
    ///
    /// Concurrent calls for the same user are applied in lock order, not
    /// arrival order; intake goes through [`Orchestrator::submit`].
    ///
    /// Returns once the session has been updated and its replies queued. When
    /// the event completes the questionnaire this also awaits the dataset
    /// fetch and queues the first result; the session is unlocked meanwhile.
    pub async fn handle(&self, event: InboundEvent) {
        let user_id = event.sender_id.as_str();
        let keywords = &self.config.keywords;

        let mut session = self.sessions.lock(user_id).await;
        session.touch();
        let from = session.stage();
        let transition = session.advance(event.input(), keywords);
        debug!(
            user_id,
            from = %from,
            to = %session.stage(),
            ?transition,
            "Session advanced"
        );

        let messages = match transition {
            Transition::Remind => vec![prompts::reminder(keywords)],
            Transition::Ask(question) if from == Stage::Idle => vec![
                prompts::greeting(keywords),
                prompts::question(question, self.engine.buckets()),
            ],
            Transition::Ask(question) => {
                vec![prompts::question(question, self.engine.buckets())]
            }
            Transition::Restart => {
                self.outbox.cancel(user_id).await;
                vec![
                    prompts::restarted(),
                    prompts::question(Question::first(), self.engine.buckets()),
                ]
            }
            Transition::Stop => {
                self.outbox.cancel(user_id).await;
                vec![prompts::stopped(keywords)]
            }
            Transition::StillFetching => vec![prompts::still_searching()],
            Transition::TextOnly => vec![prompts::text_only()],
            Transition::Finish => vec![prompts::closing()],
            Transition::ShowNext => self.next_result(user_id, &mut session),
            Transition::StartFetch { generation } => {
                self.outbox.enqueue(user_id, vec![prompts::searching()]).await;
                drop(session);
                self.run_search(user_id, generation).await;
                return;
            }
        };

        self.outbox.enqueue(user_id, messages).await;
    }

    /// Fetch a dataset for the search started at `generation` and show the
    /// first match. Results for a session that was reset or restarted in the
    /// meantime are discarded.
    async fn run_search(&self, user_id: &str, generation: u64) {
        let result = self.source.fetch().await;

        let mut session = self.sessions.lock(user_id).await;
        if !session.awaits_fetch(generation) {
            debug!(
                user_id,
                generation,
                current = session.generation(),
                "Discarding stale search result"
            );
            return;
        }

        let messages = match result {
            Ok(dataset) => {
                info!(user_id, records = dataset.len(), "Search dataset ready");
                session.begin_browsing(Arc::new(dataset));
                self.next_result(user_id, &mut session)
            }
            Err(e) => {
                warn!(user_id, error = %e, "Dataset fetch failed");
                session.reset();
                vec![prompts::fetch_failed(&self.config.keywords)]
            }
        };

        self.outbox.enqueue(user_id, messages).await;
    }

    fn next_result(&self, user_id: &str, session: &mut Session) -> Vec<OutboundMessage> {
        match session.scan_next(&self.engine) {
            Some((index, record)) => {
                debug!(user_id, index, "Found matching listing");
                prompts::listing(&record, self.engine.codes(), &self.config.keywords)
            }
            None => {
                debug!(user_id, "No more matching listings");
                vec![prompts::no_more_results(&self.config.keywords)]
            }
        }
    }

    /// Drop sessions idle past the configured timeout, along with their
    /// inbound and outbound queues. Returns how many were removed.
    pub async fn prune_idle(&self) -> usize {
        let removed = self
            .sessions
            .prune_idle(self.config.session_idle_timeout)
            .await;
        for user_id in &removed {
            self.outbox.cancel(user_id).await;
            // Dropping the sender lets the worker finish anything queued and exit.
            self.inboxes.lock().await.remove(user_id);
        }
        if !removed.is_empty() {
            info!(count = removed.len(), "Pruned idle sessions");
        }
        removed.len()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        for (_, inbox) in self.inboxes.get_mut().drain() {
            inbox.handle.abort();
        }
    }
}

async fn process_inbox(
    orchestrator: Weak<Orchestrator>,
    mut rx: mpsc::UnboundedReceiver<QueuedEvent>,
) {
    while let Some((event, span)) = rx.recv().await {
        let Some(orchestrator) = orchestrator.upgrade() else {
            break;
        };
        orchestrator.handle(event).instrument(span).await;
    }
}

/// Spawn a background task that prunes idle sessions every `prune_interval`.
pub fn spawn_prune_task(orchestrator: Arc<Orchestrator>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(orchestrator.config.prune_interval);
        // Skip immediate first tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            orchestrator.prune_idle().await;
        }
    })
}

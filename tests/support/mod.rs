//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use rent_finder::channels::{Notifier, OutboundMessage};
use rent_finder::config::ConversationConfig;
use rent_finder::conversation::Orchestrator;
use rent_finder::dataset::{Dataset, DatasetSource, Record};
use rent_finder::error::{ChannelError, DatasetError};
use rent_finder::matching::MatchEngine;
use rent_finder::session::Stage;

/// Maximum time any test is allowed to wait before we consider it hung.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Notifier that records everything it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, OutboundMessage)>>,
}

impl RecordingNotifier {
    pub fn messages(&self, user_id: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn bodies(&self, user_id: &str) -> Vec<String> {
        self.messages(user_id)
            .iter()
            .map(|m| m.body().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, user_id: &str, message: &OutboundMessage) -> Result<(), ChannelError> {
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), message.clone()));
        Ok(())
    }
}

/// Serves queued datasets in order, repeating the last one.
pub struct QueuedSource {
    datasets: Mutex<VecDeque<Dataset>>,
    calls: AtomicUsize,
}

impl QueuedSource {
    pub fn new(datasets: Vec<Dataset>) -> Self {
        Self {
            datasets: Mutex::new(datasets.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn single(dataset: Dataset) -> Self {
        Self::new(vec![dataset])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetSource for QueuedSource {
    async fn fetch(&self) -> Result<Dataset, DatasetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut datasets = self.datasets.lock().unwrap();
        let dataset = if datasets.len() > 1 {
            datasets.pop_front().unwrap_or_default()
        } else {
            datasets.front().cloned().unwrap_or_default()
        };
        Ok(dataset)
    }
}

/// Always fails like an unreachable host.
pub struct FailingSource;

#[async_trait]
impl DatasetSource for FailingSource {
    async fn fetch(&self) -> Result<Dataset, DatasetError> {
        Err(DatasetError::Transport {
            url: "http://unreachable.test/data.json".into(),
            reason: "connection refused".into(),
        })
    }
}

/// Blocks every fetch until released.
pub struct GatedSource {
    dataset: Dataset,
    pub started: Notify,
    pub release: Notify,
}

impl GatedSource {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl DatasetSource for GatedSource {
    async fn fetch(&self) -> Result<Dataset, DatasetError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.dataset.clone())
    }
}

pub fn orchestrator(
    source: Arc<dyn DatasetSource>,
    notifier: Arc<RecordingNotifier>,
) -> Arc<Orchestrator> {
    let config = ConversationConfig {
        message_delay: Duration::ZERO,
        ..ConversationConfig::default()
    };
    Arc::new(Orchestrator::new(
        config,
        MatchEngine::default(),
        source,
        notifier,
    ))
}

pub fn listing(
    title: &str,
    district: &str,
    rent: &str,
    house_type: &str,
    internet: &str,
    water: &str,
    electricity: &str,
) -> Record {
    Record {
        title: title.into(),
        district: district.into(),
        address: format!("新竹縣{district}"),
        rent: rent.into(),
        house_type: house_type.into(),
        internet: internet.into(),
        water: water.into(),
        electricity: electricity.into(),
        contact: "王先生".into(),
        phone: "0912-345-678".into(),
        ..Record::default()
    }
}

/// Poll until the user's session reaches a stage satisfying `predicate`.
pub async fn wait_for_stage<F>(orchestrator: &Orchestrator, user_id: &str, predicate: F)
where
    F: Fn(Stage) -> bool,
{
    tokio::time::timeout(TEST_TIMEOUT, async {
        loop {
            if let Some(stage) = orchestrator.sessions().stage(user_id).await {
                if predicate(stage) {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session never reached the expected stage");
}

//! Conversation state machine — tracks where each user is in the questionnaire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Keywords;
use crate::dataset::{Dataset, Record};
use crate::matching::{Criteria, Field, MatchEngine};

use super::cursor::SearchCursor;

/// The fixed questionnaire, in the order it is asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Question {
    Area,
    Rent,
    HouseType,
    Internet,
    Water,
    Electricity,
}

impl Question {
    pub const ALL: [Question; 6] = [
        Question::Area,
        Question::Rent,
        Question::HouseType,
        Question::Internet,
        Question::Water,
        Question::Electricity,
    ];

    pub fn first() -> Self {
        Self::ALL[0]
    }

    /// Zero-based position in the questionnaire.
    pub fn index(&self) -> usize {
        match self {
            Self::Area => 0,
            Self::Rent => 1,
            Self::HouseType => 2,
            Self::Internet => 3,
            Self::Water => 4,
            Self::Electricity => 5,
        }
    }

    /// The following question, or `None` after the last one.
    pub fn next(&self) -> Option<Question> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Criteria field this question fills.
    pub fn field(&self) -> Field {
        match self {
            Self::Area => Field::Area,
            Self::Rent => Field::Rent,
            Self::HouseType => Field::HouseType,
            Self::Internet => Field::Internet,
            Self::Water => Field::Water,
            Self::Electricity => Field::Electricity,
        }
    }
}

/// Where a session is in the conversation.
///
/// Progresses Idle → Answering(Area) → … → Answering(Electricity) →
/// Fetching → Browsing → Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage", content = "question")]
pub enum Stage {
    #[default]
    Idle,
    Answering(Question),
    /// Last answer received, dataset fetch in flight.
    Fetching,
    /// Showing results one at a time.
    Browsing,
}

impl Stage {
    /// Largest value [`Stage::index`] can return.
    pub const MAX_INDEX: usize = Question::ALL.len() + 2;

    /// Integer view: 0 idle, 1..=K questions, K+1 fetching, K+2 browsing.
    pub fn index(&self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Answering(q) => q.index() + 1,
            Self::Fetching => Question::ALL.len() + 1,
            Self::Browsing => Self::MAX_INDEX,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Answering(q) => write!(f, "answering({})", q.field()),
            Self::Fetching => write!(f, "fetching"),
            Self::Browsing => write!(f, "browsing"),
        }
    }
}

/// What the orchestrator must do after a session consumed an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle and the input was not the start keyword.
    Remind,
    /// Ask this question next.
    Ask(Question),
    /// All answers collected; fetch the dataset for this generation.
    StartFetch { generation: u64 },
    /// Input arrived while the fetch is still running.
    StillFetching,
    /// Browsing and the user asked for another result.
    ShowNext,
    /// Browsing and the user declined; session is idle again.
    Finish,
    /// Reset keyword: everything cleared, first question asked again.
    Restart,
    /// Stop keyword: everything cleared, session idle.
    Stop,
    /// Non-text input; nothing changed.
    TextOnly,
}

/// One user's conversation.
#[derive(Debug, Clone)]
pub struct Session {
    stage: Stage,
    criteria: Criteria,
    search: Option<SearchCursor>,
    /// Bumped whenever a search cycle starts or is abandoned.
    generation: u64,
    last_active: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            stage: Stage::Idle,
            criteria: Criteria::new(),
            search: None,
            generation: 0,
            last_active: Utc::now(),
        }
    }
}

impl Session {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn started(&self) -> bool {
        self.stage != Stage::Idle
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn search(&self) -> Option<&SearchCursor> {
        self.search.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Consume one inbound message.
    ///
    /// `text` is `None` for messages that carry no text (attachments).
    /// Global keywords are checked before the per-stage table; answers are
    /// stored exactly as received.
    pub fn advance(&mut self, text: Option<&str>, keywords: &Keywords) -> Transition {
        let Some(text) = text else {
            return Transition::TextOnly;
        };
        let keyword = text.trim();

        if keyword == keywords.reset {
            self.clear(Stage::Answering(Question::first()));
            return Transition::Restart;
        }
        if keyword == keywords.stop {
            self.clear(Stage::Idle);
            return Transition::Stop;
        }

        match self.stage {
            Stage::Idle => {
                if keyword == keywords.start {
                    self.clear(Stage::Answering(Question::first()));
                    Transition::Ask(Question::first())
                } else {
                    Transition::Remind
                }
            }
            Stage::Answering(question) => {
                self.criteria.set(question.field(), text);
                match question.next() {
                    Some(next) => {
                        self.stage = Stage::Answering(next);
                        Transition::Ask(next)
                    }
                    None => {
                        self.generation += 1;
                        self.stage = Stage::Fetching;
                        Transition::StartFetch {
                            generation: self.generation,
                        }
                    }
                }
            }
            Stage::Fetching => Transition::StillFetching,
            Stage::Browsing => {
                if keyword == keywords.next {
                    Transition::ShowNext
                } else {
                    self.clear(Stage::Idle);
                    Transition::Finish
                }
            }
        }
    }

    /// Whether a fetch started for `generation` may still be applied.
    pub fn awaits_fetch(&self, generation: u64) -> bool {
        self.stage == Stage::Fetching && self.generation == generation
    }

    /// Install a freshly fetched dataset and start browsing from its beginning.
    pub fn begin_browsing(&mut self, dataset: std::sync::Arc<Dataset>) {
        self.search = Some(SearchCursor::new(dataset));
        self.stage = Stage::Browsing;
    }

    /// Find the next matching record after the cursor.
    ///
    /// When the dataset is exhausted (or there is no search) the session goes
    /// back to idle and `None` is returned.
    pub fn scan_next(&mut self, engine: &MatchEngine) -> Option<(usize, Record)> {
        let found = self
            .search
            .as_mut()
            .and_then(|cursor| cursor.next_match(engine, &self.criteria))
            .map(|(index, record)| (index, record.clone()));

        if found.is_none() {
            self.clear(Stage::Idle);
        }
        found
    }

    /// Abandon the current search cycle.
    pub fn reset(&mut self) {
        self.clear(Stage::Idle);
    }

    fn clear(&mut self, stage: Stage) {
        self.criteria.clear();
        self.search = None;
        self.generation += 1;
        self.stage = stage;
    }
}

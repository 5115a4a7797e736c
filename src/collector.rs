//! Guided answer collection
//!
//! One question is open at a time. Each [`Session::submit_answer`] call answers
//! exactly that question and performs any stage transition it triggers:
//! charter exhausted moves to SIPOC, SIPOC exhausted finalizes the session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, SipocError};
use crate::questions::{AnswerKind, Question, QuestionSet};
use crate::record::{Answer, AnswerRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    CollectingCharter,
    CollectingSipoc,
    Finalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::CollectingCharter => "collecting-charter",
            Stage::CollectingSipoc => "collecting-sipoc",
            Stage::Finalized => "finalized",
        })
    }
}

/// What to do with empty pieces when a list answer is split on commas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListPolicy {
    /// Keep empty pieces (`"a, , b"` -> `["a", "", "b"]`)
    #[default]
    KeepEmpty,
    /// Drop empty pieces (`"a, , b"` -> `["a", "b"]`)
    DropEmpty,
}

impl ListPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "keep-empty" | "keep" => Some(ListPolicy::KeepEmpty),
            "drop-empty" | "drop" => Some(ListPolicy::DropEmpty),
            _ => None,
        }
    }
}

/// Inputs to answer normalization that are not part of the raw answer
#[derive(Debug, Clone, Copy)]
pub struct SubmitContext {
    pub today: NaiveDate,
    pub list_policy: ListPolicy,
}

/// The next unanswered question, or `None` once the set is exhausted
pub fn current_question<'a>(set: &'a QuestionSet, record: &AnswerRecord) -> Option<&'a Question> {
    set.get(record.len())
}

/// Answer the current question of `set` and return its key.
///
/// Blank input stores the question's resolved default. `AlreadyComplete` and
/// `MalformedListInput` leave `record` untouched.
pub fn submit_answer<'a>(
    set: &'a QuestionSet,
    record: &mut AnswerRecord,
    raw_input: &str,
    ctx: SubmitContext,
) -> Result<&'a str> {
    let question = current_question(set, record).ok_or(SipocError::AlreadyComplete)?;

    let answer = if raw_input.trim().is_empty() {
        normalize(question, &question.resolve_default(ctx.today), ctx.list_policy)?
    } else {
        normalize(question, raw_input, ctx.list_policy)?
    };

    debug!(key = %question.key, ?answer, "answer recorded");
    record.push(question.key.clone(), answer);
    Ok(question.key.as_str())
}

fn normalize(question: &Question, raw: &str, policy: ListPolicy) -> Result<Answer> {
    match question.kind {
        AnswerKind::Text => Ok(Answer::Text(raw.trim().to_string())),
        AnswerKind::List => {
            let items = split_list(raw, policy);
            if items.iter().all(|item| item.is_empty()) {
                return Err(SipocError::MalformedListInput {
                    key: question.key.clone(),
                });
            }
            Ok(Answer::List(items))
        }
    }
}

/// Split on commas and trim each piece
pub fn split_list(raw: &str, policy: ListPolicy) -> Vec<String> {
    raw.split(',')
        .map(|piece| piece.trim().to_string())
        .filter(|piece| policy == ListPolicy::KeepEmpty || !piece.is_empty())
        .collect()
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub key: String,
    pub stage: Stage,
}

/// Per-user collection state; created once, mutated only through `submit_answer`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    today: NaiveDate,
    list_policy: ListPolicy,
    charter_questions: QuestionSet,
    sipoc_questions: QuestionSet,
    charter: AnswerRecord,
    sipoc: AnswerRecord,
    stage: Stage,
}

impl Session {
    /// New session dated today (local time)
    pub fn new(charter_questions: QuestionSet, sipoc_questions: QuestionSet) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            today: chrono::Local::now().date_naive(),
            list_policy: ListPolicy::default(),
            charter_questions,
            sipoc_questions,
            charter: AnswerRecord::new(),
            sipoc: AnswerRecord::new(),
            stage: Stage::CollectingCharter,
        };
        session.advance();
        info!(session_id = %session.id, stage = %session.stage, "session created");
        session
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_list_policy(mut self, list_policy: ListPolicy) -> Self {
        self.list_policy = list_policy;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_finalized(&self) -> bool {
        self.stage == Stage::Finalized
    }

    pub fn charter_questions(&self) -> &QuestionSet {
        &self.charter_questions
    }

    pub fn sipoc_questions(&self) -> &QuestionSet {
        &self.sipoc_questions
    }

    pub fn charter(&self) -> &AnswerRecord {
        &self.charter
    }

    pub fn sipoc(&self) -> &AnswerRecord {
        &self.sipoc
    }

    /// Total number of questions across both stages
    pub fn total_questions(&self) -> usize {
        self.charter_questions.len() + self.sipoc_questions.len()
    }

    /// Number of answers recorded so far
    pub fn answered(&self) -> usize {
        self.charter.len() + self.sipoc.len()
    }

    /// The open question of the active stage
    pub fn current_question(&self) -> Option<&Question> {
        match self.stage {
            Stage::CollectingCharter => current_question(&self.charter_questions, &self.charter),
            Stage::CollectingSipoc => current_question(&self.sipoc_questions, &self.sipoc),
            Stage::Finalized => None,
        }
    }

    pub fn submit_answer(&mut self, raw_input: &str) -> Result<Submission> {
        let ctx = SubmitContext {
            today: self.today,
            list_policy: self.list_policy,
        };
        let key = match self.stage {
            Stage::CollectingCharter => {
                submit_answer(&self.charter_questions, &mut self.charter, raw_input, ctx)?
            }
            Stage::CollectingSipoc => {
                submit_answer(&self.sipoc_questions, &mut self.sipoc, raw_input, ctx)?
            }
            Stage::Finalized => return Err(SipocError::AlreadyComplete),
        }
        .to_string();

        self.advance();
        Ok(Submission {
            key,
            stage: self.stage,
        })
    }

    /// Move past every exhausted stage
    fn advance(&mut self) {
        let before = self.stage;
        if self.stage == Stage::CollectingCharter
            && current_question(&self.charter_questions, &self.charter).is_none()
        {
            self.stage = Stage::CollectingSipoc;
        }
        if self.stage == Stage::CollectingSipoc
            && current_question(&self.sipoc_questions, &self.sipoc).is_none()
        {
            self.stage = Stage::Finalized;
        }
        if self.stage != before {
            info!(session_id = %self.id, from = %before, to = %self.stage, "stage transition");
        }
    }

    /// Check a deserialized session against the collector invariants
    pub fn validate(&self) -> Result<()> {
        check_prefix("charter", &self.charter_questions, &self.charter)?;
        check_prefix("SIPOC", &self.sipoc_questions, &self.sipoc)?;

        let charter_done = self.charter.len() == self.charter_questions.len();
        let sipoc_done = self.sipoc.len() == self.sipoc_questions.len();
        let expected = match (charter_done, sipoc_done) {
            (false, _) => Stage::CollectingCharter,
            (true, false) => Stage::CollectingSipoc,
            (true, true) => Stage::Finalized,
        };
        if !charter_done && !self.sipoc.is_empty() {
            return Err(SipocError::Validation {
                message: "SIPOC answers present before the charter was completed".into(),
            });
        }
        if self.stage != expected {
            return Err(SipocError::Validation {
                message: format!(
                    "stage '{}' does not match recorded answers (expected '{}')",
                    self.stage, expected
                ),
            });
        }
        Ok(())
    }
}

fn check_prefix(label: &str, set: &QuestionSet, record: &AnswerRecord) -> Result<()> {
    if record.len() > set.len() || !record.keys().zip(set.keys()).all(|(a, b)| a == b) {
        return Err(SipocError::Validation {
            message: format!("{label} answers do not follow the question order"),
        });
    }
    Ok(())
}

//! Question sets for the project charter and SIPOC stages
//!
//! A [`QuestionSet`] is fixed at configuration time. Keys double as record field
//! names and as row labels in every export, so they are validated once here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::collector::{ListPolicy, split_list};
use crate::diagram::SipocCategory;
use crate::error::{Result, SipocError};

/// Placeholder inside a default answer that resolves to the session date
pub const TODAY_PLACEHOLDER: &str = "{today}";

/// How a raw answer is normalized before it is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    #[default]
    Text,
    /// Comma-separated list, split and trimmed
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub key: String,
    pub prompt: String,
    #[serde(rename = "default")]
    pub default_answer: String,
    #[serde(default)]
    pub kind: AnswerKind,
}

impl Question {
    pub fn text(
        key: impl Into<String>,
        prompt: impl Into<String>,
        default_answer: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            prompt: prompt.into(),
            default_answer: default_answer.into(),
            kind: AnswerKind::Text,
        }
    }

    pub fn list(
        key: impl Into<String>,
        prompt: impl Into<String>,
        default_answer: impl Into<String>,
    ) -> Self {
        Self {
            kind: AnswerKind::List,
            ..Self::text(key, prompt, default_answer)
        }
    }

    /// Default answer with `{today}` expanded to `today` (`%Y-%m-%d`)
    pub fn resolve_default(&self, today: NaiveDate) -> String {
        if self.default_answer.contains(TODAY_PLACEHOLDER) {
            self.default_answer
                .replace(TODAY_PLACEHOLDER, &today.format("%Y-%m-%d").to_string())
        } else {
            self.default_answer.clone()
        }
    }
}

/// Ordered, immutable list of questions with unique keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Question>", into = "Vec<Question>")]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        let mut seen = HashSet::new();
        for q in &questions {
            if q.key.trim().is_empty() {
                return Err(SipocError::Validation {
                    message: format!("question with prompt '{}' has a blank key", q.prompt),
                });
            }
            if !seen.insert(q.key.as_str()) {
                return Err(SipocError::Validation {
                    message: format!("duplicate question key '{}'", q.key),
                });
            }
            if q.kind == AnswerKind::List
                && split_list(&q.default_answer, ListPolicy::DropEmpty).is_empty()
            {
                return Err(SipocError::Validation {
                    message: format!(
                        "list question '{}' needs a default with at least one item",
                        q.key
                    ),
                });
            }
        }
        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|q| q.key.as_str())
    }

    pub fn find(&self, key: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.key == key)
    }
}

impl TryFrom<Vec<Question>> for QuestionSet {
    type Error = SipocError;

    fn try_from(questions: Vec<Question>) -> Result<Self> {
        Self::new(questions)
    }
}

impl From<QuestionSet> for Vec<Question> {
    fn from(set: QuestionSet) -> Self {
        set.questions
    }
}

/// Named charter question presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharterPreset {
    /// Six-question guided chat flow
    Guided,
    /// Four-field define-phase form
    Define,
    /// Full charter field list including dates and financials
    Full,
}

impl CharterPreset {
    pub const ALL: [CharterPreset; 3] = [Self::Guided, Self::Define, Self::Full];

    pub fn as_str(&self) -> &'static str {
        match self {
            CharterPreset::Guided => "guided",
            CharterPreset::Define => "define",
            CharterPreset::Full => "full",
        }
    }

    /// Parse a preset name, suggesting the closest known name on failure
    pub fn parse(name: &str) -> Result<Self> {
        let wanted = name.trim().to_lowercase();
        if let Some(preset) = Self::ALL.iter().find(|p| p.as_str() == wanted) {
            return Ok(*preset);
        }

        let names: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
        let mut message = format!(
            "Unknown charter preset: '{}'. Available presets: {}",
            name.trim(),
            names.join(", ")
        );
        if let Some(closest) = closest_name(&wanted, &names) {
            message.push_str(&format!(". Did you mean '{}'?", closest));
        }
        Err(SipocError::Config { message })
    }

    pub fn questions(&self) -> QuestionSet {
        let questions = match self {
            CharterPreset::Guided => guided_charter(),
            CharterPreset::Define => define_charter(),
            CharterPreset::Full => full_charter(),
        };
        QuestionSet { questions }
    }
}

fn closest_name<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, strsim::jaro_winkler(input, c)))
        .filter(|(_, score)| *score >= 0.7)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}

fn guided_charter() -> Vec<Question> {
    vec![
        Question::text(
            "Problem Statement",
            "What is the problem statement for your Six Sigma project?",
            "Baggage handling times are inconsistent, leading to customer dissatisfaction.",
        ),
        Question::text(
            "Scope",
            "What is the scope of this project?",
            "The project will focus on improving the baggage handling process at the airport.",
        ),
        Question::text(
            "Goal Statement",
            "What is the goal of the project?",
            "Reduce baggage handling time variance by 30% within 6 months.",
        ),
        Question::text(
            "Team Members",
            "Who are the team members involved in this project?",
            "John Doe, Jane Smith, Airport Operations Team.",
        ),
        Question::text(
            "Timeline",
            "What is the project timeline?",
            "6 months from project initiation.",
        ),
        Question::text(
            "Business Case",
            "What is the business case for this project?",
            "Improving baggage handling times will increase customer satisfaction and reduce costs associated with delays.",
        ),
    ]
}

fn define_charter() -> Vec<Question> {
    vec![
        Question::text(
            "Problem Statement",
            "Describe the problem you are addressing.",
            "Inconsistent baggage handling time at the airport.",
        ),
        Question::text(
            "Goal Statement",
            "Define the specific, measurable goal of the project.",
            "Reduce baggage handling time to under 20 minutes for 95% of flights.",
        ),
        Question::text(
            "Scope",
            "Describe the boundaries of the project.",
            "Baggage handling processes at all domestic terminals.",
        ),
        Question::text(
            "Business Case",
            "Explain why this project is important for the business.",
            "Reducing baggage handling time will improve customer satisfaction and reduce operational costs.",
        ),
    ]
}

fn full_charter() -> Vec<Question> {
    vec![
        Question::text(
            "Project Name",
            "What is the name of the project?",
            "Baggage Handling Time Reduction",
        ),
        Question::text(
            "Project Manager",
            "Who is the project manager?",
            "Jane Smith",
        ),
        Question::text(
            "Project Sponsor",
            "Who is sponsoring the project?",
            "VP Airport Operations",
        ),
        Question::text(
            "Project Team Members",
            "Who are the project team members?",
            "John Doe, Jane Smith, Airport Operations Team",
        ),
        Question::text(
            "Start Date",
            "When does the project start?",
            TODAY_PLACEHOLDER,
        ),
        Question::text(
            "Expected Completion Date",
            "When is the project expected to complete?",
            "6 months from project initiation",
        ),
        Question::text(
            "Estimated Cost",
            "What is the estimated cost of the project?",
            "$50,000",
        ),
        Question::text(
            "Estimated Savings",
            "What savings do you expect the project to deliver?",
            "$200,000 per year in reduced delay compensation",
        ),
        Question::text(
            "Problem/Issue",
            "What problem or issue does the project address?",
            "Baggage handling times are inconsistent, leading to customer dissatisfaction.",
        ),
        Question::text(
            "Purpose of Project",
            "What is the purpose of the project?",
            "Standardize the baggage handling process from aircraft to carousel.",
        ),
        Question::text(
            "Business Case",
            "What is the business case for this project?",
            "Improving baggage handling times will increase customer satisfaction and reduce costs associated with delays.",
        ),
        Question::text(
            "Goals/Metrics",
            "Which goals and metrics define success?",
            "95% of flights deliver first bag within 20 minutes.",
        ),
        Question::text(
            "Within Scope",
            "What is within the scope of the project?",
            "Baggage handling at all domestic terminals.",
        ),
        Question::text(
            "Without Scope",
            "What is outside the scope of the project?",
            "International terminals and lost-baggage claims.",
        ),
    ]
}

/// The five SIPOC category questions in fixed category order
pub fn sipoc_questions() -> QuestionSet {
    let questions = SipocCategory::ALL
        .iter()
        .map(|category| {
            Question::list(
                category.as_str(),
                category.prompt(),
                category.default_answer(),
            )
        })
        .collect();
    QuestionSet { questions }
}

/// SIPOC questions with per-category default overrides (keyed by category name)
pub fn sipoc_questions_with_defaults<'a, I>(overrides: I) -> Result<QuestionSet>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut set = sipoc_questions();
    for (key, default_answer) in overrides {
        let category = SipocCategory::parse(key).ok_or_else(|| SipocError::Config {
            message: format!(
                "Unknown SIPOC category '{}' in default overrides. Expected one of: {}",
                key,
                SipocCategory::ALL.map(|c| c.as_str()).join(", ")
            ),
        })?;
        if let Some(q) = set.questions.iter_mut().find(|q| q.key == category.as_str()) {
            q.default_answer = default_answer.to_string();
        }
    }
    QuestionSet::new(set.questions)
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::collector::{ListPolicy, Session};
use crate::error::{Result, SipocError};
use crate::export::{ColumnWidths, TabularFormat};
use crate::questions::{CharterPreset, Question, QuestionSet, sipoc_questions_with_defaults};

/// Main configuration structure loaded from sipoc_bot.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub questions: QuestionsConfig,
    pub export: ExportConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Which questions are asked and how answers are normalized
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuestionsConfig {
    /// guided | define | full
    pub charter_preset: String,
    /// Replaces the preset when non-empty
    pub charter: Vec<Question>,
    /// Per-category SIPOC default overrides
    pub sipoc_defaults: BTreeMap<String, String>,
    pub list_policy: ListPolicy,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            charter_preset: CharterPreset::Guided.as_str().to_string(),
            charter: Vec::new(),
            sipoc_defaults: BTreeMap::new(),
            list_policy: ListPolicy::KeepEmpty,
        }
    }
}

/// Export collaborators and output location
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    pub tabular_format: TabularFormat,
    pub column_widths: ColumnWidths,
    pub list_separator: String,
    pub dot_binary: String,
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            tabular_format: TabularFormat::Xlsx,
            column_widths: ColumnWidths::default(),
            list_separator: ", ".to_string(),
            dot_binary: "dot".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "sipoc_bot=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn load_from_env() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "sipoc_bot=info".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses SIPOC_BOT_CONFIG environment variable or defaults to "sipoc_bot.toml"
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(env_path) = std::env::var("SIPOC_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let config_path =
            std::env::var("SIPOC_BOT_CONFIG").unwrap_or_else(|_| "sipoc_bot.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides()?;
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(preset) = std::env::var("SIPOC_CHARTER_PRESET") {
            tracing::debug!("SIPOC_CHARTER_PRESET env override applied");
            self.questions.charter_preset = preset;
        }
        if let Ok(value) = std::env::var("SIPOC_LIST_POLICY") {
            self.questions.list_policy = ListPolicy::parse(&value).ok_or_else(|| {
                anyhow::anyhow!("SIPOC_LIST_POLICY must be keep-empty or drop-empty, got '{value}'")
            })?;
        }
        if let Ok(value) = std::env::var("SIPOC_TABULAR_FORMAT") {
            self.export.tabular_format = TabularFormat::parse(&value)
                .ok_or_else(|| anyhow::anyhow!("SIPOC_TABULAR_FORMAT must be xlsx or csv, got '{value}'"))?;
        }
        if let Ok(dir) = std::env::var("SIPOC_OUTPUT_DIR") {
            self.export.output_dir = PathBuf::from(dir);
        }
        if let Ok(bin) = std::env::var("SIPOC_DOT_BIN") {
            self.export.dot_binary = bin;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.charter_questions()?;
        self.sipoc_questions()?;

        let widths = self.export.column_widths;
        if !(1.0..=255.0).contains(&widths.key) || !(1.0..=255.0).contains(&widths.value) {
            return Err(SipocError::Config {
                message: format!(
                    "column widths must be between 1 and 255, got {} / {}",
                    widths.key, widths.value
                ),
            });
        }
        if self.export.dot_binary.trim().is_empty() {
            return Err(SipocError::Config {
                message: "dot_binary cannot be empty".into(),
            });
        }
        Ok(())
    }

    /// Charter questions: the custom list when given, otherwise the named preset
    pub fn charter_questions(&self) -> Result<QuestionSet> {
        if !self.questions.charter.is_empty() {
            return QuestionSet::new(self.questions.charter.clone());
        }
        Ok(CharterPreset::parse(&self.questions.charter_preset)?.questions())
    }

    pub fn sipoc_questions(&self) -> Result<QuestionSet> {
        sipoc_questions_with_defaults(
            self.questions
                .sipoc_defaults
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    /// Fresh session using the configured question sets and list policy
    pub fn new_session(&self) -> Result<Session> {
        Ok(
            Session::new(self.charter_questions()?, self.sipoc_questions()?)
                .with_list_policy(self.questions.list_policy),
        )
    }
}

pub mod chat;
pub mod collector;
pub mod config;
pub mod diagram;
pub mod error;
pub mod export;
pub mod questions;
pub mod record;
pub mod render;

pub use collector::{ListPolicy, Session, Stage, Submission};
pub use diagram::{SipocCategory, SipocDiagram};
pub use error::{Result, SipocError};
pub use export::{ExportBundle, Exporter};
pub use questions::{Question, QuestionSet};
pub use record::{Answer, AnswerRecord};

/// Read a saved session and check it against the collector invariants
pub fn load_session(path: &std::path::Path) -> Result<Session> {
    let content = std::fs::read_to_string(path)?;
    let session: Session = serde_json::from_str(&content)?;
    session.validate()?;
    Ok(session)
}

/// Save a session as pretty-printed JSON
pub fn save_session(session: &Session, path: &std::path::Path) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(session)?)?;
    Ok(())
}

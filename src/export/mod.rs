//! Export of a finalized session to tabular and printable payloads
//!
//! Table and page assembly are pure; the configured writers and the diagram
//! renderer are the only collaborators that can fail. A diagram render failure
//! drops the diagram page and is reported through `diagram_warning`.

pub mod printable;
pub mod review;
pub mod tabular;

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::collector::Session;
use crate::config::ExportConfig;
use crate::diagram::{SipocCategory, SipocDiagram};
use crate::error::{Result, SipocError};
use crate::record::AnswerRecord;
use crate::render::{DiagramRenderer, GraphvizRenderer, ImageFormat};

pub use printable::{Block, Page, PdfWriter, PrintableDocument, PrintableWriter};
pub use review::review_markdown;
pub use tabular::{ColumnWidths, CsvWriter, Table, TabularFormat, TabularWriter, XlsxWriter};

/// Base name of every exported file
pub const EXPORT_BASENAME: &str = "Project_Charter_SIPOC";

pub const CHARTER_TABLE: &str = "Project Charter";
pub const SIPOC_TABLE: &str = "SIPOC";
pub const PRINTABLE_TITLE: &str = "Six Sigma Project Charter";

#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub tabular: Vec<u8>,
    pub tabular_extension: &'static str,
    pub printable: Vec<u8>,
    pub printable_extension: &'static str,
    /// Set when the diagram page had to be left out
    pub diagram_warning: Option<String>,
}

impl ExportBundle {
    pub fn file_name(extension: &str) -> String {
        format!("{}.{}", EXPORT_BASENAME, extension)
    }

    /// Write both payloads into `dir`, returning the paths written
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(2);
        for (bytes, ext) in [
            (&self.tabular, self.tabular_extension),
            (&self.printable, self.printable_extension),
        ] {
            let path = dir.join(Self::file_name(ext));
            std::fs::write(&path, bytes).map_err(|e| SipocError::ExportIo {
                message: format!("cannot write {}: {}", path.display(), e),
            })?;
            written.push(path);
        }
        Ok(written)
    }
}

#[derive(Debug, Clone)]
pub struct PrintableExport {
    pub bytes: Vec<u8>,
    pub diagram_warning: Option<String>,
}

pub struct Exporter {
    renderer: Box<dyn DiagramRenderer>,
    tabular: Box<dyn TabularWriter>,
    printable: Box<dyn PrintableWriter>,
    separator: String,
}

impl Exporter {
    pub fn new(
        renderer: Box<dyn DiagramRenderer>,
        tabular: Box<dyn TabularWriter>,
        printable: Box<dyn PrintableWriter>,
    ) -> Self {
        Self {
            renderer,
            tabular,
            printable,
            separator: ", ".to_string(),
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(
            Box::new(GraphvizRenderer::new(config.dot_binary.clone())),
            tabular::writer_for(config.tabular_format, config.column_widths),
            Box::new(PdfWriter),
        )
        .with_separator(config.list_separator.clone())
    }

    /// Separator used when list answers are rejoined for display
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// "Project Charter" and "SIPOC" tables, in question order
    pub fn tables(&self, session: &Session) -> Vec<Table> {
        let charter = Table {
            name: CHARTER_TABLE.to_string(),
            header: ("Category".to_string(), "Details".to_string()),
            rows: self.rows(session.charter()),
        };
        let sipoc = Table {
            name: SIPOC_TABLE.to_string(),
            header: ("SIPOC".to_string(), "Details".to_string()),
            rows: SipocCategory::ALL
                .iter()
                .map(|category| {
                    let details = session
                        .sipoc()
                        .get(category.as_str())
                        .map(|answer| answer.display(&self.separator))
                        .unwrap_or_default();
                    (category.as_str().to_string(), details)
                })
                .collect(),
        };
        vec![charter, sipoc]
    }

    fn rows(&self, record: &AnswerRecord) -> Vec<(String, String)> {
        record
            .iter()
            .map(|(key, answer)| (key.to_string(), answer.display(&self.separator)))
            .collect()
    }

    /// Page layout: charter page, then the diagram page when an image is supplied
    pub fn printable_document(
        &self,
        session: &Session,
        diagram_png: Option<Vec<u8>>,
        today: NaiveDate,
    ) -> PrintableDocument {
        let mut first = Page::default();
        first.blocks.push(Block::Title(PRINTABLE_TITLE.to_string()));
        first.blocks.push(Block::Stamp(format!(
            "Report Date: {}",
            today.format("%Y-%m-%d")
        )));
        for (key, answer) in session.charter().iter() {
            first.blocks.push(Block::Line(format!(
                "- {}: {}",
                key,
                answer.display(&self.separator)
            )));
        }

        let mut pages = vec![first];
        if let Some(png) = diagram_png {
            pages.push(Page {
                blocks: vec![Block::Heading("SIPOC Diagram".to_string()), Block::Image(png)],
            });
        }

        PrintableDocument {
            title: PRINTABLE_TITLE.to_string(),
            pages,
        }
    }

    pub fn export_tabular(&self, session: &Session) -> Result<Vec<u8>> {
        ensure_finalized(session)?;
        self.tabular.write(&self.tables(session))
    }

    pub fn export_printable(&self, session: &Session, today: NaiveDate) -> Result<PrintableExport> {
        ensure_finalized(session)?;

        let diagram = SipocDiagram::build(session.sipoc());
        let (png, diagram_warning) = match self.renderer.render(&diagram, ImageFormat::Png) {
            Ok(png) => (Some(png), None),
            Err(err) => {
                warn!(session_id = %session.id(), error = %err, "diagram page omitted");
                (None, Some(err.to_string()))
            }
        };

        let document = self.printable_document(session, png, today);
        let bytes = self.printable.write(&document)?;
        Ok(PrintableExport {
            bytes,
            diagram_warning,
        })
    }

    /// Both payloads; a failed export leaves the session untouched and re-exportable
    pub fn export(&self, session: &Session, today: NaiveDate) -> Result<ExportBundle> {
        let tabular = self.export_tabular(session)?;
        let printable = self.export_printable(session, today)?;

        info!(
            session_id = %session.id(),
            tabular_bytes = tabular.len(),
            printable_bytes = printable.bytes.len(),
            with_diagram = printable.diagram_warning.is_none(),
            "export complete"
        );

        Ok(ExportBundle {
            tabular,
            tabular_extension: self.tabular.extension(),
            printable: printable.bytes,
            printable_extension: self.printable.extension(),
            diagram_warning: printable.diagram_warning,
        })
    }
}

fn ensure_finalized(session: &Session) -> Result<()> {
    if session.is_finalized() {
        Ok(())
    } else {
        Err(SipocError::NotFinalized {
            stage: session.stage(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::{CharterPreset, sipoc_questions};

    struct FailingRenderer;

    impl DiagramRenderer for FailingRenderer {
        fn render(&self, _: &SipocDiagram, _: ImageFormat) -> Result<Vec<u8>> {
            Err(SipocError::Render {
                message: "renderer offline".into(),
            })
        }
    }

    fn exporter() -> Exporter {
        Exporter::new(Box::new(FailingRenderer), Box::new(CsvWriter), Box::new(PdfWriter))
    }

    fn finalized() -> Session {
        let mut session = Session::new(CharterPreset::Define.questions(), sipoc_questions());
        while !session.is_finalized() {
            session.submit_answer("").unwrap();
        }
        session
    }

    #[test]
    fn test_export_requires_finalized_session() {
        let session = Session::new(CharterPreset::Define.questions(), sipoc_questions());
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let err = exporter().export(&session, today).unwrap_err();
        assert!(matches!(err, SipocError::NotFinalized { stage } if stage.to_string() == "collecting-charter"));
    }

    #[test]
    fn test_tables_follow_question_order() {
        let tables = exporter().tables(&finalized());
        assert_eq!(tables[0].name, "Project Charter");
        let keys: Vec<&str> = tables[0].rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["Problem Statement", "Goal Statement", "Scope", "Business Case"]);
        assert_eq!(tables[1].rows[4], ("Customers".to_string(), "Passengers, Airlines".to_string()));
    }

    #[test]
    fn test_printable_document_layout() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let doc = exporter().printable_document(&finalized(), Some(vec![1, 2, 3]), today);
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].blocks[1], Block::Stamp("Report Date: 2024-05-01".into()));
        assert_eq!(doc.pages[0].blocks.len(), 2 + 4);
        assert!(doc.has_image());

        let without = exporter().printable_document(&finalized(), None, today);
        assert_eq!(without.pages.len(), 1);
    }

    #[test]
    fn test_bundle_file_names() {
        assert_eq!(ExportBundle::file_name("xlsx"), "Project_Charter_SIPOC.xlsx");
    }
}

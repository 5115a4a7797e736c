//! Export behavior with fake and real collaborators.

use chrono::NaiveDate;
use sipoc_bot::diagram::SipocDiagram;
use sipoc_bot::export::{CsvWriter, PdfWriter, XlsxWriter};
use sipoc_bot::questions::{CharterPreset, sipoc_questions};
use sipoc_bot::render::{DiagramRenderer, ImageFormat};
use sipoc_bot::{Exporter, Session, SipocError};

struct OfflineRenderer;

impl DiagramRenderer for OfflineRenderer {
    fn render(&self, _: &SipocDiagram, _: ImageFormat) -> sipoc_bot::Result<Vec<u8>> {
        Err(SipocError::Render {
            message: "graphviz executable 'dot' not found".into(),
        })
    }
}

/// Renders every diagram as the same small grey PNG
struct StaticPngRenderer;

impl DiagramRenderer for StaticPngRenderer {
    fn render(&self, diagram: &SipocDiagram, format: ImageFormat) -> sipoc_bot::Result<Vec<u8>> {
        use printpdf::image_crate::codecs::png::PngEncoder;
        use printpdf::image_crate::{ColorType, ImageEncoder};

        assert_eq!(format, ImageFormat::Png);
        assert!(!diagram.nodes().is_empty());
        let (width, height) = (40u32, 30u32);
        let pixels = vec![180u8; (width * height * 4) as usize];
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(&pixels, width, height, ColorType::Rgba8)
            .unwrap();
        Ok(bytes)
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn finalized() -> Session {
    let mut session =
        Session::new(CharterPreset::Guided.questions(), sipoc_questions()).with_today(today());
    let answers = [
        "Bags arrive late",
        "",
        "",
        "",
        "",
        "",
        "Baggage handlers, Ground staff",
        "Passenger baggage",
        "Check-in, Sorting, Loading",
        "Baggage delivered to passengers",
        "Passengers, Airline staff",
    ];
    for answer in answers {
        session.submit_answer(answer).unwrap();
    }
    assert!(session.is_finalized());
    session
}

#[test]
fn test_render_failure_still_exports_both_payloads() {
    let exporter = Exporter::new(
        Box::new(OfflineRenderer),
        Box::new(XlsxWriter::default()),
        Box::new(PdfWriter),
    );
    let bundle = exporter.export(&finalized(), today()).unwrap();

    assert!(!bundle.tabular.is_empty());
    assert!(bundle.tabular.starts_with(b"PK"));
    assert!(bundle.printable.starts_with(b"%PDF"));
    assert!(bundle.diagram_warning.unwrap().contains("not found"));
}

#[test]
fn test_tabular_export_is_repeatable() {
    let exporter = Exporter::new(Box::new(OfflineRenderer), Box::new(CsvWriter), Box::new(PdfWriter));
    let session = finalized();

    assert_eq!(exporter.tables(&session), exporter.tables(&session));
    assert_eq!(
        exporter.export_tabular(&session).unwrap(),
        exporter.export_tabular(&session).unwrap()
    );
}

#[test]
fn test_csv_payload_content() {
    let exporter = Exporter::new(Box::new(OfflineRenderer), Box::new(CsvWriter), Box::new(PdfWriter));
    let csv = String::from_utf8(exporter.export_tabular(&finalized()).unwrap()).unwrap();

    assert!(csv.starts_with("Project Charter\nCategory,Details\nProblem Statement,Bags arrive late\n"));
    assert!(csv.contains("SIPOC\nSIPOC,Details\n"));
    assert!(csv.contains("Process,\"Check-in, Sorting, Loading\"\n"));
}

#[test]
fn test_diagram_counts_for_finalized_session() {
    let diagram = SipocDiagram::build(finalized().sipoc());
    assert_eq!(diagram.nodes().len(), 5 + 9);
    assert_eq!(diagram.edges().len(), 9 + 4);
}

#[test]
fn test_bundle_writes_deterministic_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::new(Box::new(OfflineRenderer), Box::new(CsvWriter), Box::new(PdfWriter));
    let bundle = exporter.export(&finalized(), today()).unwrap();

    let written = bundle.write_to(dir.path()).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["Project_Charter_SIPOC.csv", "Project_Charter_SIPOC.pdf"]);
    assert!(dir.path().join("Project_Charter_SIPOC.pdf").exists());
}

#[test]
fn test_failed_export_leaves_session_exportable() {
    let exporter = Exporter::new(Box::new(OfflineRenderer), Box::new(CsvWriter), Box::new(PdfWriter));
    let mut session = Session::new(CharterPreset::Define.questions(), sipoc_questions());
    assert!(matches!(
        exporter.export(&session, today()),
        Err(SipocError::NotFinalized { .. })
    ));

    while !session.is_finalized() {
        session.submit_answer("").unwrap();
    }
    assert!(exporter.export(&session, today()).is_ok());
}

#[test]
fn test_rendered_diagram_lands_in_printable() {
    let with_diagram =
        Exporter::new(Box::new(StaticPngRenderer), Box::new(CsvWriter), Box::new(PdfWriter));
    let without_diagram =
        Exporter::new(Box::new(OfflineRenderer), Box::new(CsvWriter), Box::new(PdfWriter));
    let session = finalized();

    let bundle = with_diagram.export(&session, today()).unwrap();
    assert!(bundle.diagram_warning.is_none());
    assert!(bundle.printable.starts_with(b"%PDF"));

    let fallback = without_diagram.export(&session, today()).unwrap();
    assert!(bundle.printable.len() > fallback.printable.len());
    assert_eq!(bundle.tabular, fallback.tabular);
}

//! Tabular document writers (spreadsheet / CSV)

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SipocError};

/// One labelled section of the tabular export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub name: String,
    pub header: (String, String),
    pub rows: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabularFormat {
    #[default]
    Xlsx,
    Csv,
}

impl TabularFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "xlsx" | "excel" => Some(TabularFormat::Xlsx),
            "csv" => Some(TabularFormat::Csv),
            _ => None,
        }
    }
}

/// Column widths in spreadsheet character units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnWidths {
    pub key: f64,
    pub value: f64,
}

impl Default for ColumnWidths {
    fn default() -> Self {
        Self {
            key: 20.0,
            value: 50.0,
        }
    }
}

pub trait TabularWriter: Send + Sync {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    /// Encode all tables into one in-memory document
    fn write(&self, tables: &[Table]) -> Result<Vec<u8>>;
}

/// Build the writer for a configured format
pub fn writer_for(format: TabularFormat, widths: ColumnWidths) -> Box<dyn TabularWriter> {
    match format {
        TabularFormat::Xlsx => Box::new(XlsxWriter::new(widths)),
        TabularFormat::Csv => Box::new(CsvWriter),
    }
}

/// One worksheet per table with a bordered grey header row
#[derive(Debug, Clone, Default)]
pub struct XlsxWriter {
    widths: ColumnWidths,
}

impl XlsxWriter {
    pub fn new(widths: ColumnWidths) -> Self {
        Self { widths }
    }
}

impl TabularWriter for XlsxWriter {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn write(&self, tables: &[Table]) -> Result<Vec<u8>> {
        let header_format = Format::new()
            .set_bold()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::Top)
            .set_background_color(Color::RGB(0xD9D9D9));
        let cell_format = Format::new()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::Top)
            .set_text_wrap();

        let mut workbook = Workbook::new();
        for table in tables {
            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name(&table.name))?;
            sheet.set_column_width(0, self.widths.key)?;
            sheet.set_column_width(1, self.widths.value)?;
            sheet.write_string_with_format(0, 0, &table.header.0, &header_format)?;
            sheet.write_string_with_format(0, 1, &table.header.1, &header_format)?;

            for (i, (key, value)) in table.rows.iter().enumerate() {
                let row = u32::try_from(i + 1).map_err(|_| SipocError::ExportIo {
                    message: format!("table '{}' has too many rows", table.name),
                })?;
                sheet.write_string_with_format(row, 0, key, &cell_format)?;
                sheet.write_string_with_format(row, 1, value, &cell_format)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// Worksheet names are capped at 31 chars and exclude `[]:*?/\`
fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// Sections laid out one after another: a label row, the header, then the rows
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

impl TabularWriter for CsvWriter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write(&self, tables: &[Table]) -> Result<Vec<u8>> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        for table in tables {
            wtr.write_record([table.name.as_str()])?;
            wtr.write_record([table.header.0.as_str(), table.header.1.as_str()])?;
            for (key, value) in &table.rows {
                wtr.write_record([key.as_str(), value.as_str()])?;
            }
        }

        wtr.into_inner().map_err(|e| SipocError::ExportIo {
            message: format!("CSV flush failed: {}", e),
        })
    }
}

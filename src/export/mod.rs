//! Spreadsheet exports and the PDF report over a user's full history.

mod csv;
pub mod handlers;
pub mod model;
mod ods;
mod pdf;
pub mod stats;
mod xlsx;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::{meals::repo_types::Meal, readings::repo_types::GlucoseReading, timefmt};
use model::{meals_table, readings_table};
use stats::GlucoseStats;

pub const REPORT_TITLE: &str = "GlucoSnap Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Ods,
}

impl ExportFormat {
    /// Unknown or missing values export CSV.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("xlsx") => ExportFormat::Xlsx,
            Some("ods") => ExportFormat::Ods,
            _ => ExportFormat::Csv,
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            ExportFormat::Csv => "glucosnap_export.csv",
            ExportFormat::Xlsx => "glucosnap_export.xlsx",
            ExportFormat::Ods => "glucosnap_export.ods",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Ods => "application/vnd.oasis.opendocument.spreadsheet",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// A rendered file ready to be sent as an attachment.
#[derive(Debug)]
pub struct Artifact {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn export(
    format: ExportFormat,
    readings: &[GlucoseReading],
    meals: &[Meal],
) -> anyhow::Result<Artifact> {
    let tables = [readings_table(readings), meals_table(meals)];
    let bytes = match format {
        ExportFormat::Csv => csv::render(&tables)?,
        ExportFormat::Xlsx => xlsx::render(&tables)?,
        ExportFormat::Ods => ods::render(&tables)?,
    };
    Ok(Artifact {
        filename: format.filename(),
        content_type: format.content_type(),
        bytes,
    })
}

pub fn report(readings: &[GlucoseReading], meals: &[Meal], generated_at: OffsetDateTime) -> Artifact {
    let mut doc = pdf::PdfReport::new();
    doc.heading(REPORT_TITLE, 18.0);
    doc.line(&format!(
        "Generated on {} {}",
        timefmt::date(generated_at),
        timefmt::clock(generated_at)
    ));
    doc.gap(10.0);

    doc.heading("Statistics", 12.0);
    let stats = GlucoseStats::compute(readings);
    for (label, value) in GlucoseStats::lines(stats.as_ref()) {
        doc.line(&format!("{label}: {value}"));
    }
    doc.gap(10.0);

    doc.table(&readings_table(readings));
    doc.table(&meals_table(meals));

    Artifact {
        filename: "glucosnap_report.pdf",
        content_type: "application/pdf",
        bytes: doc.finish(),
    }
}

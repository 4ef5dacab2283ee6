//! Tabular exports of the current snapshot.

use analyzer::AnalysisResult;
use indexmap::IndexSet;
use parser::{write_xlsx, CdrRecord, CdrValue, XlsxWriteError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output was not valid UTF-8")]
    Encoding,

    #[error("Workbook write failed: {0}")]
    Xlsx(#[from] XlsxWriteError),
}

/// One worksheet: a header row followed by data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub rows: Vec<Vec<CdrValue>>,
}

impl Sheet {
    fn new(name: &'static str, header: &[&str]) -> Self {
        Self {
            name,
            rows: vec![header.iter().map(|h| text(h)).collect()],
        }
    }

    fn push(&mut self, row: Vec<CdrValue>) {
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub file_name: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Serialize as `.xlsx` bytes, one worksheet per sheet.
    pub fn to_xlsx(&self) -> Result<Vec<u8>, ExportError> {
        let sheets: Vec<(&str, &[Vec<CdrValue>])> = self
            .sheets
            .iter()
            .map(|sheet| (sheet.name, sheet.rows.as_slice()))
            .collect();
        Ok(write_xlsx(&sheets)?)
    }
}

/// Display name without a trailing `.xls` / `.xlsx`.
pub fn export_stem(display_name: &str) -> &str {
    display_name
        .strip_suffix(".xlsx")
        .or_else(|| display_name.strip_suffix(".xls"))
        .unwrap_or(display_name)
}

pub fn records_file_name(display_name: &str) -> String {
    format!("{}_data.csv", export_stem(display_name))
}

fn text(s: &str) -> CdrValue {
    CdrValue::Text(s.to_string())
}

fn number(n: f64) -> CdrValue {
    CdrValue::Number(n)
}

// ============================================================================
// Analysis workbook
// ============================================================================

pub fn analysis_workbook(analysis: &AnalysisResult, display_name: &str) -> Workbook {
    let stats = &analysis.summary_stats;

    let mut summary = Sheet::new("Summary", &["Metric", "Value"]);
    summary.push(vec![text("Total Calls"), number(stats.total_calls)]);
    summary.push(vec![text("Total Duration"), text(&stats.total_duration_formatted)]);
    summary.push(vec![text("Unique IMEIs"), number(stats.unique_imeis)]);
    summary.push(vec![text("Unique IMSIs"), number(stats.unique_imsis)]);
    summary.push(vec![text("Roaming Calls"), number(stats.roaming_calls)]);
    summary.push(vec![text("Date Range"), text(&stats.date_range)]);

    let mut crimes = Sheet::new("Top Crimes", &["name", "count", "percentage"]);
    for c in &analysis.crime_analysis.top_crimes {
        crimes.push(vec![text(&c.name), number(c.count), number(c.percentage)]);
    }

    let calls = &analysis.call_analysis;
    let mut b_parties = Sheet::new("Top B-Parties", &["name", "count"]);
    for p in &calls.top_b_parties {
        b_parties.push(vec![text(&p.name), number(p.count)]);
    }

    let mut call_types = Sheet::new("Call Types", &["name", "value"]);
    for t in &calls.call_type_distribution {
        call_types.push(vec![text(&t.name), number(t.value)]);
    }

    let mut per_day = Sheet::new("Calls Per Day", &["date", "count"]);
    for d in &calls.calls_per_day {
        per_day.push(vec![text(&d.date), number(d.count)]);
    }

    let mut cities = Sheet::new("Calls by City", &["name", "count"]);
    for c in &analysis.location_analysis.calls_by_city {
        cities.push(vec![text(&c.name), number(c.count)]);
    }

    let devices = &analysis.device_analysis;
    let mut imeis = Sheet::new("Top IMEIs", &["name", "count"]);
    for i in &devices.top_imeis {
        imeis.push(vec![text(&i.name), number(i.count)]);
    }

    let mut manufacturers = Sheet::new("IMEI Manufacturers", &["name", "value"]);
    for m in &devices.imei_manufacturer_distribution {
        manufacturers.push(vec![text(&m.name), number(m.value)]);
    }

    Workbook {
        file_name: format!("{}_analysis.xlsx", export_stem(display_name)),
        sheets: vec![
            summary,
            crimes,
            b_parties,
            call_types,
            per_day,
            cities,
            imeis,
            manufacturers,
        ],
    }
}

// ============================================================================
// Records CSV
// ============================================================================

/// All records as CSV. Columns are the union of record keys, first seen first.
pub fn records_csv(records: &[CdrRecord]) -> Result<String, ExportError> {
    if records.is_empty() {
        return Ok(String::new());
    }
    let header: IndexSet<&str> = records.iter().flat_map(|r| r.keys()).collect();

    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(header.iter().map(|k| k.to_string()).collect::<Vec<_>>());
    for record in records {
        rows.push(
            header
                .iter()
                .map(|key| record.get(key).map(|v| v.to_string()).unwrap_or_default())
                .collect(),
        );
    }
    write_csv(&rows)
}

fn write_csv(rows: &[Vec<String>]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|_| ExportError::Encoding)
}

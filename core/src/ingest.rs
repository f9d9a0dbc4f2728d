//! Tabular ingestion and export.
//!
//! RULE: Rows are validated here, at the boundary. Everything past
//! this module works with typed `Case` values only.
//!
//! The raw header and field text of every input row travel alongside
//! the typed cases in a `CaseTable`, so the exported file carries each
//! input column under its original name, in its original order and
//! with its original text. Row numbers in errors are 1-based data rows.

use crate::{
    case::{AssignedCase, Case},
    error::{DcaError, DcaResult},
    types::RecoveryLikelihood,
};
use std::collections::HashSet;
use std::io::{Read, Write};

pub const ID_COLUMN: &str = "case_id";
pub const ID_ALIASES: [&str; 2] = ["case_id", "customer_id"];
pub const LABEL_COLUMN: &str = "recovery_likelihood";

/// Result columns written after the input columns.
pub const OUTPUT_COLUMNS: [&str; 3] = ["predicted_recovery", "confidence_score", "dca_assigned"];

pub const FEATURE_COLUMNS: [&str; 6] = [
    "amount_owed",
    "days_overdue",
    "customer_type",
    "payment_history",
    "contact_attempts",
    "region",
];

/// Column positions resolved from the header row.
struct Columns {
    id:               usize,
    amount_owed:      usize,
    days_overdue:     usize,
    customer_type:    usize,
    payment_history:  usize,
    contact_attempts: usize,
    region:           usize,
    label:            Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord, require_label: bool) -> DcaResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let mut missing = Vec::new();

        let id = ID_ALIASES.iter().find_map(|alias| find(*alias));
        if id.is_none() {
            missing.push(ID_COLUMN.to_string());
        }
        let mut features = [0usize; FEATURE_COLUMNS.len()];
        for (slot, name) in features.iter_mut().zip(FEATURE_COLUMNS) {
            match find(name) {
                Some(pos) => *slot = pos,
                None => missing.push(name.to_string()),
            }
        }
        let label = find(LABEL_COLUMN);
        if require_label && label.is_none() {
            missing.push(LABEL_COLUMN.to_string());
        }

        match id {
            Some(id) if missing.is_empty() => Ok(Self {
                id,
                amount_owed: features[0],
                days_overdue: features[1],
                customer_type: features[2],
                payment_history: features[3],
                contact_attempts: features[4],
                region: features[5],
                label,
            }),
            _ => Err(DcaError::MalformedInput { missing }),
        }
    }
}

/// A parsed case file: typed cases plus the raw text they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseTable {
    headers: Vec<String>,
    /// One entry per case, each exactly `headers.len()` fields.
    records: Vec<Vec<String>>,
    cases:   Vec<Case>,
}

impl CaseTable {
    /// Table in the standard training layout, for cases that never came
    /// from a file (generator output, in-memory batches).
    pub fn from_cases(cases: Vec<Case>) -> Self {
        let headers = std::iter::once(ID_COLUMN)
            .chain(FEATURE_COLUMNS)
            .chain([LABEL_COLUMN])
            .map(str::to_string)
            .collect();
        let records = cases
            .iter()
            .map(|c| {
                vec![
                    c.case_id().to_string(),
                    format_amount(c.amount_owed()),
                    c.days_overdue().to_string(),
                    c.customer_type().to_string(),
                    c.payment_history().to_string(),
                    c.contact_attempts().to_string(),
                    c.region().to_string(),
                    c.recovery_likelihood().map(|l| l.label()).unwrap_or_default().to_string(),
                ]
            })
            .collect();
        Self { headers, records, cases }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn into_cases(self) -> Vec<Case> {
        self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Read cases for scoring. A `recovery_likelihood` column, when
/// present, is carried along as the ground-truth label.
pub fn read_cases<R: Read>(reader: R) -> DcaResult<CaseTable> {
    read_with(reader, false)
}

/// Read labelled training cases; the label column is mandatory.
pub fn read_training_cases<R: Read>(reader: R) -> DcaResult<Vec<Case>> {
    read_with(reader, true).map(CaseTable::into_cases)
}

fn read_with<R: Read>(reader: R, require_label: bool) -> DcaResult<CaseTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let columns = Columns::resolve(&headers, require_label)?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    let mut cases = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let case = parse_row(&record, &columns, row, require_label)?;
        if !seen.insert(case.case_id().to_string()) {
            return Err(DcaError::InvalidRow {
                row,
                reason: format!("duplicate case_id '{}'", case.case_id()),
            });
        }

        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        fields.resize(headers.len(), String::new());
        records.push(fields);
        cases.push(case);
    }

    log::debug!("Ingested {} cases", cases.len());
    Ok(CaseTable {
        headers: headers.iter().map(str::to_string).collect(),
        records,
        cases,
    })
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &Columns,
    row: usize,
    require_label: bool,
) -> DcaResult<Case> {
    let invalid = |reason: String| DcaError::InvalidRow { row, reason };
    let field = |pos: usize| record.get(pos).unwrap_or("");

    let amount_owed: f64 = field(columns.amount_owed)
        .parse()
        .map_err(|_| invalid(format!("amount_owed '{}' is not a number", field(columns.amount_owed))))?;
    let days_overdue = parse_count(field(columns.days_overdue))
        .ok_or_else(|| invalid(format!("days_overdue '{}' is not a non-negative integer", field(columns.days_overdue))))?;
    let contact_attempts = parse_count(field(columns.contact_attempts))
        .ok_or_else(|| invalid(format!("contact_attempts '{}' is not a non-negative integer", field(columns.contact_attempts))))?;

    let mut case = Case::new(
        field(columns.id),
        amount_owed,
        days_overdue,
        field(columns.customer_type),
        field(columns.payment_history),
        contact_attempts,
        field(columns.region),
    )
    .map_err(|e| match e {
        DcaError::InvalidCase { reason } => invalid(reason),
        other => other,
    })?;

    if let Some(pos) = columns.label {
        let raw = field(pos);
        if raw.is_empty() {
            if require_label {
                return Err(invalid("recovery_likelihood is empty".into()));
            }
        } else {
            let label: RecoveryLikelihood = raw.parse().map_err(invalid)?;
            case = case.with_label(label);
        }
    }

    Ok(case)
}

/// Non-negative integer, tolerating integral floats such as "45.0".
fn parse_count(raw: &str) -> Option<u32> {
    if let Ok(v) = raw.parse::<u32>() {
        return Some(v);
    }
    let v: f64 = raw.parse().ok()?;
    (v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64).then_some(v as u32)
}

/// Shortest text that reads back to the same value: 500.0 is "500".
pub fn format_amount(amount: f64) -> String {
    amount.to_string()
}

/// Write cases in the training-file layout.
pub fn write_cases<W: Write>(writer: W, cases: &[Case]) -> DcaResult<()> {
    let table = CaseTable::from_cases(cases.to_vec());
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&table.headers)?;
    for record in &table.records {
        csv_writer.write_record(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write an assigned batch: every input column as read, then
/// predicted_recovery, confidence_score and dca_assigned. A result
/// column already present in the input (a re-processed output file) is
/// overwritten where it stands instead of being duplicated.
pub fn write_assigned<W: Write>(
    writer: W,
    table: &CaseTable,
    assigned: &[AssignedCase],
    delimiter: u8,
) -> DcaResult<()> {
    if assigned.len() != table.len() {
        return Err(anyhow::anyhow!(
            "{} assigned cases for a table of {} rows",
            assigned.len(),
            table.len()
        )
        .into());
    }

    let mut headers = table.headers.clone();
    let positions = OUTPUT_COLUMNS.map(|name| match headers.iter().position(|h| h == name) {
        Some(pos) => pos,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    });

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    csv_writer.write_record(&headers)?;

    for (i, ((record, case), out)) in table.records.iter().zip(&table.cases).zip(assigned).enumerate() {
        if out.case.case_id() != case.case_id() {
            return Err(DcaError::InvalidRow {
                row: i + 1,
                reason: format!(
                    "assigned case '{}' does not match input case '{}'",
                    out.case.case_id(),
                    case.case_id()
                ),
            });
        }
        let mut fields = record.clone();
        fields.resize(headers.len(), String::new());
        let [predicted, confidence, agency] = positions;
        fields[predicted] = out.predicted_recovery.map(|l| l.label()).unwrap_or_default().to_string();
        fields[confidence] = out.confidence_score.map(|c| c.to_string()).unwrap_or_default();
        fields[agency] = out.dca_assigned.clone();
        csv_writer.write_record(&fields)?;
    }
    csv_writer.flush()?;
    Ok(())
}

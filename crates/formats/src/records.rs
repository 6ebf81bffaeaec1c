use std::io::Read;

use scene::Record;
use tracing::debug;

/// Source column names for the three drill-down dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    pub category: String,
    pub sub_category: String,
    pub timestamp: String,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self {
            category: "category".to_string(),
            sub_category: "sub_category".to_string(),
            timestamp: "timestamp".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum CsvRecordError {
    Csv(csv::Error),
    MissingColumn { column: String },
}

impl std::fmt::Display for CsvRecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvRecordError::Csv(e) => write!(f, "CSV error: {e}"),
            CsvRecordError::MissingColumn { column } => {
                write!(f, "CSV header has no column named {column:?}")
            }
        }
    }
}

impl std::error::Error for CsvRecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CsvRecordError::Csv(e) => Some(e),
            CsvRecordError::MissingColumn { .. } => None,
        }
    }
}

/// Reads a headered CSV into records. Empty cells become `None`; short rows
/// are tolerated.
pub fn parse_records<R: Read>(
    reader: R,
    schema: &RecordSchema,
) -> Result<Vec<Record>, CsvRecordError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(CsvRecordError::Csv)?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CsvRecordError::MissingColumn {
                column: name.to_string(),
            })
    };
    let category = column(&schema.category)?;
    let sub_category = column(&schema.sub_category)?;
    let timestamp = column(&schema.timestamp)?;

    let mut out = Vec::new();
    for row in rdr.records() {
        let row = row.map_err(CsvRecordError::Csv)?;
        let cell = |i: usize| {
            row.get(i)
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
        };
        out.push(Record {
            category: cell(category),
            sub_category: cell(sub_category),
            timestamp: cell(timestamp),
        });
    }
    debug!(rows = out.len(), "parsed CSV records");
    Ok(out)
}

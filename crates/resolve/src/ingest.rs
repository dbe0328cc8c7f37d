//! CSV boundary: header-mapped loading and flagged export.

use crate::config::ColumnMapping;
use crate::error::DedupError;
use crate::model::{Field, Record};
use crate::normalize::clean;

/// Extra columns appended by [`write_csv_records`].
pub const REVIEW_HEADERS: [&str; 4] = [
    "duplicate_flag",
    "duplicate_count",
    "completeness_score",
    "duplicate_note",
];

/// Load records from CSV text. Every value is cleaned; `original_index` is
/// the 0-based data row.
///
/// The center column is required, as is any column named by an explicit
/// mapping. Other canonical columns missing from the file load as empty.
pub fn load_csv_records(
    csv_data: &str,
    source: &str,
    columns: &ColumnMapping,
) -> Result<Vec<Record>, DedupError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(clean).collect();

    let mut positions: Vec<(Field, usize)> = Vec::new();
    for field in Field::ALL {
        let name = columns.header(field);
        match headers.iter().position(|h| h == name) {
            Some(i) => positions.push((field, i)),
            None if field == Field::Center || columns.0.contains_key(&field) => {
                return Err(DedupError::MissingColumn {
                    column: name.to_string(),
                });
            }
            None => {}
        }
    }

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let row_data = result?;
        let mut record = Record::new(source, row);
        for &(field, i) in &positions {
            *record.field_mut(field) = clean(row_data.get(i).unwrap_or(""));
        }
        records.push(record);
    }

    log::debug!("{source}: loaded {} record(s)", records.len());
    Ok(records)
}

/// Render records as CSV with canonical headers and review columns.
pub fn write_csv_records(records: &[Record]) -> Result<String, DedupError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header: Vec<&str> = Field::ALL
        .iter()
        .map(|f| f.name())
        .chain(REVIEW_HEADERS)
        .collect();
    writer.write_record(&header)?;

    for record in records {
        let (flag, count, score, note) = match &record.review {
            Some(r) => (
                r.group_id.to_string(),
                r.duplicate_count.to_string(),
                r.completeness_score.to_string(),
                r.note.clone().unwrap_or_default(),
            ),
            None => Default::default(),
        };
        let mut row: Vec<String> = Field::ALL.iter().map(|f| record.get(*f).to_string()).collect();
        row.extend([flag, count, score, note]);
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DedupError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DedupError::Csv(e.to_string()))
}

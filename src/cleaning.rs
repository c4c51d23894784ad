use crate::config::CoercionPolicy;
use crate::error::{ReportError, Result};
use crate::types::{BirthRecord, RawRow, CANONICAL_COLUMNS};
use crate::util::{non_empty, normalize_column_name, parse_integer, title_case};
use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Sentinel for a missing region name.
pub const UNKNOWN_REGION: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub total_rows: usize,
    pub skipped_rows: usize,
    pub duplicates_removed: usize,
    /// Sum of `jumlah_kelahiran` over the removed duplicates.
    pub duplicate_birth_count: u64,
    /// Missing cells per canonical column, counted after deduplication.
    pub null_counts: Vec<(String, usize)>,
    pub written_rows: usize,
}

/// A row after type coercion but before null filling and standardisation.
/// Duplicates are detected at this stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CoercedRow {
    region_code: String,
    region_name: Option<String>,
    birth_status: Option<String>,
    sex: Option<String>,
    birth_count: Option<u64>,
    year: Option<i32>,
}

/// Positions of the six required columns in a header row.
struct ColumnIndex([usize; 6]);

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(normalize_column_name).collect();
        let mut idx = [0usize; 6];
        let mut missing = Vec::new();
        for (slot, name) in CANONICAL_COLUMNS.iter().enumerate() {
            match normalized.iter().position(|h| h == name) {
                Some(i) => idx[slot] = i,
                None => missing.push((*name).to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(ReportError::Schema { missing });
        }
        Ok(Self(idx))
    }

    /// Decode one raw row. Invalid UTF-8 in a required column fails like any
    /// other unparseable cell; in other columns it is replaced lossily.
    fn decode(&self, record: ByteRecord, row: usize, line: u64) -> Result<StringRecord> {
        match StringRecord::from_byte_record(record) {
            Ok(decoded) => Ok(decoded),
            Err(e) => {
                let field = e.utf8_error().field();
                let record = e.into_byte_record();
                match self.0.iter().position(|&i| i == field) {
                    Some(slot) => {
                        let value = String::from_utf8_lossy(&record[field]);
                        Err(coercion_error(row, line, CANONICAL_COLUMNS[slot], &value))
                    }
                    None => Ok(StringRecord::from_byte_record_lossy(record)),
                }
            }
        }
    }

    fn extract(&self, record: &StringRecord) -> RawRow {
        let cell = |slot: usize| record.get(self.0[slot]).and_then(non_empty);
        RawRow {
            region_code: cell(0),
            region_name: cell(1),
            birth_status: cell(2),
            sex: cell(3),
            birth_count: cell(4),
            year: cell(5),
        }
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ReportError::FileNotFound { path: path.to_path_buf() })
    }
}

fn coercion_error(row: usize, line: u64, column: &str, value: &str) -> ReportError {
    ReportError::Coercion {
        row,
        line,
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn coerce(raw: RawRow, row: usize, line: u64) -> Result<CoercedRow> {
    let year = match raw.year.as_deref() {
        None => None,
        Some(text) => match parse_integer(text).and_then(|v| i32::try_from(v).ok()) {
            Some(y) => Some(y),
            None => return Err(coercion_error(row, line, "tahun", text)),
        },
    };
    let birth_count = match raw.birth_count.as_deref() {
        None => None,
        Some(text) => match parse_integer(text).and_then(|v| u64::try_from(v).ok()) {
            Some(c) => Some(c),
            None => return Err(coercion_error(row, line, "jumlah_kelahiran", text)),
        },
    };
    Ok(CoercedRow {
        region_code: raw.region_code.map(|c| c.trim().to_string()).unwrap_or_default(),
        region_name: raw.region_name,
        birth_status: raw.birth_status,
        sex: raw.sex,
        birth_count,
        year,
    })
}

fn null_counts(rows: &[CoercedRow]) -> Vec<(String, usize)> {
    let counts = [
        rows.iter().filter(|r| r.region_code.is_empty()).count(),
        rows.iter().filter(|r| r.region_name.is_none()).count(),
        rows.iter().filter(|r| r.birth_status.is_none()).count(),
        rows.iter().filter(|r| r.sex.is_none()).count(),
        rows.iter().filter(|r| r.birth_count.is_none()).count(),
        rows.iter().filter(|r| r.year.is_none()).count(),
    ];
    CANONICAL_COLUMNS
        .iter()
        .zip(counts)
        .map(|(name, n)| ((*name).to_string(), n))
        .collect()
}

fn standardize(text: Option<String>, fallback: &str) -> String {
    let value = text.unwrap_or_else(|| fallback.to_string());
    title_case(&value).trim().to_string()
}

/// Read the raw export and produce canonical records without touching disk.
pub fn clean_records(raw_path: &Path, policy: CoercionPolicy) -> Result<(Vec<BirthRecord>, CleanReport)> {
    ensure_exists(raw_path)?;
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(raw_path)?;
    let columns = ColumnIndex::resolve(rdr.headers()?)?;
    info!("Columns normalised and selected from {}", raw_path.display());

    let mut report = CleanReport::default();
    let mut coerced: Vec<CoercedRow> = Vec::new();
    for (i, result) in rdr.byte_records().enumerate() {
        let raw = result?;
        report.total_rows += 1;
        let row = i + 1;
        let line = raw.position().map(|p| p.line()).unwrap_or(0);
        let parsed = columns
            .decode(raw, row, line)
            .and_then(|record| coerce(columns.extract(&record), row, line));
        match parsed {
            Ok(row) => coerced.push(row),
            Err(e) => match policy {
                CoercionPolicy::Fail => return Err(e),
                CoercionPolicy::SkipAndWarn => {
                    warn!("Skipping row: {e}");
                    report.skipped_rows += 1;
                }
            },
        }
    }
    info!("Column types coerced ({} rows)", coerced.len());

    let mut seen: HashSet<CoercedRow> = HashSet::with_capacity(coerced.len());
    let mut unique: Vec<CoercedRow> = Vec::with_capacity(coerced.len());
    for row in coerced {
        if seen.contains(&row) {
            report.duplicates_removed += 1;
            report.duplicate_birth_count += row.birth_count.unwrap_or(0);
        } else {
            seen.insert(row.clone());
            unique.push(row);
        }
    }
    info!("Duplicates removed ({} rows)", report.duplicates_removed);

    report.null_counts = null_counts(&unique);
    for (column, n) in &report.null_counts {
        debug!("missing {column}: {n}");
    }

    let records: Vec<BirthRecord> = unique
        .into_iter()
        .map(|row| BirthRecord {
            region_code: row.region_code,
            region_name: standardize(row.region_name, UNKNOWN_REGION),
            birth_status: standardize(row.birth_status, ""),
            sex: standardize(row.sex, ""),
            birth_count: row.birth_count.unwrap_or(0),
            year: row.year.unwrap_or(0),
        })
        .collect();
    info!("Missing values filled and labels standardised");

    report.written_rows = records.len();
    Ok((records, report))
}

/// Clean the raw export and write the canonical CSV to `output_path`,
/// replacing any existing file.
pub fn clean(raw_path: &Path, output_path: &Path, policy: CoercionPolicy) -> Result<(Vec<BirthRecord>, CleanReport)> {
    let (records, report) = clean_records(raw_path, policy)?;
    write_canonical(output_path, &records)?;
    info!("Canonical CSV written to {} ({} rows)", output_path.display(), records.len());
    Ok((records, report))
}

/// Write canonical records with a header row, even when there are no records.
pub fn write_canonical(path: &Path, records: &[BirthRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(CANONICAL_COLUMNS)?;
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Load the canonical CSV.
pub fn read_canonical(path: &Path) -> Result<Vec<BirthRecord>> {
    ensure_exists(path)?;
    let mut rdr = ReaderBuilder::new().from_path(path)?;
    ColumnIndex::resolve(rdr.headers()?)?;
    let mut records = Vec::new();
    for result in rdr.deserialize::<BirthRecord>() {
        records.push(result?);
    }
    debug!("Loaded {} canonical rows from {}", records.len(), path.display());
    Ok(records)
}

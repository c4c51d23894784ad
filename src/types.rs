use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Column headers of the canonical CSV, in file order.
pub const CANONICAL_COLUMNS: [&str; 6] = [
    "kode_kabupaten_kota",
    "nama_kabupaten_kota",
    "status_kelahiran",
    "jenis_kelamin",
    "jumlah_kelahiran",
    "tahun",
];

/// One row of the raw export, cells kept as text until coercion.
/// Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub region_code: Option<String>,
    pub region_name: Option<String>,
    pub birth_status: Option<String>,
    pub sex: Option<String>,
    pub birth_count: Option<String>,
    pub year: Option<String>,
}

/// A canonical birth record as stored in the cleaned CSV.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BirthRecord {
    #[serde(rename = "kode_kabupaten_kota")]
    pub region_code: String,
    #[serde(rename = "nama_kabupaten_kota")]
    pub region_name: String,
    #[serde(rename = "status_kelahiran")]
    pub birth_status: String,
    #[serde(rename = "jenis_kelamin")]
    pub sex: String,
    #[serde(rename = "jumlah_kelahiran")]
    pub birth_count: u64,
    #[serde(rename = "tahun")]
    pub year: i32,
}

/// Columns a table can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    RegionCode,
    RegionName,
    BirthStatus,
    Sex,
    Year,
}

impl Field {
    pub fn column_name(self) -> &'static str {
        match self {
            Field::RegionCode => "kode_kabupaten_kota",
            Field::RegionName => "nama_kabupaten_kota",
            Field::BirthStatus => "status_kelahiran",
            Field::Sex => "jenis_kelamin",
            Field::Year => "tahun",
        }
    }

    pub fn value_of(self, record: &BirthRecord) -> KeyValue {
        match self {
            Field::RegionCode => KeyValue::Text(record.region_code.clone()),
            Field::RegionName => KeyValue::Text(record.region_name.clone()),
            Field::BirthStatus => KeyValue::Text(record.birth_status.clone()),
            Field::Sex => KeyValue::Text(record.sex.clone()),
            Field::Year => KeyValue::Int(i64::from(record.year)),
        }
    }
}

/// Value the aggregation sums per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Measure {
    /// Sum of `jumlah_kelahiran`.
    #[default]
    BirthCount,
    /// Number of canonical rows.
    RowCount,
}

impl Measure {
    pub fn value_of(self, record: &BirthRecord) -> u64 {
        match self {
            Measure::BirthCount => record.birth_count,
            Measure::RowCount => 1,
        }
    }
}

/// One component of a group key. Years stay numeric so they order numerically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(v) => write!(f, "{v}"),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTotal {
    pub key: Vec<KeyValue>,
    pub total: u64,
}

impl GroupTotal {
    /// Key components joined with " / ", for single-key groups just the value.
    pub fn label(&self) -> String {
        self.key
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// A group total with its share of the grand total, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub label: String,
    pub total: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("▲ Naik"),
            Direction::Down => f.write_str("▼ Turun"),
        }
    }
}

/// Change between two consecutive yearly totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearChange {
    pub from: i32,
    pub to: i32,
    pub direction: Direction,
    pub change: i64,
    /// `None` when the earlier year's total is zero.
    pub percent: Option<f64>,
}

/// A projected yearly total with its 95% prediction interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastPoint {
    /// Whole births as displayed: truncates toward zero, same as an integer cast.
    pub fn predicted_births(&self) -> i64 {
        self.predicted.trunc() as i64
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YearTotalRow {
    #[serde(rename = "Tahun")]
    #[tabled(rename = "Tahun")]
    pub year: i32,
    #[serde(rename = "JumlahKelahiran")]
    #[tabled(rename = "Jumlah Kelahiran")]
    pub total: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YearChangeRow {
    #[serde(rename = "Periode")]
    #[tabled(rename = "Dari → Ke")]
    pub period: String,
    #[serde(rename = "Arah")]
    #[tabled(rename = "Arah")]
    pub direction: String,
    #[serde(rename = "Perubahan")]
    #[tabled(rename = "Perubahan")]
    pub change: String,
    #[serde(rename = "Persentase")]
    #[tabled(rename = "Persentase")]
    pub percent: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ShareRow {
    #[serde(rename = "Kategori")]
    #[tabled(rename = "Kategori")]
    pub label: String,
    #[serde(rename = "JumlahKelahiran")]
    #[tabled(rename = "Jumlah Kelahiran")]
    pub total: String,
    #[serde(rename = "Persen")]
    #[tabled(rename = "Persen")]
    pub percent: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HeatmapRow {
    #[serde(rename = "KabupatenKota")]
    #[tabled(rename = "Kabupaten/Kota")]
    pub region: String,
    #[serde(rename = "Latitude")]
    #[tabled(rename = "Latitude")]
    pub latitude: String,
    #[serde(rename = "Longitude")]
    #[tabled(rename = "Longitude")]
    pub longitude: String,
    #[serde(rename = "TotalKelahiran")]
    #[tabled(rename = "Total Kelahiran")]
    pub total: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ForecastRow {
    #[serde(rename = "Tahun")]
    #[tabled(rename = "Tahun")]
    pub year: i32,
    #[serde(rename = "PrediksiKelahiran")]
    #[tabled(rename = "Prediksi Kelahiran")]
    pub predicted: String,
    #[serde(rename = "Interval95")]
    #[tabled(rename = "Interval 95%")]
    pub interval: String,
}

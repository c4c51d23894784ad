// Configuration for the birth report.

use std::ops::RangeInclusive;
use std::path::PathBuf;

/// How cleaning treats a `tahun`/`jumlah_kelahiran` cell that cannot be
/// read as a non-negative integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionPolicy {
    /// Abort cleaning and report the offending row.
    #[default]
    Fail,
    /// Drop the row, log a warning and keep going.
    SkipAndWarn,
}

/// Inclusive year window applied before every aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn as_range(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }

    /// Label used in titles and file names, e.g. `2012–2023`.
    pub fn label(&self) -> String {
        format!("{}–{}", self.start, self.end)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(2012, 2023)
    }
}

/// Configuration for the report pipeline
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Raw CSV exported from the open data portal
    pub raw_path: PathBuf,
    /// Canonical CSV written by cleaning and read by every view
    pub canonical_path: PathBuf,
    /// Directory for chart and map artifacts
    pub artifact_dir: PathBuf,
    /// Directory for exported report tables
    pub report_dir: PathBuf,
    /// Years kept by the aggregation filter
    pub year_range: YearRange,
    /// Number of future years to forecast
    pub horizon: usize,
    /// Policy for unparseable year/count cells
    pub coercion: CoercionPolicy,
    /// Whether the heatmap tries to download the boundary overlay
    pub fetch_boundary: bool,
    /// GeoJSON with the regency/city boundaries
    pub boundary_url: String,
    /// Timeout for the boundary download
    pub http_timeout_secs: u64,
    /// Rows shown in the regional preview
    pub top_n: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("rawdata/rawdata_kelahiran_jawabarat_2012-2023.csv"),
            canonical_path: PathBuf::from("final_dataset/dataset_kelahiran_jawabarat_2012-2023.csv"),
            artifact_dir: PathBuf::from("visualisasi"),
            report_dir: PathBuf::from("reports"),
            year_range: YearRange::default(),
            horizon: 2,
            coercion: CoercionPolicy::Fail,
            fetch_boundary: true,
            boundary_url: "https://github.com/hitamcoklat/Jawa-Barat-Geo-JSON/blob/master/Jabar_By_Kab.geojson?raw=true".to_string(),
            http_timeout_secs: 10,
            top_n: 10,
        }
    }
}

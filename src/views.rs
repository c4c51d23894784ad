// Dashboard pages.
//
// Every page is a plain function from the canonical records and the
// configuration to a `PageOutput`. The shell looks pages up through
// `Page::builder`. The typed `*_view` functions hold the numbers behind
// each page and do no I/O.

use crate::aggregate::{
    aggregate_ordered, extremes, filtered_total, shares, year_over_year, yearly_totals, GroupOrder,
};
use crate::chart;
use crate::config::{AppConfig, YearRange};
use crate::error::{ReportError, Result};
use crate::forecast::{forecast_with_model, FitAccuracy};
use crate::geo::{self, HeatPoint};
use crate::output::{table_string, write_csv, write_json};
use crate::types::{
    BirthRecord, Field, ForecastPoint, ForecastRow, HeatmapRow, Measure, Share, ShareRow,
    YearChange, YearChangeRow, YearTotal, YearTotalRow,
};
use crate::util::{format_int, format_percent, format_signed_percent};
use chrono::{DateTime, Local};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(String),
    Table(String),
    Artifact(PathBuf),
    Warning(String),
    Error(String),
}

/// What a page shows: a title and an ordered list of blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutput {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl PageOutput {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), blocks: Vec::new() }
    }

    /// A page whose builder failed; the error replaces the content.
    pub fn failed(title: impl Into<String>, err: &ReportError) -> Self {
        let mut page = Self::new(title);
        page.blocks.push(Block::Error(err.to_string()));
        page
    }

    pub fn text(&mut self, s: impl Into<String>) {
        self.blocks.push(Block::Text(s.into()));
    }

    pub fn table(&mut self, s: String) {
        self.blocks.push(Block::Table(s));
    }

    pub fn warning(&mut self, s: impl Into<String>) {
        self.blocks.push(Block::Warning(s.into()));
    }

    pub fn artifact(&mut self, path: PathBuf) {
        self.blocks.push(Block::Artifact(path));
    }

    pub fn has_errors(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, Block::Error(_)))
    }
}

impl fmt::Display for PageOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.chars().count()))?;
        for block in &self.blocks {
            match block {
                Block::Text(s) => writeln!(f, "{s}")?,
                Block::Table(s) => writeln!(f, "\n{s}\n")?,
                Block::Artifact(p) => writeln!(f, "- Saved to: {}", p.display())?,
                Block::Warning(s) => writeln!(f, "⚠️  {s}")?,
                Block::Error(s) => writeln!(f, "❌ {s}")?,
            }
        }
        Ok(())
    }
}

/// Dashboard pages, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Overview,
    Trend,
    Regional,
    Heatmap,
    GenderStatus,
    Forecast,
    Conclusions,
}

pub type PageBuilder = fn(&[BirthRecord], &AppConfig) -> Result<PageOutput>;

impl Page {
    pub const ALL: [Page; 7] = [
        Page::Overview,
        Page::Trend,
        Page::Regional,
        Page::Heatmap,
        Page::GenderStatus,
        Page::Forecast,
        Page::Conclusions,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Dashboard",
            Page::Trend => "Tren Tahunan",
            Page::Regional => "Distribusi Kabupaten/Kota",
            Page::Heatmap => "Heatmap Persebaran",
            Page::GenderStatus => "Jenis Kelamin & Status",
            Page::Forecast => "Prediksi",
            Page::Conclusions => "Kesimpulan",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Page::Overview => "overview",
            Page::Trend => "trend",
            Page::Regional => "regional",
            Page::Heatmap => "heatmap",
            Page::GenderStatus => "gender-status",
            Page::Forecast => "forecast",
            Page::Conclusions => "conclusions",
        }
    }

    pub fn builder(self) -> PageBuilder {
        match self {
            Page::Overview => overview_page,
            Page::Trend => trend_page,
            Page::Regional => regional_page,
            Page::Heatmap => heatmap_page,
            Page::GenderStatus => gender_status_page,
            Page::Forecast => forecast_page,
            Page::Conclusions => conclusions_page,
        }
    }

    /// Run the page, turning an error into an error page.
    pub fn render(self, records: &[BirthRecord], config: &AppConfig) -> PageOutput {
        match (self.builder())(records, config) {
            Ok(page) => page,
            Err(e) => {
                warn!("Page {} failed: {e}", self.slug());
                PageOutput::failed(self.title(), &e)
            }
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Page::ALL
            .into_iter()
            .find(|p| p.slug() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Page::ALL.iter().map(|p| p.slug()).collect();
                format!("unknown page '{s}', expected one of: {}", names.join(", "))
            })
    }
}

// ----- typed views -----

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewView {
    pub records: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub regions: usize,
    pub total_births: u64,
}

pub fn overview_view(records: &[BirthRecord], years: YearRange) -> OverviewView {
    let kept: Vec<&BirthRecord> = records.iter().filter(|r| years.contains(r.year)).collect();
    let regions: HashSet<&str> = kept.iter().map(|r| r.region_name.as_str()).collect();
    OverviewView {
        records: kept.len(),
        first_year: kept.iter().map(|r| r.year).min(),
        last_year: kept.iter().map(|r| r.year).max(),
        regions: regions.len(),
        total_births: filtered_total(records, Measure::BirthCount, years),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendView {
    pub totals: Vec<YearTotal>,
    pub changes: Vec<YearChange>,
    pub highest: Option<YearTotal>,
    pub lowest: Option<YearTotal>,
}

pub fn trend_view(records: &[BirthRecord], years: YearRange) -> TrendView {
    let totals = yearly_totals(records, years);
    let changes = year_over_year(&totals);
    let (highest, lowest) = match extremes(&totals, |t| t.total) {
        Some((max, min)) => (Some(*max), Some(*min)),
        None => (None, None),
    };
    TrendView { totals, changes, highest, lowest }
}

/// Region totals, largest first, with their share of all births.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalView {
    pub shares: Vec<Share>,
}

impl RegionalView {
    pub fn highest(&self) -> Option<&Share> {
        self.shares.first()
    }

    pub fn lowest(&self) -> Option<&Share> {
        self.shares.last()
    }
}

pub fn regional_view(records: &[BirthRecord], years: YearRange) -> RegionalView {
    let groups = aggregate_ordered(records, &[Field::RegionName], Measure::BirthCount, years, GroupOrder::TotalDescending);
    RegionalView { shares: shares(&groups) }
}

/// Births by sex and by birth status, each smallest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryView {
    pub by_sex: Vec<Share>,
    pub by_status: Vec<Share>,
    pub total: u64,
}

pub fn category_view(records: &[BirthRecord], years: YearRange) -> CategoryView {
    let by = |field: Field| {
        shares(&aggregate_ordered(records, &[field], Measure::BirthCount, years, GroupOrder::TotalAscending))
    };
    CategoryView {
        by_sex: by(Field::Sex),
        by_status: by(Field::BirthStatus),
        total: filtered_total(records, Measure::BirthCount, years),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapView {
    pub points: Vec<HeatPoint>,
    /// Rows whose region name has a known centroid.
    pub mapped_rows: usize,
    pub distinct_regions: usize,
}

pub fn heatmap_view(records: &[BirthRecord], years: YearRange) -> HeatmapView {
    let mapped_rows = records.iter().filter(|r| geo::locate(&r.region_name).1).count();
    let distinct_regions = records
        .iter()
        .map(|r| r.region_name.as_str())
        .collect::<HashSet<_>>()
        .len();
    let points = aggregate_ordered(records, &[Field::RegionName], Measure::BirthCount, years, GroupOrder::TotalDescending)
        .into_iter()
        .map(|g| {
            let region = g.label();
            let ((latitude, longitude), _) = geo::locate(&region);
            HeatPoint { region, latitude, longitude, total: g.total }
        })
        .collect();
    HeatmapView { points, mapped_rows, distinct_regions }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub history: Vec<YearTotal>,
    pub points: Vec<ForecastPoint>,
    pub accuracy: FitAccuracy,
    pub phi: f64,
    pub theta: f64,
}

pub fn forecast_view(records: &[BirthRecord], years: YearRange, horizon: usize) -> Result<ForecastView> {
    let history = yearly_totals(records, years);
    let (model, points) = forecast_with_model(&history, horizon)?;
    Ok(ForecastView {
        history,
        accuracy: model.accuracy(),
        phi: model.phi(),
        theta: model.theta(),
        points,
    })
}

// ----- table rows -----

fn year_rows(totals: &[YearTotal]) -> Vec<YearTotalRow> {
    totals
        .iter()
        .map(|t| YearTotalRow { year: t.year, total: format_int(t.total) })
        .collect()
}

fn change_rows(changes: &[YearChange]) -> Vec<YearChangeRow> {
    changes
        .iter()
        .map(|c| YearChangeRow {
            period: format!("{} → {}", c.from, c.to),
            direction: c.direction.to_string(),
            change: format_int(c.change.unsigned_abs()),
            percent: c.percent.map(format_signed_percent).unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

fn share_rows(shares: &[Share]) -> Vec<ShareRow> {
    shares
        .iter()
        .map(|s| ShareRow {
            label: s.label.clone(),
            total: format_int(s.total),
            percent: format_percent(s.percent),
        })
        .collect()
}

fn heatmap_rows(points: &[HeatPoint]) -> Vec<HeatmapRow> {
    points
        .iter()
        .map(|p| HeatmapRow {
            region: p.region.clone(),
            latitude: format!("{:.4}", p.latitude),
            longitude: format!("{:.4}", p.longitude),
            total: format_int(p.total),
        })
        .collect()
}

fn forecast_rows(points: &[ForecastPoint]) -> Vec<ForecastRow> {
    points
        .iter()
        .map(|p| ForecastRow {
            year: p.year,
            predicted: format_int(p.predicted_births()),
            interval: format!(
                "{} – {}",
                format_int(p.lower.trunc() as i64),
                format_int(p.upper.trunc() as i64)
            ),
        })
        .collect()
}

fn file_years(years: YearRange) -> String {
    format!("{}-{}", years.start, years.end)
}

/// Attach a chart artifact, or a warning when rendering fails.
fn attach_chart(page: &mut PageOutput, path: PathBuf, rendered: Result<()>) {
    match rendered {
        Ok(()) => page.artifact(path),
        Err(e) => {
            warn!("Chart {} not written: {e}", path.display());
            page.warning(format!("Grafik tidak dapat dibuat: {e}"));
        }
    }
}

// ----- page builders -----

fn overview_page(records: &[BirthRecord], config: &AppConfig) -> Result<PageOutput> {
    let view = overview_view(records, config.year_range);
    let mut page = PageOutput::new(format!(
        "Dashboard Analisis Jumlah Kelahiran di Jawa Barat ({})",
        config.year_range.label()
    ));
    page.text("Ringkasan Analisis");
    page.text(format!("- Jumlah baris data     : {}", format_int(view.records)));
    if let (Some(first), Some(last)) = (view.first_year, view.last_year) {
        page.text(format!("- Periode data          : {first}–{last}"));
    }
    page.text(format!("- Jumlah kabupaten/kota : {}", view.regions));
    page.text(format!("- Total kelahiran       : {}", format_int(view.total_births)));
    page.text(format!(
        "- Prediksi              : ARIMA(1,1,1), {} tahun ke depan",
        config.horizon
    ));
    Ok(page)
}

fn trend_page(records: &[BirthRecord], config: &AppConfig) -> Result<PageOutput> {
    let years = config.year_range;
    let view = trend_view(records, years);
    let mut page = PageOutput::new(format!("Tren Jumlah Kelahiran per Tahun ({})", years.label()));
    page.table(table_string(&year_rows(&view.totals), usize::MAX));
    if let (Some(max), Some(min)) = (view.highest, view.lowest) {
        page.text(format!("- Tahun dengan Kelahiran Tertinggi : {} ({})", max.year, format_int(max.total)));
        page.text(format!("- Tahun dengan Kelahiran Terendah  : {} ({})", min.year, format_int(min.total)));
    }
    if !view.changes.is_empty() {
        page.table(table_string(&change_rows(&view.changes), usize::MAX));
    }
    if !view.totals.is_empty() {
        let path = config.artifact_dir.join(format!("tren_kelahiran_{}.svg", file_years(years)));
        let rendered = chart::render_series(
            &path,
            &format!("Tren Jumlah Kelahiran di Jawa Barat ({})", years.label()),
            &view.totals,
            &[],
        );
        attach_chart(&mut page, path, rendered);
    }
    Ok(page)
}

fn regional_page(records: &[BirthRecord], config: &AppConfig) -> Result<PageOutput> {
    let years = config.year_range;
    let view = regional_view(records, years);
    let mut page = PageOutput::new(format!("Distribusi Kelahiran per Kabupaten/Kota ({})", years.label()));
    page.text(format!("Top {} wilayah:", config.top_n));
    page.table(table_string(&share_rows(&view.shares), config.top_n));
    if let (Some(max), Some(min)) = (view.highest(), view.lowest()) {
        page.text(format!("- Wilayah dengan Kelahiran Tertinggi : {} ({})", max.label, format_int(max.total)));
        page.text(format!("- Wilayah dengan Kelahiran Terendah  : {} ({})", min.label, format_int(min.total)));
    }
    if !view.shares.is_empty() {
        let path = config.artifact_dir.join(format!("distribusi_kabupaten_kota_{}.svg", file_years(years)));
        let rendered = chart::render_bars(
            &path,
            "Distribusi Jumlah Kelahiran per Kabupaten/Kota",
            &view.shares,
            config.top_n,
        );
        attach_chart(&mut page, path, rendered);
    }
    Ok(page)
}

fn heatmap_page(records: &[BirthRecord], config: &AppConfig) -> Result<PageOutput> {
    let years = config.year_range;
    let view = heatmap_view(records, years);
    let mut page = PageOutput::new(format!("Persebaran Geografis Kelahiran ({})", years.label()));
    page.text(format!(
        "- Baris dengan koordinat wilayah: {} dari {} baris ({} wilayah)",
        format_int(view.mapped_rows),
        format_int(records.len()),
        view.distinct_regions
    ));
    page.table(table_string(&heatmap_rows(&view.points), usize::MAX));
    if let (Some(max), Some(min)) = (view.points.first(), view.points.last()) {
        page.text(format!("- Wilayah dengan Kelahiran Tertinggi : {} ({})", max.region, format_int(max.total)));
        page.text(format!("- Wilayah dengan Kelahiran Terendah  : {} ({})", min.region, format_int(min.total)));
    }

    let boundary = if config.fetch_boundary {
        match geo::fetch_boundary(&config.boundary_url, config.http_timeout_secs) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Boundary overlay unavailable: {e}");
                page.warning(format!("Garis batas wilayah tidak ditambahkan: {e}"));
                None
            }
        }
    } else {
        None
    };

    let path = config
        .artifact_dir
        .join(format!("heatmap_kelahiran_jawabarat_{}.html", file_years(years)));
    geo::write_heatmap_html(
        &path,
        &format!("Peta Heatmap Intensitas Kelahiran di Jawa Barat ({})", years.label()),
        &view.points,
        boundary.as_ref(),
    )?;
    page.artifact(path);
    Ok(page)
}

fn gender_status_page(records: &[BirthRecord], config: &AppConfig) -> Result<PageOutput> {
    let view = category_view(records, config.year_range);
    let mut page = PageOutput::new(format!(
        "Proporsi Kelahiran berdasarkan Jenis Kelamin & Status ({})",
        config.year_range.label()
    ));
    page.text("Jenis Kelamin:");
    page.table(table_string(&share_rows(&view.by_sex), usize::MAX));
    page.text("Status Kelahiran:");
    page.table(table_string(&share_rows(&view.by_status), usize::MAX));
    page.text(format!("TOTAL: {}", format_int(view.total)));
    Ok(page)
}

fn forecast_page(records: &[BirthRecord], config: &AppConfig) -> Result<PageOutput> {
    let view = forecast_view(records, config.year_range, config.horizon)?;
    let span = match (view.points.first(), view.points.last()) {
        (Some(a), Some(b)) => format!("{}–{}", a.year, b.year),
        _ => String::new(),
    };
    let mut page = PageOutput::new(format!("Prediksi Jumlah Kelahiran {span} (ARIMA(1,1,1))"));
    for p in &view.points {
        page.text(format!("- Tahun {} : {} kelahiran", p.year, format_int(p.predicted_births())));
    }
    page.table(table_string(&forecast_rows(&view.points), usize::MAX));
    page.text(format!(
        "Model: φ = {:.4}, θ = {:.4}; MAE in-sample = {}, RMSE = {}",
        view.phi,
        view.theta,
        format_int(view.accuracy.mae.round() as i64),
        format_int(view.accuracy.rmse.round() as i64)
    ));

    let file_span = span.replace('–', "-");
    let path = config.artifact_dir.join(format!("prediksi_kelahiran_arima_{file_span}.svg"));
    let rendered = chart::render_series(
        &path,
        &format!("Prediksi Jumlah Kelahiran Jawa Barat {span} (ARIMA)"),
        &view.history,
        &view.points,
    );
    attach_chart(&mut page, path, rendered);
    Ok(page)
}

fn conclusions_page(records: &[BirthRecord], config: &AppConfig) -> Result<PageOutput> {
    let years = config.year_range;
    let mut page = PageOutput::new("Kesimpulan");

    let trend = trend_view(records, years);
    if let (Some(first), Some(last)) = (trend.totals.first(), trend.totals.last()) {
        if first.total > 0 && first.year != last.year {
            let pct = (last.total as f64 - first.total as f64) / first.total as f64 * 100.0;
            page.text(format!(
                "- Kelahiran {} → {}: {} → {} ({})",
                first.year,
                last.year,
                format_int(first.total),
                format_int(last.total),
                format_signed_percent(pct)
            ));
        }
    }
    if let Some(peak) = trend.highest {
        page.text(format!("- Puncak kelahiran terjadi pada tahun {} ({})", peak.year, format_int(peak.total)));
    }

    let regional = regional_view(records, years);
    if let Some(top) = regional.highest() {
        page.text(format!(
            "- Wilayah dengan kelahiran tertinggi: {} ({} dari total)",
            top.label,
            format_percent(top.percent)
        ));
    }

    let categories = category_view(records, years);
    if !categories.by_sex.is_empty() {
        let parts: Vec<String> = categories
            .by_sex
            .iter()
            .map(|s| format!("{} {}", s.label, format_percent(s.percent)))
            .collect();
        page.text(format!("- Proporsi jenis kelamin: {}", parts.join(", ")));
    }

    match forecast_view(records, years, config.horizon) {
        Ok(view) => {
            if let (Some(last), Some(next)) = (view.history.last(), view.points.last()) {
                let direction = if next.predicted_births() > last.total as i64 { "naik" } else { "turun" };
                page.text(format!(
                    "- Prediksi {}: {} kelahiran ({} dibanding {})",
                    next.year,
                    format_int(next.predicted_births()),
                    direction,
                    last.year
                ));
            }
        }
        Err(e) => page.warning(format!("Prediksi tidak tersedia: {e}")),
    }
    Ok(page)
}

// ----- export -----

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub generated_at: DateTime<Local>,
    pub year_start: i32,
    pub year_end: i32,
    pub overview: OverviewView,
    pub yearly: Vec<YearTotal>,
    pub forecast: Vec<ForecastPoint>,
    pub forecast_error: Option<String>,
    pub files: Vec<PathBuf>,
}

/// Write every page's table as CSV under `report_dir`, plus `summary.json`.
pub fn export_reports(records: &[BirthRecord], config: &AppConfig) -> Result<ExportSummary> {
    let years = config.year_range;
    let dir = &config.report_dir;
    let mut files = Vec::new();

    let trend = trend_view(records, years);
    let path = dir.join("tren_tahunan.csv");
    write_csv(&path, &year_rows(&trend.totals))?;
    files.push(path);
    let path = dir.join("perubahan_tahunan.csv");
    write_csv(&path, &change_rows(&trend.changes))?;
    files.push(path);

    let path = dir.join("distribusi_kabupaten_kota.csv");
    write_csv(&path, &share_rows(&regional_view(records, years).shares))?;
    files.push(path);

    let categories = category_view(records, years);
    let path = dir.join("jenis_kelamin.csv");
    write_csv(&path, &share_rows(&categories.by_sex))?;
    files.push(path);
    let path = dir.join("status_kelahiran.csv");
    write_csv(&path, &share_rows(&categories.by_status))?;
    files.push(path);

    let path = dir.join("persebaran_wilayah.csv");
    write_csv(&path, &heatmap_rows(&heatmap_view(records, years).points))?;
    files.push(path);

    let (forecast, forecast_error) = match forecast_view(records, years, config.horizon) {
        Ok(view) => {
            let path = dir.join("prediksi_kelahiran.csv");
            write_csv(&path, &forecast_rows(&view.points))?;
            files.push(path);
            (view.points, None)
        }
        Err(e) => {
            warn!("Forecast not exported: {e}");
            (Vec::new(), Some(e.to_string()))
        }
    };

    let summary_path = dir.join("summary.json");
    files.push(summary_path.clone());
    let summary = ExportSummary {
        generated_at: Local::now(),
        year_start: years.start,
        year_end: years.end,
        overview: overview_view(records, years),
        yearly: trend.totals,
        forecast,
        forecast_error,
        files,
    };
    write_json(&summary_path, &summary)?;
    info!("Exported {} files to {}", summary.files.len(), dir.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rec(name: &str, status: &str, sex: &str, count: u64, year: i32) -> BirthRecord {
        BirthRecord {
            region_code: "32".into(),
            region_name: name.into(),
            birth_status: status.into(),
            sex: sex.into(),
            birth_count: count,
            year,
        }
    }

    fn sample() -> Vec<BirthRecord> {
        let yearly = [
            905_000u64, 918_000, 871_000, 842_000, 889_000, 931_000, 902_000, 884_000, 821_000,
            902_000, 845_000, 860_000,
        ];
        let mut out = Vec::new();
        for (year, total) in (2012..=2023).zip(yearly) {
            out.push(rec("Kabupaten Bogor", "Lahir Hidup", "Laki-Laki", total / 2, year));
            out.push(rec("Kota Bandung", "Lahir Hidup", "Perempuan", total / 2 - 1_000, year));
            out.push(rec("Kota Antah", "Lahir Mati", "Perempuan", 1_000, year));
        }
        out
    }

    fn config(dir: &TempDir) -> AppConfig {
        AppConfig {
            artifact_dir: dir.path().join("visualisasi"),
            report_dir: dir.path().join("reports"),
            fetch_boundary: false,
            ..AppConfig::default()
        }
    }

    #[test]
    fn pages_parse_from_slugs() {
        for page in Page::ALL {
            assert_eq!(page.slug().parse::<Page>().unwrap(), page);
        }
        assert!("nope".parse::<Page>().is_err());
    }

    #[test]
    fn trend_view_reports_extremes_and_changes() {
        let view = trend_view(&sample(), YearRange::default());
        assert_eq!(view.totals.len(), 12);
        assert_eq!(view.changes.len(), 11);
        assert_eq!(view.highest.unwrap().year, 2017);
        assert_eq!(view.lowest.unwrap().year, 2020);
    }

    #[test]
    fn regional_view_is_descending_with_shares() {
        let view = regional_view(&sample(), YearRange::default());
        assert_eq!(view.highest().unwrap().label, "Kabupaten Bogor");
        assert_eq!(view.lowest().unwrap().label, "Kota Antah");
        let pct: f64 = view.shares.iter().map(|s| s.percent).sum();
        assert!((pct - 100.0).abs() < 0.05);
    }

    #[test]
    fn category_view_is_ascending() {
        let view = category_view(&sample(), YearRange::default());
        assert_eq!(view.by_status[0].label, "Lahir Mati");
        assert_eq!(view.by_sex.len(), 2);
        assert!(view.by_sex[0].total <= view.by_sex[1].total);
    }

    #[test]
    fn heatmap_view_counts_mapped_rows() {
        let view = heatmap_view(&sample(), YearRange::default());
        assert_eq!(view.distinct_regions, 3);
        assert_eq!(view.mapped_rows, 24);
        let unknown = view.points.iter().find(|p| p.region == "Kota Antah").unwrap();
        assert_eq!((unknown.latitude, unknown.longitude), geo::DEFAULT_CENTROID);
    }

    #[test]
    fn forecast_page_fails_cleanly_on_short_series() {
        let dir = TempDir::new().unwrap();
        let records = vec![rec("Kota Bogor", "Lahir Hidup", "Laki-Laki", 10, 2023)];
        let page = Page::Forecast.render(&records, &config(&dir));
        assert!(page.has_errors());
        assert!(page.to_string().contains("Insufficient data"));
    }

    #[test]
    fn every_page_renders_sample_data() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let records = sample();
        for page in Page::ALL {
            let out = page.render(&records, &cfg);
            assert!(!out.has_errors(), "{page:?} failed: {out}");
        }
        assert!(cfg.artifact_dir.join("prediksi_kelahiran_arima_2024-2025.svg").exists());
        assert!(cfg.artifact_dir.join("heatmap_kelahiran_jawabarat_2012-2023.html").exists());
    }

    #[test]
    fn heatmap_without_boundary_still_writes_map() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig {
            fetch_boundary: true,
            boundary_url: "http://127.0.0.1:9/Jabar_By_Kab.geojson".to_string(),
            http_timeout_secs: 1,
            ..config(&dir)
        };
        let out = Page::Heatmap.render(&sample(), &cfg);
        assert!(!out.has_errors(), "{out}");
        let warnings = out.blocks.iter().filter(|b| matches!(b, Block::Warning(_))).count();
        assert_eq!(warnings, 1);

        let path = cfg.artifact_dir.join("heatmap_kelahiran_jawabarat_2012-2023.html");
        assert!(out.blocks.contains(&Block::Artifact(path.clone())));
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("var boundary = null;"));
    }

    #[test]
    fn pages_tolerate_empty_tables() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        for page in [Page::Overview, Page::Trend, Page::Regional, Page::GenderStatus, Page::Conclusions] {
            assert!(!page.render(&[], &cfg).has_errors());
        }
    }

    #[test]
    fn export_writes_tables_and_summary() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let summary = export_reports(&sample(), &cfg).unwrap();
        assert_eq!(summary.forecast.len(), 2);
        assert!(summary.forecast_error.is_none());
        assert_eq!(summary.files.len(), 8);
        for file in &summary.files {
            assert!(file.exists(), "{} missing", file.display());
        }
    }
}

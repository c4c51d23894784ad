// SVG chart artifacts.

use crate::error::{ReportError, Result};
use crate::output::ensure_parent;
use crate::types::{ForecastPoint, Share, YearTotal};
use crate::util::{format_int, format_percent};
use plotters::prelude::*;
use std::fmt::Display;
use std::path::Path;

const ACTUAL: RGBColor = RGBColor(31, 119, 180);
const PREDICTED: RGBColor = RGBColor(255, 140, 0);
const HIGHLIGHT: RGBColor = RGBColor(43, 143, 237);
const MUTED: RGBColor = RGBColor(207, 216, 220);

fn render_err<E: Display>(e: E) -> ReportError {
    ReportError::Render(e.to_string())
}

/// Y-axis ceiling rounded up to the next 100 000.
fn y_ceiling(max: f64) -> f64 {
    ((max / 100_000.0).floor() + 1.0) * 100_000.0
}

/// Line chart of yearly totals, with the forecast drawn as a continuation
/// of the last observed year when `forecast` is non-empty.
pub fn render_series(path: &Path, title: &str, actual: &[YearTotal], forecast: &[ForecastPoint]) -> Result<()> {
    if actual.is_empty() {
        return Err(ReportError::Render("no yearly totals to plot".to_string()));
    }
    ensure_parent(path)?;

    let first_year = actual[0].year;
    let last_year = forecast.last().map(|p| p.year).unwrap_or(actual[actual.len() - 1].year);
    let max_value = actual
        .iter()
        .map(|t| t.total as f64)
        .chain(forecast.iter().map(|p| p.predicted))
        .fold(0.0_f64, f64::max);

    let root = SVGBackend::new(path, (1100, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d(first_year..last_year + 1, 0f64..y_ceiling(max_value))
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Tahun")
        .y_desc("Jumlah Kelahiran")
        .x_label_formatter(&|x| x.to_string())
        .y_label_formatter(&|y| format_int(*y as i64))
        .draw()
        .map_err(render_err)?;

    let points: Vec<(i32, f64)> = actual.iter().map(|t| (t.year, t.total as f64)).collect();
    chart
        .draw_series(LineSeries::new(points.iter().copied(), ACTUAL.stroke_width(2)))
        .map_err(render_err)?
        .label(format!("Data Aktual ({}–{})", first_year, actual[actual.len() - 1].year))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ACTUAL));
    chart
        .draw_series(points.iter().map(|p| Circle::new(*p, 4, ACTUAL.filled())))
        .map_err(render_err)?;

    if !forecast.is_empty() {
        let mut projected: Vec<(i32, f64)> = vec![points[points.len() - 1]];
        projected.extend(forecast.iter().map(|p| (p.year, p.predicted_births() as f64)));
        chart
            .draw_series(LineSeries::new(projected.iter().copied(), PREDICTED.stroke_width(2)))
            .map_err(render_err)?
            .label(format!(
                "Prediksi ({}–{})",
                forecast[0].year,
                forecast[forecast.len() - 1].year
            ))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PREDICTED));
        chart
            .draw_series(forecast.iter().map(|p| {
                let at = (p.year, p.predicted_births() as f64);
                EmptyElement::at(at)
                    + Circle::new((0, 0), 4, PREDICTED.filled())
                    + Text::new(
                        format_int(p.predicted_births()),
                        (-20, -18),
                        ("sans-serif", 12).into_font().color(&PREDICTED),
                    )
            }))
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Horizontal bar chart of group totals, largest first. The first `top_n`
/// bars are highlighted.
pub fn render_bars(path: &Path, title: &str, shares: &[Share], top_n: usize) -> Result<()> {
    if shares.is_empty() {
        return Err(ReportError::Render("no groups to plot".to_string()));
    }
    ensure_parent(path)?;

    let n = shares.len();
    let max_value = shares.iter().map(|s| s.total).max().unwrap_or(0) as f64;
    let height = (60 + 28 * n).max(300) as u32;

    let root = SVGBackend::new(path, (1200, height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(10)
        .build_cartesian_2d(0f64..(max_value * 1.45).max(1.0), 0f64..n as f64)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(0)
        .x_desc("Jumlah Kelahiran")
        .x_label_formatter(&|x| format_int(*x as i64))
        .draw()
        .map_err(render_err)?;

    // Largest bar on top.
    let row = |i: usize| (n - 1 - i) as f64;
    chart
        .draw_series(shares.iter().enumerate().map(|(i, s)| {
            let color = if i < top_n { HIGHLIGHT } else { MUTED };
            Rectangle::new([(0.0, row(i) + 0.15), (s.total as f64, row(i) + 0.85)], color.filled())
        }))
        .map_err(render_err)?;
    chart
        .draw_series(shares.iter().enumerate().map(|(i, s)| {
            Text::new(
                format!("{}  {} ({})", s.label, format_int(s.total), format_percent(s.percent)),
                (s.total as f64 + max_value * 0.01, row(i) + 0.7),
                ("sans-serif", 12).into_font(),
            )
        }))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ceiling_rounds_up_to_next_hundred_thousand() {
        assert_eq!(y_ceiling(931_000.0), 1_000_000.0);
        assert_eq!(y_ceiling(900_000.0), 1_000_000.0);
        assert_eq!(y_ceiling(0.0), 100_000.0);
    }

    #[test]
    fn renders_series_with_forecast() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("charts").join("prediksi.svg");
        let actual = vec![
            YearTotal { year: 2021, total: 902_000 },
            YearTotal { year: 2022, total: 845_000 },
            YearTotal { year: 2023, total: 860_000 },
        ];
        let forecast = vec![ForecastPoint { year: 2024, predicted: 856_052.6, lower: 800_000.0, upper: 900_000.0 }];
        render_series(&path, "Prediksi Jumlah Kelahiran", &actual, &forecast).unwrap();
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("856.052"));
    }

    #[test]
    fn empty_inputs_are_render_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.svg");
        assert!(matches!(render_series(&path, "t", &[], &[]), Err(ReportError::Render(_))));
        assert!(matches!(render_bars(&path, "t", &[], 10), Err(ReportError::Render(_))));
    }
}

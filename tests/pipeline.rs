use birth_report::aggregate::{aggregate_ordered, filtered_total, yearly_totals, GroupOrder};
use birth_report::cleaning::{clean, read_canonical};
use birth_report::config::{AppConfig, CoercionPolicy, YearRange};
use birth_report::forecast::forecast;
use birth_report::types::{Field, Measure};
use birth_report::views::{export_reports, Page};
use std::fmt::Write as _;
use std::fs;
use tempfile::TempDir;

const REGIONS: [(&str, &str); 3] = [
    ("3201", "KABUPATEN BOGOR"),
    ("3273", "KOTA BANDUNG"),
    ("3276", "kota depok"),
];

/// Raw export covering 2012–2023 with one duplicated row.
fn raw_export() -> String {
    let mut csv = String::from(
        "id,kode_kabupaten_kota,nama_kabupaten_kota,status_kelahiran,jenis_kelamin,jumlah_kelahiran,satuan,tahun\n",
    );
    let mut id = 0;
    for year in 2012..=2023 {
        for (i, (code, name)) in REGIONS.iter().enumerate() {
            for (sex, base) in [("LAKI-LAKI", 1_000), ("PEREMPUAN", 950)] {
                id += 1;
                let count = base + (i as i32 + 1) * 37 * ((year - 2010) % 5);
                writeln!(csv, "{id},{code},{name},LAHIR HIDUP,{sex},{count},ORANG,{year}").unwrap();
            }
        }
    }
    csv.push_str("999,3201,KABUPATEN BOGOR,LAHIR HIDUP,LAKI-LAKI,1000,ORANG,2012\n");
    csv.push_str("999,3201,KABUPATEN BOGOR,LAHIR HIDUP,LAKI-LAKI,1000,ORANG,2012\n");
    csv
}

fn setup() -> (TempDir, AppConfig) {
    let dir = TempDir::new().unwrap();
    let raw_path = dir.path().join("rawdata").join("raw.csv");
    fs::create_dir_all(raw_path.parent().unwrap()).unwrap();
    fs::write(&raw_path, raw_export()).unwrap();
    let cfg = AppConfig {
        raw_path,
        canonical_path: dir.path().join("final_dataset").join("dataset.csv"),
        artifact_dir: dir.path().join("visualisasi"),
        report_dir: dir.path().join("reports"),
        fetch_boundary: false,
        ..AppConfig::default()
    };
    (dir, cfg)
}

#[test]
fn clean_then_read_back_canonical_records() {
    let (_dir, cfg) = setup();
    let (cleaned, report) = clean(&cfg.raw_path, &cfg.canonical_path, CoercionPolicy::Fail).unwrap();
    assert_eq!(report.total_rows, 12 * 3 * 2 + 2);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.written_rows, cleaned.len());

    let loaded = read_canonical(&cfg.canonical_path).unwrap();
    assert_eq!(loaded, cleaned);
    assert!(loaded.iter().any(|r| r.region_name == "Kota Depok"));
    assert!(loaded.iter().all(|r| r.sex == "Laki-Laki" || r.sex == "Perempuan"));

    let header = fs::read_to_string(&cfg.canonical_path).unwrap();
    assert!(header.starts_with(
        "kode_kabupaten_kota,nama_kabupaten_kota,status_kelahiran,jenis_kelamin,jumlah_kelahiran,tahun\n"
    ));
}

#[test]
fn yearly_totals_match_grand_total_and_feed_forecast() {
    let (_dir, cfg) = setup();
    let (records, report) = clean(&cfg.raw_path, &cfg.canonical_path, CoercionPolicy::Fail).unwrap();
    let years = YearRange::default();

    let totals = yearly_totals(&records, years);
    assert_eq!(totals.len(), 12);
    let sum: u64 = totals.iter().map(|t| t.total).sum();
    assert_eq!(sum, filtered_total(&records, Measure::BirthCount, years));

    let raw_sum: u64 = raw_export()
        .lines()
        .skip(1)
        .map(|line| line.split(',').nth(5).unwrap().parse::<u64>().unwrap())
        .sum();
    assert_eq!(raw_sum - report.duplicate_birth_count, sum);

    let by_region = aggregate_ordered(&records, &[Field::RegionName], Measure::BirthCount, years, GroupOrder::TotalDescending);
    assert_eq!(by_region.len(), 3);
    assert!(by_region.windows(2).all(|w| w[0].total >= w[1].total));

    let points = forecast(&totals, cfg.horizon).unwrap();
    assert_eq!(points.iter().map(|p| p.year).collect::<Vec<_>>(), vec![2024, 2025]);
    assert!(points.iter().all(|p| p.predicted.is_finite() && p.lower <= p.predicted && p.predicted <= p.upper));
}

#[test]
fn every_page_builds_offline_from_cleaned_data() {
    let (_dir, cfg) = setup();
    let (records, _) = clean(&cfg.raw_path, &cfg.canonical_path, CoercionPolicy::Fail).unwrap();
    for page in Page::ALL {
        let out = page.render(&records, &cfg);
        assert!(!out.has_errors(), "{}", out);
    }
    let summary = export_reports(&records, &cfg).unwrap();
    assert!(cfg.report_dir.join("summary.json").exists());
    assert_eq!(summary.yearly.len(), 12);
}

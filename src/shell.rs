// Interactive dashboard shell.
//
// A sidebar of pages, a cursor over them and a lazily loaded copy of the
// canonical dataset. Any failure while building a page is shown on that
// page; the shell itself keeps running.

use crate::cleaning::read_canonical;
use crate::config::AppConfig;
use crate::error::Result;
use crate::types::BirthRecord;
use crate::views::{Page, PageOutput};
use log::{debug, info};
use std::io::{self, BufRead, Write};

/// Bounded cursor over [`Page::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Navigator {
    index: usize,
}

impl Navigator {
    pub fn current(&self) -> Page {
        Page::ALL[self.index]
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < Page::ALL.len()
    }

    pub fn has_prev(&self) -> bool {
        self.index > 0
    }

    /// Move forward; stays on the last page.
    pub fn next(&mut self) -> Page {
        if self.has_next() {
            self.index += 1;
        }
        self.current()
    }

    /// Move back; stays on the first page.
    pub fn prev(&mut self) -> Page {
        if self.has_prev() {
            self.index -= 1;
        }
        self.current()
    }

    pub fn select(&mut self, page: Page) -> Page {
        if let Some(i) = Page::ALL.iter().position(|p| *p == page) {
            self.index = i;
        }
        self.current()
    }
}

pub struct Dashboard {
    config: AppConfig,
    records: Option<Vec<BirthRecord>>,
    nav: Navigator,
}

impl Dashboard {
    pub fn new(config: AppConfig) -> Self {
        Self { config, records: None, nav: Navigator::default() }
    }

    /// Start with records already in memory, skipping the canonical CSV.
    pub fn with_records(config: AppConfig, records: Vec<BirthRecord>) -> Self {
        Self { config, records: Some(records), nav: Navigator::default() }
    }

    pub fn navigator(&mut self) -> &mut Navigator {
        &mut self.nav
    }

    fn records(&mut self) -> Result<&[BirthRecord]> {
        if self.records.is_none() {
            let loaded = read_canonical(&self.config.canonical_path)?;
            info!(
                "Loaded {} canonical rows from {}",
                loaded.len(),
                self.config.canonical_path.display()
            );
            self.records = Some(loaded);
        }
        Ok(self.records.as_deref().unwrap_or_default())
    }

    /// Build a page. A dataset that cannot be loaded becomes an error page.
    pub fn show(&mut self, page: Page) -> PageOutput {
        debug!("Rendering page {}", page.slug());
        let config = self.config.clone();
        match self.records() {
            Ok(records) => page.render(records, &config),
            Err(e) => PageOutput::failed(page.title(), &e),
        }
    }

    pub fn show_current(&mut self) -> PageOutput {
        let page = self.nav.current();
        self.show(page)
    }

    /// Menu loop over any line source. Returns when input ends or on `q`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            print_menu(out, self.nav.current())?;
            write!(out, "Enter choice: ")?;
            out.flush()?;
            let Some(line) = lines.next() else {
                writeln!(out)?;
                return Ok(());
            };
            let choice = line?.trim().to_lowercase();
            let page = match choice.as_str() {
                "q" | "quit" | "exit" => return Ok(()),
                "n" | "next" => self.nav.next(),
                "p" | "prev" => self.nav.prev(),
                "" => self.nav.current(),
                other => match other.parse::<usize>() {
                    Ok(n) if (1..=Page::ALL.len()).contains(&n) => self.nav.select(Page::ALL[n - 1]),
                    _ => match other.parse::<Page>() {
                        Ok(p) => self.nav.select(p),
                        Err(e) => {
                            writeln!(out, "Invalid choice. {e}")?;
                            continue;
                        }
                    },
                },
            };
            writeln!(out)?;
            write!(out, "{}", self.show(page))?;
            writeln!(out)?;
        }
    }
}

fn print_menu<W: Write>(out: &mut W, current: Page) -> io::Result<()> {
    writeln!(out, "Dashboard Kelahiran Jawa Barat")?;
    for (i, page) in Page::ALL.iter().enumerate() {
        let marker = if *page == current { ">" } else { " " };
        writeln!(out, "{marker} [{}] {}", i + 1, page.title())?;
    }
    writeln!(out, "  [n] Next  [p] Previous  [q] Quit")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::write_canonical;
    use crate::views::Block;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn offline(dir: &TempDir) -> AppConfig {
        AppConfig {
            canonical_path: dir.path().join("final").join("dataset.csv"),
            artifact_dir: dir.path().join("visualisasi"),
            report_dir: dir.path().join("reports"),
            fetch_boundary: false,
            ..AppConfig::default()
        }
    }

    fn records() -> Vec<BirthRecord> {
        [(2021, 120u64), (2022, 100), (2023, 130)]
            .into_iter()
            .map(|(year, count)| BirthRecord {
                region_code: "3273".into(),
                region_name: "Kota Bandung".into(),
                birth_status: "Lahir Hidup".into(),
                sex: "Perempuan".into(),
                birth_count: count,
                year,
            })
            .collect()
    }

    #[test]
    fn navigator_is_bounded() {
        let mut nav = Navigator::default();
        assert_eq!(nav.prev(), Page::Overview);
        for _ in 0..20 {
            nav.next();
        }
        assert_eq!(nav.current(), Page::Conclusions);
        assert!(!nav.has_next());
        assert_eq!(nav.select(Page::Heatmap), Page::Heatmap);
        assert_eq!(nav.prev(), Page::Regional);
    }

    #[test]
    fn missing_dataset_is_an_error_page() {
        let dir = TempDir::new().unwrap();
        let mut dash = Dashboard::new(offline(&dir));
        let page = dash.show(Page::Trend);
        assert!(page.has_errors());
        assert!(matches!(&page.blocks[0], Block::Error(msg) if msg.contains("File not found")));
    }

    #[test]
    fn loads_canonical_dataset_once() {
        let dir = TempDir::new().unwrap();
        let cfg = offline(&dir);
        write_canonical(&cfg.canonical_path, &records()).unwrap();
        let mut dash = Dashboard::new(cfg.clone());
        assert!(!dash.show(Page::Overview).has_errors());
        std::fs::remove_file(&cfg.canonical_path).unwrap();
        assert!(!dash.show(Page::GenderStatus).has_errors());
    }

    #[test]
    fn menu_loop_navigates_and_quits() {
        let dir = TempDir::new().unwrap();
        let mut dash = Dashboard::with_records(offline(&dir), records());
        let mut out = Vec::new();
        dash.run(Cursor::new("2\nn\nbogus\nq\n"), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Tren Jumlah Kelahiran per Tahun"));
        assert!(text.contains("Distribusi Kelahiran per Kabupaten/Kota"));
        assert!(text.contains("Invalid choice"));
        assert_eq!(dash.navigator().current(), Page::Regional);
    }
}

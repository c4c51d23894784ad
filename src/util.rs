// Utility helpers for parsing and display formatting.
//
// Cleaning and the views lean on these so the rest of the code can assume
// clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Normalize a CSV header: trim, lowercase, spaces to underscores.
pub fn normalize_column_name(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "_")
}

/// Treat blank cells as missing.
pub fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Parse an integer cell. Accepts surrounding whitespace and integral
/// floats such as `2015.0`, which spreadsheet exports produce for columns
/// that contained blanks. Returns `None` for anything else.
pub fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Title-case a label the way the source data is standardised: the first
/// letter of every run of letters is uppercased, the rest lowercased.
/// `"KAB. bandung-barat"` becomes `"Kab. Bandung-Barat"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Share of `value` in `total`, in percent, rounded to 2 decimals.
/// A zero total yields 0.
pub fn percent_of(value: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(value as f64 / total as f64 * 100.0)
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Integer with Indonesian thousands separators: `1.234.567`.
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en).replace(',', ".")
}

/// Percentage with two decimals, e.g. `12.34%`.
pub fn format_percent(p: f64) -> String {
    format!("{:.2}%", p)
}

/// Signed percentage with two decimals, e.g. `+9.87%`.
pub fn format_signed_percent(p: f64) -> String {
    format!("{:+.2}%", p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_column_name("  Jumlah Kelahiran "), "jumlah_kelahiran");
        assert_eq!(normalize_column_name("TAHUN"), "tahun");
    }

    #[test]
    fn parses_integers() {
        assert_eq!(parse_integer(" 2015 "), Some(2015));
        assert_eq!(parse_integer("2015.0"), Some(2015));
        assert_eq!(parse_integer("2015.5"), None);
        assert_eq!(parse_integer("dua ribu"), None);
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("-3"), Some(-3));
    }

    #[test]
    fn title_cases_like_source() {
        assert_eq!(title_case("KABUPATEN BOGOR"), "Kabupaten Bogor");
        assert_eq!(title_case("laki-laki"), "Laki-Laki");
        assert_eq!(title_case("lahir hidup"), "Lahir Hidup");
        assert_eq!(title_case("kab. bandung barat"), "Kab. Bandung Barat");
    }

    #[test]
    fn formats_thousands_with_dots() {
        assert_eq!(format_int(902_000u64), "902.000");
        assert_eq!(format_int(1_234_567i64), "1.234.567");
        assert_eq!(format_int(12u64), "12");
    }

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent_of(5, 0), 0.0);
        assert_eq!(percent_of(1, 3), 33.33);
        assert_eq!(format_signed_percent(9.871), "+9.87%");
    }
}

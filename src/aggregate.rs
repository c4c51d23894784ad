use crate::config::YearRange;
use crate::types::{BirthRecord, Direction, Field, GroupTotal, KeyValue, Measure, Share, YearChange, YearTotal};
use crate::util::{percent_of, round2};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Common orderings for aggregation results. Ties fall back to key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    KeyAscending,
    TotalAscending,
    TotalDescending,
}

impl GroupOrder {
    pub fn compare(self, a: &GroupTotal, b: &GroupTotal) -> Ordering {
        match self {
            GroupOrder::KeyAscending => a.key.cmp(&b.key),
            GroupOrder::TotalAscending => a.total.cmp(&b.total).then_with(|| a.key.cmp(&b.key)),
            GroupOrder::TotalDescending => b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)),
        }
    }
}

/// Sum `measure` per combination of `keys` over records whose year lies in
/// `years`, ordered by the caller's comparator.
pub fn aggregate<F>(
    records: &[BirthRecord],
    keys: &[Field],
    measure: Measure,
    years: YearRange,
    mut compare: F,
) -> Vec<GroupTotal>
where
    F: FnMut(&GroupTotal, &GroupTotal) -> Ordering,
{
    let mut map: BTreeMap<Vec<KeyValue>, u64> = BTreeMap::new();
    for r in records.iter().filter(|r| years.contains(r.year)) {
        let key: Vec<KeyValue> = keys.iter().map(|f| f.value_of(r)).collect();
        *map.entry(key).or_insert(0) += measure.value_of(r);
    }
    let mut groups: Vec<GroupTotal> = map
        .into_iter()
        .map(|(key, total)| GroupTotal { key, total })
        .collect();
    groups.sort_by(|a, b| compare(a, b));
    groups
}

/// Shorthand for [`aggregate`] with one of the stock orderings.
pub fn aggregate_ordered(
    records: &[BirthRecord],
    keys: &[Field],
    measure: Measure,
    years: YearRange,
    order: GroupOrder,
) -> Vec<GroupTotal> {
    aggregate(records, keys, measure, years, |a, b| order.compare(a, b))
}

/// Sum of `measure` over the rows the year filter keeps.
pub fn filtered_total(records: &[BirthRecord], measure: Measure, years: YearRange) -> u64 {
    records
        .iter()
        .filter(|r| years.contains(r.year))
        .map(|r| measure.value_of(r))
        .sum()
}

/// Attach each group's percentage of the grand total, rounded to 2 decimals.
pub fn shares(groups: &[GroupTotal]) -> Vec<Share> {
    let grand: u64 = groups.iter().map(|g| g.total).sum();
    groups
        .iter()
        .map(|g| Share {
            label: g.label(),
            total: g.total,
            percent: percent_of(g.total, grand),
        })
        .collect()
}

/// Total births per year, ascending by year.
pub fn yearly_totals(records: &[BirthRecord], years: YearRange) -> Vec<YearTotal> {
    aggregate_ordered(records, &[Field::Year], Measure::BirthCount, years, GroupOrder::KeyAscending)
        .into_iter()
        .filter_map(|g| match g.key.first() {
            Some(KeyValue::Int(y)) => i32::try_from(*y).ok().map(|year| YearTotal { year, total: g.total }),
            _ => None,
        })
        .collect()
}

/// Change between each pair of consecutive yearly totals.
pub fn year_over_year(totals: &[YearTotal]) -> Vec<YearChange> {
    totals
        .windows(2)
        .map(|w| {
            let (prev, curr) = (w[0], w[1]);
            let change = curr.total as i64 - prev.total as i64;
            let percent = if prev.total == 0 {
                None
            } else {
                Some(round2(change as f64 / prev.total as f64 * 100.0))
            };
            YearChange {
                from: prev.year,
                to: curr.year,
                direction: if change > 0 { Direction::Up } else { Direction::Down },
                change,
                percent,
            }
        })
        .collect()
}

/// First maximum and first minimum of `items` by `value`.
pub fn extremes<T, F>(items: &[T], value: F) -> Option<(&T, &T)>
where
    F: Fn(&T) -> u64,
{
    let first = items.first()?;
    let (mut max, mut min) = (first, first);
    for item in &items[1..] {
        if value(item) > value(max) {
            max = item;
        }
        if value(item) < value(min) {
            min = item;
        }
    }
    Some((max, min))
}

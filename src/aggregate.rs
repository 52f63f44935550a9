use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One (week, category) bucket as produced by the store layer, summed and
/// sorted ascending by week before it reaches [`combine_weekly`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyRow {
    pub week: i64,
    pub category: String,
    pub total_load: f64,
}

/// Per-week output record: one field per category plus the week's running
/// total, serialized with the category fields inlined alongside `week` and
/// `total_load`.
#[derive(Debug, Serialize, PartialEq)]
pub struct WeeklySummary {
    pub week: i64,
    pub total_load: f64,
    #[serde(flatten)]
    pub categories: BTreeMap<String, f64>,
}

/// Encodes a calendar date as `iso_year * 100 + iso_week`, the grouping key
/// for the weekly history view. ISO week numbering means early-January dates
/// can land in the previous year's final week.
pub fn week_id(date: NaiveDate) -> i64 {
    let iso = date.iso_week();
    iso.year() as i64 * 100 + iso.week() as i64
}

/// Reshapes flat (week, category, total) rows into one record per week.
///
/// Two passes: the first collects the category set over the whole input so
/// every week's record carries every category (zero when the week has no
/// entry for it); the second builds week records in first-seen order, which
/// equals ascending week order for pre-sorted input. A duplicate
/// (week, category) pair overwrites the category field but still adds to the
/// week's running total.
pub fn combine_weekly(rows: &[WeeklyRow]) -> Vec<WeeklySummary> {
    let categories: BTreeSet<&str> = rows.iter().map(|r| r.category.as_str()).collect();

    let mut summaries: Vec<WeeklySummary> = Vec::new();
    let mut week_index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let idx = *week_index.entry(row.week).or_insert_with(|| {
            summaries.push(WeeklySummary {
                week: row.week,
                total_load: 0.0,
                categories: categories
                    .iter()
                    .map(|c| (c.to_string(), 0.0))
                    .collect(),
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[idx];
        summary
            .categories
            .insert(row.category.clone(), row.total_load);
        summary.total_load += row.total_load;
    }

    summaries
}

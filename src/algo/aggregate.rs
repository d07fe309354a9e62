use std::collections::HashMap;

use serde::Serialize;

use super::dataset::SampleRecord;
use super::normalize::Normalized;

// ── Frequency table ──────────────────────────────────────────────────────────

/// Occurrence counts keyed by the string form of each value.
///
/// Entries keep first-seen order; callers sort or project as they need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
}

impl FrequencyTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.entries.iter().map(|(_, c)| *c).collect()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Entries by descending count; ties keep first-seen order.
    pub fn sorted_by_count(&self) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

pub fn frequency_table<'a, I>(values: I) -> FrequencyTable
where
    I: IntoIterator<Item = &'a Normalized>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<(String, usize)> = Vec::new();
    for value in values {
        let key = value.key();
        match index.get(&key) {
            Some(&i) => entries[i].1 += 1,
            None => {
                index.insert(key.clone(), entries.len());
                entries.push((key, 1));
            }
        }
    }
    FrequencyTable { entries }
}

// ── Numeric series ───────────────────────────────────────────────────────────

/// What to do with non-numeric entries (usually `"Unknown"`) in a histogram series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPolicy {
    /// Hand over only numbers.
    #[default]
    Drop,
    /// Hand over the series as-is, numbers and text intermixed.
    Keep,
}

impl UnknownPolicy {
    pub fn from_keep(keep: bool) -> Self {
        if keep {
            Self::Keep
        } else {
            Self::Drop
        }
    }
}

pub fn numeric_series(values: &[Normalized], policy: UnknownPolicy) -> Vec<Normalized> {
    match policy {
        UnknownPolicy::Keep => values.to_vec(),
        UnknownPolicy::Drop => values
            .iter()
            .filter(|v| matches!(v, Normalized::Number(_)))
            .cloned()
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub non_numeric: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

pub fn summarize(values: &[Normalized]) -> NumericSummary {
    let nums: Vec<f64> = values.iter().filter_map(Normalized::as_f64).collect();
    let count = nums.len();
    let (min, max, mean) = if count == 0 {
        (None, None, None)
    } else {
        let min = nums.iter().copied().fold(f64::INFINITY, f64::min);
        let max = nums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = nums.iter().sum::<f64>() / count as f64;
        (Some(min), Some(max), Some(mean))
    };
    NumericSummary {
        count,
        non_numeric: values.len() - count,
        min,
        max,
        mean,
    }
}

// ── Species ranking ──────────────────────────────────────────────────────────

/// One OTU observation formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSpecies {
    pub otu_id: i64,
    /// `"OID <id>"`
    pub id: String,
    /// Taxonomy path with `;` shown as ` | `.
    pub label: String,
    pub count: u64,
}

pub fn display_id(otu_id: i64) -> String {
    format!("OID {otu_id}")
}

pub fn display_label(label: &str) -> String {
    label.replace(';', " | ")
}

/// First `n` observations, reversed so a bottom-up bar chart puts the
/// highest count on top.
///
/// Assumes `record` is already sorted by descending count; see
/// [`sort_by_count`] for inputs that are not.
pub fn top_species(record: &SampleRecord, n: usize) -> Vec<RankedSpecies> {
    let mut top: Vec<RankedSpecies> = record
        .observations()
        .take(n)
        .map(|o| RankedSpecies {
            otu_id: o.otu_id,
            id: display_id(o.otu_id),
            label: display_label(o.label),
            count: o.count,
        })
        .collect();
    top.reverse();
    top
}

/// Copy of `record` with observations by descending count.
/// Stable: equal counts keep their original relative order.
pub fn sort_by_count(record: &SampleRecord) -> SampleRecord {
    let mut order: Vec<usize> = (0..record.len()).collect();
    order.sort_by(|&a, &b| record.sample_values[b].cmp(&record.sample_values[a]));
    SampleRecord {
        id: record.id.clone(),
        otu_ids: order.iter().map(|&i| record.otu_ids[i]).collect(),
        otu_labels: order.iter().map(|&i| record.otu_labels[i].clone()).collect(),
        sample_values: order.iter().map(|&i| record.sample_values[i]).collect(),
    }
}

/// Columns for a bubble chart over every observation, unranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleSeries {
    pub x: Vec<i64>,
    pub y: Vec<u64>,
    pub size: Vec<u64>,
    pub color: Vec<i64>,
    pub text: Vec<String>,
}

pub fn bubble_series(record: &SampleRecord) -> BubbleSeries {
    BubbleSeries {
        x: record.otu_ids.clone(),
        y: record.sample_values.clone(),
        size: record.sample_values.clone(),
        color: record.otu_ids.clone(),
        text: record.otu_labels.iter().map(|l| display_label(l)).collect(),
    }
}

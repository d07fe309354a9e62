//! Shared operation wrappers for all interfaces (CLI, MCP, plugin).
//!
//! Each `op_*` function is a pure, synchronous wrapper around one or more
//! `algo` modules. Output is `serde_json::Value` shaped for a plotting
//! surface. No dependency on rmcp, clap, or nu-plugin.
//!
//! Ops borrow the loaded [`Dataset`]; nothing derived here is cached.

use serde_json::{json, Value};

use crate::algo::aggregate::{
    bubble_series, frequency_table, numeric_series, sort_by_count, summarize, top_species,
    UnknownPolicy,
};
use crate::algo::dataset::{identity_key, Dataset, SampleRecord};
use crate::algo::feature::Feature;
use crate::algo::normalize::{normalize, Normalized};
use crate::error::{DashboardError, Result};

/// Upper bound of the wash-frequency gauge.
pub const GAUGE_MAX: u64 = 9;

/// Default number of species in the top-N bar chart.
pub const DEFAULT_TOP_N: usize = 10;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Parse a feature name, suggesting the closest match on failure.
pub fn parse_feature(name: &str) -> Result<Feature> {
    Feature::from_str(name).ok_or_else(|| DashboardError::UnknownFeature {
        name: name.to_string(),
        suggestion: Feature::suggest(name).map(|f| f.as_str()),
    })
}

fn to_json_values(values: &[Normalized]) -> Vec<Value> {
    values.iter().map(Normalized::to_json).collect()
}

// ── Selector options ─────────────────────────────────────────────────────────

pub fn op_names(ds: &Dataset) -> Value {
    json!(ds.sample_names())
}

pub fn op_features() -> Value {
    let features: Vec<Value> = Feature::ALL
        .iter()
        .map(|f| {
            json!({
                "id": f.as_str(),
                "label": f.display_name(),
                "numeric": f.is_numeric(),
            })
        })
        .collect();
    Value::Array(features)
}

// ── Normalization & counting ─────────────────────────────────────────────────

pub fn op_normalize(value: Option<&Value>, feature: Feature) -> Value {
    normalize(value, feature).to_json()
}

/// Count values. With a feature, raw values are normalized first; without
/// one they are taken as already normalized.
pub fn op_frequency(values: &[Value], feature: Option<Feature>) -> Value {
    let normalized: Vec<Normalized> = match feature {
        Some(f) => values.iter().map(|v| normalize(Some(v), f)).collect(),
        None => values.iter().map(Normalized::from_json).collect(),
    };
    let table = frequency_table(&normalized);

    let mut map = serde_json::Map::new();
    for (key, count) in table.iter() {
        map.insert(key.to_string(), json!(count));
    }

    json!({
        "keys": table.keys(),
        "counts": table.counts(),
        "total": table.total(),
        "table": map,
    })
}

// ── Render payloads ──────────────────────────────────────────────────────────

/// Metadata distribution across all volunteers: a histogram series for
/// numeric features, category counts for the rest.
pub fn op_distribution(ds: &Dataset, feature: Feature, policy: UnknownPolicy) -> Value {
    log::debug!("distribution for {feature} ({policy:?})");
    let values = ds.normalized_values(feature);
    let name = feature.display_name();

    if feature.is_numeric() {
        let series = numeric_series(&values, policy);
        let summary = summarize(&values);
        json!({
            "kind": "histogram",
            "feature": feature.as_str(),
            "title": format!("{name} Distribution"),
            "x_label": name,
            "y_label": "Volunteers",
            "values": to_json_values(&series),
            "unknown_count": summary.non_numeric,
            "summary": summary,
        })
    } else {
        let table = frequency_table(&values);
        json!({
            "kind": "bar",
            "feature": feature.as_str(),
            "title": format!("Volunteers by {name}"),
            "x_label": name,
            "y_label": "Volunteers",
            "categories": table.keys(),
            "counts": table.counts(),
        })
    }
}

/// Horizontal bar of the `n` most abundant OTUs in one sample.
///
/// With `sort`, observations are ordered by count first (stable); otherwise
/// the record is trusted to be pre-sorted.
pub fn op_top_species(ds: &Dataset, sample: &str, n: usize, sort: bool) -> Result<Value> {
    log::debug!("top {n} species for sample {sample}");
    let record = ds.sample(sample)?;
    Ok(top_species_payload(record, n, sort))
}

/// Same as [`op_top_species`] for a free-standing sample record.
pub fn top_species_payload(record: &SampleRecord, n: usize, sort: bool) -> Value {
    let sorted;
    let record = if sort {
        sorted = sort_by_count(record);
        &sorted
    } else {
        record
    };
    let top = top_species(record, n);
    let counts: Vec<u64> = top.iter().map(|s| s.count).collect();
    let ids: Vec<&str> = top.iter().map(|s| s.id.as_str()).collect();
    let labels: Vec<&str> = top.iter().map(|s| s.label.as_str()).collect();

    json!({
        "sample": record.name(),
        "title": format!("Top {} OTUs", top.len()),
        "orientation": "h",
        "x": counts,
        "y": ids,
        "text": labels,
    })
}

/// Every OTU in one sample, sized and coloured for a bubble chart.
pub fn op_bubble(ds: &Dataset, sample: &str) -> Result<Value> {
    log::debug!("bubble for sample {sample}");
    let record = ds.sample(sample)?;
    let series = bubble_series(record);
    Ok(json!({
        "sample": record.name(),
        "title": "OTU Abundance",
        "x_label": "OTU ID",
        "y_label": "Sample Value",
        "x": series.x,
        "y": series.y,
        "size": series.size,
        "color": series.color,
        "text": series.text,
    }))
}

/// Wash-frequency gauge. `value` is `null` when the volunteer's frequency is unknown.
pub fn op_gauge(ds: &Dataset, sample: &str) -> Result<Value> {
    log::debug!("gauge for sample {sample}");
    let meta = ds.metadata(sample)?;
    let wfreq = meta.normalized(Feature::Wfreq);
    Ok(json!({
        "sample": identity_key(&meta.id),
        "title": "Belly Button Washing Frequency",
        "subtitle": "Scrubs per Week",
        "value": wfreq.as_f64(),
        "label": wfreq.key(),
        "min": 0,
        "max": GAUGE_MAX,
    }))
}

/// The six normalized demographic fields of one volunteer.
pub fn op_info_card(ds: &Dataset, sample: &str) -> Result<Value> {
    let meta = ds.metadata(sample)?;
    let mut card = serde_json::Map::new();
    card.insert("id".into(), meta.id.clone());
    for feature in Feature::ALL {
        card.insert(
            feature.as_str().into(),
            meta.normalized(feature).to_json(),
        );
    }
    Ok(Value::Object(card))
}

/// Everything one selector change renders, computed in a single pass.
pub fn op_dashboard(
    ds: &Dataset,
    sample: &str,
    feature: Feature,
    n: usize,
    policy: UnknownPolicy,
    sort: bool,
) -> Result<Value> {
    log::debug!("dashboard for sample {sample}, feature {feature}");
    let info = op_info_card(ds, sample)?;
    let top = op_top_species(ds, sample, n, sort)?;
    let bubble = op_bubble(ds, sample)?;
    let gauge = op_gauge(ds, sample)?;
    let distribution = op_distribution(ds, feature, policy);

    Ok(json!({
        "sample": sample.trim(),
        "feature": feature.as_str(),
        "info": info,
        "distribution": distribution,
        "top_species": top,
        "bubble": bubble,
        "gauge": gauge,
    }))
}

//! In-memory dataset: volunteer demographics plus per-sample OTU counts.
//!
//! Loaded once, validated, then only ever borrowed. Lookups by sample name
//! return `NotFound` instead of panicking on a miss.

use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::feature::Feature;
use super::normalize::{normalize, number_key, Normalized};
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Dataset {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub metadata: Vec<DemographicRecord>,
    #[serde(default)]
    pub samples: Vec<SampleRecord>,
}

/// One volunteer's demographics. Fields stay raw JSON until normalized.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DemographicRecord {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub ethnicity: Option<Value>,
    #[serde(default)]
    pub gender: Option<Value>,
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub bbtype: Option<Value>,
    #[serde(default)]
    pub wfreq: Option<Value>,
}

impl DemographicRecord {
    pub fn field(&self, feature: Feature) -> Option<&Value> {
        match feature {
            Feature::Ethnicity => self.ethnicity.as_ref(),
            Feature::Gender => self.gender.as_ref(),
            Feature::Age => self.age.as_ref(),
            Feature::Location => self.location.as_ref(),
            Feature::Bbtype => self.bbtype.as_ref(),
            Feature::Wfreq => self.wfreq.as_ref(),
        }
    }

    pub fn normalized(&self, feature: Feature) -> Normalized {
        normalize(self.field(feature), feature)
    }
}

/// OTU measurements for one sample as three parallel sequences.
///
/// Index `i` of each sequence describes the same observation. The source
/// orders observations by descending count; nothing here re-checks that.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SampleRecord {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub otu_ids: Vec<i64>,
    #[serde(default)]
    pub otu_labels: Vec<String>,
    #[serde(default)]
    pub sample_values: Vec<u64>,
}

/// Borrowed view of a single OTU observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<'a> {
    pub otu_id: i64,
    pub label: &'a str,
    pub count: u64,
}

impl SampleRecord {
    pub fn name(&self) -> String {
        identity_key(&self.id)
    }

    pub fn len(&self) -> usize {
        self.sample_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_values.is_empty()
    }

    pub fn observations(&self) -> impl Iterator<Item = Observation<'_>> + '_ {
        self.otu_ids
            .iter()
            .zip(&self.otu_labels)
            .zip(&self.sample_values)
            .map(|((&otu_id, label), &count)| Observation {
                otu_id,
                label: label.as_str(),
                count,
            })
    }

    pub fn validate(&self) -> Result<()> {
        let (ids, labels, values) = (
            self.otu_ids.len(),
            self.otu_labels.len(),
            self.sample_values.len(),
        );
        if ids != values || labels != values {
            return Err(DashboardError::Malformed {
                sample: self.name(),
                reason: format!(
                    "parallel sequences differ in length (otu_ids={ids}, otu_labels={labels}, sample_values={values})"
                ),
            });
        }
        Ok(())
    }
}

/// String form of a record id, so `940`, `940.0` and `"940"` refer to the
/// same sample.
pub fn identity_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_key(n),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl Dataset {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(s)?;
        dataset.validate()?;
        dataset.log_loaded();
        Ok(dataset)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let dataset: Dataset = serde_json::from_value(value)?;
        dataset.validate()?;
        dataset.log_loaded();
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let dataset: Dataset = serde_json::from_reader(reader)?;
        dataset.validate()?;
        dataset.log_loaded();
        Ok(dataset)
    }

    /// Load from a filesystem path or a `file://` URL.
    pub fn load(source: &str) -> Result<Self> {
        let path = resolve_source(source)?;
        let file = std::fs::File::open(&path).map_err(|e| DashboardError::LoadFailed {
            source_name: source.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_reader(std::io::BufReader::new(file)).map_err(|e| match e {
            DashboardError::Json(inner) => DashboardError::LoadFailed {
                source_name: source.to_string(),
                reason: inner.to_string(),
            },
            other => other,
        })
    }

    /// Parallel sequences must line up, and no two records of the same
    /// collection may share an identity key.
    pub fn validate(&self) -> Result<()> {
        self.samples.iter().try_for_each(SampleRecord::validate)?;
        unique_ids("metadata", self.metadata.iter().map(|m| &m.id))?;
        unique_ids("sample", self.samples.iter().map(|s| &s.id))
    }

    fn log_loaded(&self) {
        log::info!(
            "dataset loaded: {} names, {} metadata records, {} samples",
            self.names.len(),
            self.metadata.len(),
            self.samples.len()
        );
    }

    /// Sample selector options. Falls back to sample ids when `names` is empty.
    pub fn sample_names(&self) -> Vec<String> {
        if self.names.is_empty() {
            self.samples.iter().map(SampleRecord::name).collect()
        } else {
            self.names.clone()
        }
    }

    pub fn sample(&self, name: &str) -> Result<&SampleRecord> {
        let name = name.trim();
        self.samples
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| not_found("sample", name))
    }

    pub fn metadata(&self, name: &str) -> Result<&DemographicRecord> {
        let name = name.trim();
        self.metadata
            .iter()
            .find(|m| identity_key(&m.id) == name)
            .ok_or_else(|| not_found("metadata", name))
    }

    /// Raw value of `feature` for every volunteer, in collection order.
    pub fn feature_values(&self, feature: Feature) -> Vec<Option<&Value>> {
        self.metadata.iter().map(|m| m.field(feature)).collect()
    }

    /// Normalized value of `feature` for every volunteer, in collection order.
    pub fn normalized_values(&self, feature: Feature) -> Vec<Normalized> {
        self.metadata
            .par_iter()
            .map(|m| m.normalized(feature))
            .collect()
    }
}

fn not_found(kind: &'static str, name: &str) -> DashboardError {
    log::warn!("{kind} lookup miss: '{name}'");
    DashboardError::NotFound {
        kind,
        name: name.to_string(),
    }
}

fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a Value>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        let key = identity_key(id);
        if !seen.insert(key.clone()) {
            return Err(DashboardError::Malformed {
                sample: key,
                reason: format!("duplicate {kind} id"),
            });
        }
    }
    Ok(())
}

fn resolve_source(source: &str) -> Result<PathBuf> {
    let trimmed = source.trim();
    match Url::parse(trimmed) {
        // single-letter schemes are Windows drive letters
        Ok(url) if url.scheme().len() > 1 => {
            if url.scheme() != "file" {
                return Err(DashboardError::LoadFailed {
                    source_name: trimmed.to_string(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
            url.to_file_path().map_err(|_| DashboardError::LoadFailed {
                source_name: trimmed.to_string(),
                reason: "file URL does not name a local path".into(),
            })
        }
        _ => Ok(PathBuf::from(trimmed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset_json() -> Value {
        json!({
            "names": ["940", "941"],
            "metadata": [
                {"id": 940, "ethnicity": "Caucasian", "gender": "F", "age": 24,
                 "location": "Beaufort/NC", "bbtype": "I", "wfreq": 2},
                {"id": 941, "ethnicity": null, "gender": "m", "age": null,
                 "location": "Chicago, IL", "bbtype": "o"}
            ],
            "samples": [
                {"id": "940", "otu_ids": [1167, 2859], "otu_labels": ["Bacteria;A", "Bacteria;B"],
                 "sample_values": [163, 126]},
                {"id": "941", "otu_ids": [482], "otu_labels": ["Bacteria"], "sample_values": [113]}
            ]
        })
    }

    #[test]
    fn loads_and_looks_up_by_string_or_number_id() {
        let ds = Dataset::from_value(dataset_json()).unwrap();
        assert_eq!(ds.sample("940").unwrap().len(), 2);
        assert_eq!(ds.metadata("941").unwrap().gender, Some(json!("m")));
    }

    #[test]
    fn lookup_miss_is_not_found() {
        let ds = Dataset::from_value(dataset_json()).unwrap();
        assert!(matches!(
            ds.sample("999"),
            Err(DashboardError::NotFound { kind: "sample", .. })
        ));
        assert!(matches!(
            ds.metadata("999"),
            Err(DashboardError::NotFound { kind: "metadata", .. })
        ));
    }

    #[test]
    fn missing_field_deserializes_as_none() {
        let ds = Dataset::from_value(dataset_json()).unwrap();
        let m = ds.metadata("941").unwrap();
        assert!(m.wfreq.is_none());
        assert!(m.normalized(Feature::Wfreq).is_unknown());
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let bad = json!({
            "samples": [{"id": "1", "otu_ids": [1, 2], "otu_labels": ["a"], "sample_values": [5, 4]}]
        });
        let err = Dataset::from_value(bad).unwrap_err();
        assert!(matches!(err, DashboardError::Malformed { ref sample, .. } if sample == "1"));
    }

    #[test]
    fn observations_zip_parallel_sequences() {
        let ds = Dataset::from_value(dataset_json()).unwrap();
        let obs: Vec<Observation> = ds.sample("940").unwrap().observations().collect();
        assert_eq!(obs[1].otu_id, 2859);
        assert_eq!(obs[1].label, "Bacteria;B");
        assert_eq!(obs[1].count, 126);
    }

    #[test]
    fn normalized_values_keep_collection_order() {
        let ds = Dataset::from_value(dataset_json()).unwrap();
        let genders: Vec<String> = ds
            .normalized_values(Feature::Gender)
            .iter()
            .map(|n| n.key())
            .collect();
        assert_eq!(genders, vec!["F", "M"]);
    }

    #[test]
    fn sample_names_fall_back_to_ids() {
        let mut ds = Dataset::from_value(dataset_json()).unwrap();
        ds.names.clear();
        assert_eq!(ds.sample_names(), vec!["940", "941"]);
    }

    #[test]
    fn resolve_plain_path_and_file_url() {
        assert_eq!(
            resolve_source("samples.json").unwrap(),
            PathBuf::from("samples.json")
        );
        #[cfg(unix)]
        assert_eq!(
            resolve_source("file:///tmp/samples.json").unwrap(),
            PathBuf::from("/tmp/samples.json")
        );
    }

    #[test]
    fn network_sources_rejected() {
        let err = resolve_source("https://example.com/samples.json").unwrap_err();
        assert!(matches!(err, DashboardError::LoadFailed { .. }));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let dup_meta = json!({
            "metadata": [{"id": 940, "gender": "f"}, {"id": "940", "gender": "m"}]
        });
        let err = Dataset::from_value(dup_meta).unwrap_err();
        assert!(matches!(err, DashboardError::Malformed { ref sample, ref reason }
            if sample == "940" && reason.contains("metadata")));

        let dup_samples = json!({
            "samples": [
                {"id": "940", "otu_ids": [1], "otu_labels": ["a"], "sample_values": [3]},
                {"id": 940, "otu_ids": [2], "otu_labels": ["b"], "sample_values": [9]}
            ]
        });
        let err = Dataset::from_value(dup_samples).unwrap_err();
        assert!(matches!(err, DashboardError::Malformed { ref reason, .. }
            if reason.contains("sample")));
    }

    #[test]
    fn float_ids_match_integer_names() {
        assert_eq!(identity_key(&json!(940.0)), "940");
        assert_eq!(identity_key(&json!(940)), "940");
        assert_eq!(identity_key(&json!("940")), "940");

        let ds = Dataset::from_value(json!({
            "metadata": [{"id": 940.0, "gender": "f"}],
            "samples": [{"id": 940.0, "otu_ids": [1], "otu_labels": ["a"], "sample_values": [3]}]
        }))
        .unwrap();
        assert_eq!(ds.metadata("940").unwrap().gender, Some(json!("f")));
        assert_eq!(ds.sample("940").unwrap().len(), 1);
    }

    #[test]
    fn load_from_file_url() {
        let mut path = std::env::temp_dir();
        path.push(format!("bellybutton-load-{}.json", std::process::id()));
        std::fs::write(&path, dataset_json().to_string()).unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let ds = Dataset::load(url.as_str()).unwrap();
        assert_eq!(ds.sample_names(), vec!["940", "941"]);
        assert_eq!(ds.sample("941").unwrap().len(), 1);

        let by_path = Dataset::load(path.to_str().unwrap()).unwrap();
        assert_eq!(by_path.metadata.len(), 2);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_missing_file_is_load_failed() {
        let err = Dataset::load("/definitely/not/here/samples.json").unwrap_err();
        assert!(matches!(err, DashboardError::LoadFailed { .. }));
    }
}

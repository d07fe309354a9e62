use nu_plugin_biodiversity::algo::aggregate::UnknownPolicy;
use nu_plugin_biodiversity::algo::dataset::Dataset;
use nu_plugin_biodiversity::algo::feature::Feature;
use nu_plugin_biodiversity::error::DashboardError;
use nu_plugin_biodiversity::ops;
use serde_json::{json, Value};

fn labels(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("Bacteria;Firmicutes;Clostridia;Taxon{i}"))
        .collect()
}

fn sample_dataset() -> Dataset {
    let long: Vec<u64> = vec![50, 40, 30, 20, 10, 5, 4, 3, 2, 1, 0];
    let fifteen: Vec<u64> = (1..=15).rev().collect();
    let long_ids: Vec<i64> = (1000..1011).collect();
    let fifteen_ids: Vec<i64> = (2000..2015).collect();
    Dataset::from_value(json!({
        "names": ["940", "941", "943"],
        "metadata": [
            {"id": 940, "ethnicity": "Caucasian", "gender": "F", "age": 24,
             "location": "Beaufort/NC", "bbtype": "I", "wfreq": 2},
            {"id": 941, "ethnicity": "Caucasian/Midleastern", "gender": "f", "age": null,
             "location": "Chicago, IL", "bbtype": "i", "wfreq": 0},
            {"id": 943, "ethnicity": "Asian (Vietnamese)", "gender": "m", "age": 34,
             "location": "Tokyo, Japan", "bbtype": "", "wfreq": null}
        ],
        "samples": [
            {"id": "940", "otu_ids": long_ids,
             "otu_labels": labels(11), "sample_values": long},
            {"id": "941", "otu_ids": [482, 2264, 41], "otu_labels": labels(3),
             "sample_values": [113, 71, 7]},
            {"id": "943", "otu_ids": fifteen_ids,
             "otu_labels": labels(15), "sample_values": fifteen}
        ]
    }))
    .unwrap()
}

#[test]
fn ops_names_lists_selector_options() {
    let ds = sample_dataset();
    assert_eq!(ops::op_names(&ds), json!(["940", "941", "943"]));
}

#[test]
fn ops_normalize_documented_examples() {
    assert_eq!(ops::op_normalize(Some(&json!("female")), Feature::Gender), json!("Female"));
    assert_eq!(
        ops::op_normalize(Some(&json!("Caucasian(some detail)")), Feature::Ethnicity),
        json!("Caucasian")
    );
    assert_eq!(
        ops::op_normalize(Some(&json!("Asian/Caucasian")), Feature::Ethnicity),
        json!("Mixed")
    );
    assert_eq!(ops::op_normalize(Some(&json!("Austin, TX")), Feature::Location), json!("TX"));
    assert_eq!(
        ops::op_normalize(Some(&json!("Tokyo, Japan")), Feature::Location),
        json!("Tokyo, Japan")
    );
    assert_eq!(ops::op_normalize(Some(&json!(42)), Feature::Age), json!(42));
    for f in Feature::ALL {
        assert_eq!(ops::op_normalize(None, f), json!("Unknown"));
    }
}

#[test]
fn ops_distribution_categorical_counts_normalized_values() {
    let ds = sample_dataset();
    let result = ops::op_distribution(&ds, Feature::Gender, UnknownPolicy::Drop);
    assert_eq!(result["kind"], "bar");
    assert_eq!(result["categories"], json!(["F", "M"]));
    assert_eq!(result["counts"], json!([2, 1]));
    assert_eq!(result["x_label"], "Gender");
}

#[test]
fn ops_distribution_ethnicity_mixed_and_truncated() {
    let ds = sample_dataset();
    let result = ops::op_distribution(&ds, Feature::Ethnicity, UnknownPolicy::Drop);
    assert_eq!(result["categories"], json!(["Caucasian", "Mixed", "Asian "]));
}

#[test]
fn ops_distribution_bbtype_empty_is_unknown() {
    let ds = sample_dataset();
    let result = ops::op_distribution(&ds, Feature::Bbtype, UnknownPolicy::Drop);
    assert_eq!(result["categories"], json!(["I", "Unknown"]));
    assert_eq!(result["counts"], json!([2, 1]));
}

#[test]
fn ops_distribution_numeric_drops_unknown_by_default() {
    let ds = sample_dataset();
    let result = ops::op_distribution(&ds, Feature::Age, UnknownPolicy::Drop);
    assert_eq!(result["kind"], "histogram");
    assert_eq!(result["values"], json!([24, 34]));
    assert_eq!(result["unknown_count"], 1);
    assert_eq!(result["summary"]["mean"], 29.0);
}

#[test]
fn ops_distribution_numeric_keep_mixes_unknown() {
    let ds = sample_dataset();
    let result = ops::op_distribution(&ds, Feature::Wfreq, UnknownPolicy::Keep);
    // zero wash frequency collapses to Unknown too
    assert_eq!(result["values"], json!([2, "Unknown", "Unknown"]));
}

#[test]
fn ops_top_species_drops_tail_and_reverses() {
    let ds = sample_dataset();
    let result = ops::op_top_species(&ds, "940", 10, false).unwrap();
    assert_eq!(result["x"], json!([1, 2, 3, 4, 5, 10, 20, 30, 40, 50]));
    assert_eq!(result["y"][9], "OID 1000");
    assert_eq!(result["y"][0], "OID 1009");
    assert_eq!(
        result["text"][9],
        "Bacteria | Firmicutes | Clostridia | Taxon0"
    );
    assert_eq!(result["orientation"], "h");
}

#[test]
fn ops_top_species_fifteen_entries() {
    let ds = sample_dataset();
    let result = ops::op_top_species(&ds, "943", 10, false).unwrap();
    let x = result["x"].as_array().unwrap();
    assert_eq!(x.len(), 10);
    assert_eq!(x[0], 6);
    assert_eq!(x[9], 15);
}

#[test]
fn ops_top_species_short_sample_no_padding() {
    let ds = sample_dataset();
    let result = ops::op_top_species(&ds, "941", 10, false).unwrap();
    assert_eq!(result["x"], json!([7, 71, 113]));
    assert_eq!(result["y"], json!(["OID 41", "OID 2264", "OID 482"]));
    assert_eq!(result["title"], "Top 3 OTUs");
}

#[test]
fn ops_top_species_title_counts_returned_bars() {
    let ds = sample_dataset();
    let full = ops::op_top_species(&ds, "943", 10, false).unwrap();
    assert_eq!(full["title"], "Top 10 OTUs");
    let none = ops::op_top_species(&ds, "943", 0, false).unwrap();
    assert_eq!(none["x"], json!([]));
    assert_eq!(none["title"], "Top 0 OTUs");
}

#[test]
fn ops_top_species_unknown_sample() {
    let ds = sample_dataset();
    let err = ops::op_top_species(&ds, "999", 10, false).unwrap_err();
    assert!(matches!(err, DashboardError::NotFound { kind: "sample", .. }));
}

#[test]
fn ops_bubble_keeps_every_observation() {
    let ds = sample_dataset();
    let result = ops::op_bubble(&ds, "940").unwrap();
    assert_eq!(result["x"].as_array().unwrap().len(), 11);
    assert_eq!(result["size"], result["y"]);
    assert_eq!(result["color"], result["x"]);
}

#[test]
fn ops_gauge_value_and_unknown() {
    let ds = sample_dataset();
    let known = ops::op_gauge(&ds, "940").unwrap();
    assert_eq!(known["value"], 2.0);
    assert_eq!(known["max"], 9);

    let unknown = ops::op_gauge(&ds, "941").unwrap();
    assert_eq!(unknown["value"], Value::Null);
    assert_eq!(unknown["label"], "Unknown");
}

#[test]
fn ops_info_card_normalizes_all_six_fields() {
    let ds = sample_dataset();
    let card = ops::op_info_card(&ds, "943").unwrap();
    assert_eq!(card["id"], 943);
    assert_eq!(card["ethnicity"], "Asian ");
    assert_eq!(card["gender"], "M");
    assert_eq!(card["age"], 34);
    assert_eq!(card["location"], "Tokyo, Japan");
    assert_eq!(card["bbtype"], "Unknown");
    assert_eq!(card["wfreq"], "Unknown");
}

#[test]
fn ops_dashboard_bundles_all_payloads() {
    let ds = sample_dataset();
    let result =
        ops::op_dashboard(&ds, "941", Feature::Location, 10, UnknownPolicy::Drop, false).unwrap();
    for key in ["info", "distribution", "top_species", "bubble", "gauge"] {
        assert!(result.get(key).is_some(), "missing {key}");
    }
    assert_eq!(result["info"]["location"], "IL");
    assert_eq!(
        result["distribution"]["categories"],
        json!(["NC", "IL", "Tokyo, Japan"])
    );
}

#[test]
fn ops_dashboard_lookup_miss_is_error() {
    let ds = sample_dataset();
    let result = ops::op_dashboard(&ds, "nope", Feature::Age, 10, UnknownPolicy::Drop, false);
    assert!(result.is_err());
}

#[test]
fn ops_top_species_sort_stage_reorders() {
    let ds = Dataset::from_value(json!({
        "samples": [{"id": "1", "otu_ids": [1, 2, 3], "otu_labels": ["a", "b", "c"],
                     "sample_values": [5, 9, 5]}]
    }))
    .unwrap();
    let unsorted = ops::op_top_species(&ds, "1", 2, false).unwrap();
    assert_eq!(unsorted["x"], json!([9, 5]));
    let sorted = ops::op_top_species(&ds, "1", 2, true).unwrap();
    assert_eq!(sorted["x"], json!([5, 9]));
    assert_eq!(sorted["y"], json!(["OID 1", "OID 2"]));
}

#[test]
fn ops_parse_feature_rejects_unknown() {
    assert!(ops::parse_feature("Age").is_ok());
    assert!(matches!(
        ops::parse_feature("height"),
        Err(DashboardError::UnknownFeature { .. })
    ));
}

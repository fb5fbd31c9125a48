use std::path::Path;

use super::*;

#[test]
fn builtin_lookup_exact_phrase() {
    let synonyms = ServiceSynonyms::builtin();
    assert_eq!(synonyms.lookup("Delivery"), Some(ServiceTag::Delivery));
    assert_eq!(synonyms.lookup("in-store"), Some(ServiceTag::InStore));
    assert_eq!(synonyms.lookup("InStore"), Some(ServiceTag::InStore));
}

#[test]
fn builtin_lookup_curb_side_pickup_is_curbside() {
    let synonyms = ServiceSynonyms::builtin();
    assert_eq!(
        synonyms.lookup("curb side   pickup"),
        Some(ServiceTag::Curbside)
    );
}

#[test]
fn lookup_prefers_longest_contained_phrase() {
    let synonyms = ServiceSynonyms::builtin();
    assert_eq!(
        synonyms.lookup("free curbside pickup"),
        Some(ServiceTag::Curbside)
    );
    assert_eq!(
        synonyms.lookup("same-day delivery available"),
        Some(ServiceTag::Delivery)
    );
}

#[test]
fn lookup_unknown_phrase_is_none() {
    let synonyms = ServiceSynonyms::builtin();
    assert_eq!(synonyms.lookup("pharmacy"), None);
    assert_eq!(synonyms.lookup("   "), None);
}

#[test]
fn lookup_does_not_match_partial_words() {
    let synonyms = ServiceSynonyms::builtin();
    assert_eq!(synonyms.lookup("deliveryman"), None);
}

#[test]
fn find_all_splits_conjunctions_between_phrases() {
    let synonyms = ServiceSynonyms::builtin();
    assert_eq!(
        synonyms.find_all("Pickup and Curbside"),
        vec![ServiceTag::Pickup, ServiceTag::Curbside]
    );
    assert_eq!(
        synonyms.find_all("offers same-day delivery or drive-up (curbside pickup)."),
        vec![ServiceTag::Delivery, ServiceTag::Curbside]
    );
}

#[test]
fn find_all_keeps_multi_word_phrases_whole() {
    let synonyms = ServiceSynonyms::builtin();
    assert_eq!(synonyms.find_all("Click and Collect"), vec![ServiceTag::Pickup]);
    assert_eq!(synonyms.find_all("free curbside pickup"), vec![ServiceTag::Curbside]);
    assert!(synonyms.find_all("pharmacy and bakery").is_empty());
    assert!(synonyms.find_all("").is_empty());
}

#[test]
fn overrides_extend_builtin_table() {
    let mut extra = BTreeMap::new();
    extra.insert("Instacart".to_string(), ServiceTag::Delivery);
    let synonyms = ServiceSynonyms::builtin().with_overrides(&extra);
    assert_eq!(synonyms.lookup("instacart"), Some(ServiceTag::Delivery));
    assert_eq!(synonyms.lookup("curbside"), Some(ServiceTag::Curbside));
}

#[test]
fn tuning_file_defaults_when_fields_absent() {
    let file: TuningFile = serde_yaml::from_str("brand_bonus: 0.2\n").expect("parse");
    let tuning = Tuning::from_file(&file).expect("valid");
    assert!((tuning.match_threshold - DEFAULT_MATCH_THRESHOLD).abs() < f64::EPSILON);
    assert!((tuning.brand_bonus - 0.2).abs() < f64::EPSILON);
}

#[test]
fn tuning_file_parses_service_synonyms() {
    let yaml = r"
match_threshold: 0.4
service_synonyms:
  shipt: delivery
  drive thru: curbside
";
    let file: TuningFile = serde_yaml::from_str(yaml).expect("parse");
    let tuning = Tuning::from_file(&file).expect("valid");
    assert!((tuning.match_threshold - 0.4).abs() < f64::EPSILON);
    assert_eq!(
        tuning.service_synonyms.lookup("Drive Thru"),
        Some(ServiceTag::Curbside)
    );
}

#[test]
fn tuning_rejects_out_of_range_threshold() {
    let file: TuningFile = serde_yaml::from_str("match_threshold: 1.5\n").expect("parse");
    let err = Tuning::from_file(&file).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTuning(_)));
}

#[test]
fn tuning_rejects_unknown_service_tag() {
    let result = serde_yaml::from_str::<TuningFile>("service_synonyms:\n  foo: teleport\n");
    assert!(result.is_err());
}

#[test]
fn load_tuning_missing_file_is_io_error() {
    let err = load_tuning(Path::new("/nonexistent/tuning.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::TuningFileIo { .. }));
}

#[test]
fn load_tuning_reads_file_from_disk() {
    let path = std::env::temp_dir().join(format!("grocer-tuning-{}.yaml", std::process::id()));
    std::fs::write(&path, "match_threshold: 0.25\n").expect("write temp file");
    let tuning = load_tuning(&path).expect("load");
    std::fs::remove_file(&path).ok();
    assert!((tuning.match_threshold - 0.25).abs() < f64::EPSILON);
}

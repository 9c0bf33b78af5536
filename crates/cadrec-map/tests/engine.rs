use chrono::Utc;

use cadrec_config::default_config;
use cadrec_map::SchemaMapper;
use cadrec_model::{Provenance, RunContext, SourceRecord, SourceSystem};

fn source_record(columns: Vec<(&str, &str)>) -> SourceRecord {
    SourceRecord {
        columns: columns
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        provenance: Provenance {
            source_system: SourceSystem::Cad,
            source_file: "cad_export.csv".to_string(),
            load_timestamp: Utc::now(),
        },
    }
}

#[test]
fn maps_aliases_and_passes_unknown_columns_through() {
    let config = default_config().expect("default config");
    let mapper = SchemaMapper::new(&config.registry);
    let mut context = RunContext::new();

    let record = source_record(vec![
        ("Case #", "24-123456"),
        ("Nature", "theft report"),
        ("MysteryColumn", "kept as-is"),
    ]);
    let canonical = mapper.map(&record, &mut context);

    assert_eq!(canonical.case_key, "24-123456");
    assert!(canonical.valid_case_key);
    // Uppercase transformation from the registry applied.
    assert_eq!(canonical.get("Incident"), Some("THEFT REPORT"));
    // Unknown column survives under its original name.
    assert_eq!(canonical.get("MysteryColumn"), Some("kept as-is"));
    assert_eq!(context.unmapped_fields["MysteryColumn"], 1);
    assert_eq!(context.mapped_fields["CaseNumber"], 1);
}

#[test]
fn later_column_wins_on_alias_collision() {
    let config = default_config().expect("default config");
    let mapper = SchemaMapper::new(&config.registry);
    let mut context = RunContext::new();

    let record = source_record(vec![
        ("Case #", "24-111111"),
        ("IncidentNumber", "24-222222"),
    ]);
    let canonical = mapper.map(&record, &mut context);

    assert_eq!(canonical.case_key, "24-222222");
    assert!(
        context
            .warnings
            .iter()
            .any(|warning| warning.contains("CaseNumber")),
        "collision must be surfaced as a warning"
    );
}

#[test]
fn empty_case_key_is_tagged_invalid_not_dropped() {
    let config = default_config().expect("default config");
    let mapper = SchemaMapper::new(&config.registry);
    let mut context = RunContext::new();

    let record = source_record(vec![("Nature", "ALARM"), ("Case #", "  ")]);
    let canonical = mapper.map(&record, &mut context);

    assert!(!canonical.valid_case_key);
    assert!(canonical.case_key.is_empty());
    assert_eq!(context.match_key_missing, 1);
    assert_eq!(canonical.get("Incident"), Some("ALARM"));
}

#[test]
fn validation_failures_are_counted_not_fatal() {
    let config = default_config().expect("default config");
    let mapper = SchemaMapper::new(&config.registry);
    let mut context = RunContext::new();

    let record = source_record(vec![
        ("Case #", "24-123456"),
        ("Received", "not a timestamp"),
    ]);
    let canonical = mapper.map(&record, &mut context);

    assert_eq!(canonical.get("CallDateTime"), Some("not a timestamp"));
    assert_eq!(context.validation_failures["CallDateTime"], 1);
}

#[test]
fn fallback_pattern_accepts_with_separate_counter() {
    let config = default_config().expect("default config");
    let mapper = SchemaMapper::new(&config.registry);
    let mut context = RunContext::new();

    let record = source_record(vec![
        ("Case #", "24-123456"),
        ("Received", "3/14/2024 09:30 AM"),
    ]);
    mapper.map(&record, &mut context);

    assert_eq!(context.fallback_validations["CallDateTime"], 1);
    assert!(context.validation_failures.is_empty());
}

#[test]
fn address_default_suffix_is_appended_once() {
    let config = default_config().expect("default config");
    let mapper = SchemaMapper::new(&config.registry);
    let mut context = RunContext::new();

    let record = source_record(vec![("Case #", "24-123456"), ("Address", "123 Main St")]);
    let canonical = mapper.map(&record, &mut context);
    assert_eq!(
        canonical.get("FullAddress2"),
        Some("123 Main St, Springfield, IL 62701")
    );

    // Already carries a city part: left alone.
    let record = source_record(vec![
        ("Case #", "24-123457"),
        ("Address", "9 Oak Ave, Springfield, IL 62701"),
    ]);
    let canonical = mapper.map(&record, &mut context);
    assert_eq!(
        canonical.get("FullAddress2"),
        Some("9 Oak Ave, Springfield, IL 62701")
    );
}

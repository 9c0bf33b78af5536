//! Compiled-in default configuration.
//!
//! The defaults cover the standard municipal CAD/RMS export layout and are
//! fully overridable by a TOML config file. Field aliases reflect the column
//! headers seen across vendor exports of both systems.

use std::collections::BTreeSet;

use cadrec_model::{
    CanonicalField, FieldGroup, FieldValidation, QualityWeights, RuleKind, SchemaRegistry,
    Severity, Transformation, ValidationRule,
};

use crate::types::{CorrectionRule, EngineConfig, MatchingConfig, SamplingConfig};

fn aliases(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

fn field(
    name: &str,
    alias_list: &[&str],
    required: bool,
    group: FieldGroup,
) -> CanonicalField {
    CanonicalField {
        name: name.to_string(),
        aliases: aliases(alias_list),
        required,
        group,
        transformations: Vec::new(),
        validation: None,
    }
}

/// Default canonical schema for CAD/RMS exports.
pub fn default_registry() -> SchemaRegistry {
    let mut case_number = field(
        "CaseNumber",
        &["Case #", "Case Number", "IncidentNumber", "Report #", "CFS #"],
        true,
        FieldGroup::Identity,
    );
    case_number.transformations = vec![
        Transformation::NormalizeWhitespace,
        Transformation::RegexExtract {
            pattern: r"(\d{2}-\d{4,6}(?:[A-Za-z]|S\d+)?)".to_string(),
        },
    ];
    case_number.validation = Some(FieldValidation {
        pattern: r"^\d{2}-\d{6}$".to_string(),
        fallback: Some(r"^\d{2}-\d{4,6}(?:[A-Za-z]|S\d+)?$".to_string()),
    });

    let mut incident = field(
        "Incident",
        &["Incident Type", "CallType", "Nature", "NatureCode"],
        true,
        FieldGroup::Outcome,
    );
    incident.transformations = vec![
        Transformation::NormalizeWhitespace,
        Transformation::Uppercase,
    ];

    let mut address = field(
        "FullAddress2",
        &["FullAddress", "Address", "Location", "CallAddress"],
        false,
        FieldGroup::Spatial,
    );
    address.transformations = vec![
        Transformation::NormalizeWhitespace,
        Transformation::ExpandAbbreviation {
            from: "AV".to_string(),
            to: "AVE".to_string(),
        },
        Transformation::AppendDefault {
            marker: ",".to_string(),
            suffix: ", Springfield, IL 62701".to_string(),
        },
    ];

    let mut call_time = field(
        "CallDateTime",
        &["Call Date/Time", "TimeCall", "Received"],
        true,
        FieldGroup::Temporal,
    );
    call_time.validation = Some(FieldValidation {
        pattern: r"^\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}(:\d{2})?$".to_string(),
        fallback: Some(r"^\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}:\d{2}(:\d{2})?(\s*[AP]M)?$".to_string()),
    });

    let mut dispatch_time = field(
        "DispatchDateTime",
        &["Dispatch Date/Time", "TimeDispatch", "Dispatched"],
        false,
        FieldGroup::Temporal,
    );
    dispatch_time.validation = call_time.validation.clone();

    let disposition = field(
        "Disposition",
        &["Dispo", "CallDisposition", "ClearanceCode"],
        false,
        FieldGroup::Outcome,
    );

    let officer = field(
        "Officer",
        &["Officer Name", "PrimaryUnit", "Unit", "Badge"],
        false,
        FieldGroup::Outcome,
    );

    let how_reported = field(
        "HowReported",
        &["How Reported", "CallSource", "Source"],
        false,
        FieldGroup::Narrative,
    );

    let narrative = field(
        "Narrative",
        &["Comments", "CallComments", "Remarks"],
        false,
        FieldGroup::Narrative,
    );

    SchemaRegistry {
        fields: vec![
            case_number,
            incident,
            address,
            call_time,
            dispatch_time,
            disposition,
            officer,
            how_reported,
            narrative,
        ],
        case_key_field: "CaseNumber".to_string(),
        generic_location_terms: vec![
            "UNKNOWN".to_string(),
            "CITY LIMITS".to_string(),
            "VARIOUS".to_string(),
            "CITY WIDE".to_string(),
            "SEE NARRATIVE".to_string(),
        ],
        valid_dispositions: vec![
            "ARREST".to_string(),
            "CITATION".to_string(),
            "REPORT".to_string(),
            "ADVISED".to_string(),
            "UNFOUNDED".to_string(),
            "GOA".to_string(),
            "UTL".to_string(),
            "SEE REPORT".to_string(),
            "REFERRED".to_string(),
        ],
    }
}

/// Default component weights (sum exactly 100).
pub fn default_weights() -> QualityWeights {
    let mut weights = QualityWeights::default();
    weights.0.insert("case".to_string(), 20.0);
    weights.0.insert("address".to_string(), 20.0);
    weights.0.insert("call_time".to_string(), 10.0);
    weights.0.insert("dispatch_time".to_string(), 10.0);
    weights.0.insert("match".to_string(), 25.0);
    weights.0.insert("officer".to_string(), 15.0);
    weights
}

/// Default validation rule set for the sampling validator.
pub fn default_rules() -> Vec<ValidationRule> {
    vec![
        ValidationRule {
            id: "CRIT_001".to_string(),
            severity: Severity::Critical,
            kind: RuleKind::CaseKeyPresent,
            fix_suggestion: Some("re-derive the case number from the source row".to_string()),
        },
        ValidationRule {
            id: "CRIT_002".to_string(),
            severity: Severity::Critical,
            kind: RuleKind::FieldMatches {
                field: "CaseNumber".to_string(),
                pattern: r"^\d{2}-\d{4,6}(?:[A-Za-z]|S\d+)?$".to_string(),
            },
            fix_suggestion: Some("normalize the case number format".to_string()),
        },
        ValidationRule {
            id: "IMP_001".to_string(),
            severity: Severity::Important,
            kind: RuleKind::AddressUsable {
                field: "FullAddress2".to_string(),
            },
            fix_suggestion: Some("apply the address correction set".to_string()),
        },
        ValidationRule {
            id: "IMP_002".to_string(),
            severity: Severity::Important,
            kind: RuleKind::TimestampParses {
                field: "CallDateTime".to_string(),
            },
            fix_suggestion: Some("re-parse the call timestamp from CAD".to_string()),
        },
        ValidationRule {
            id: "IMP_003".to_string(),
            severity: Severity::Important,
            kind: RuleKind::DispositionValid {
                field: "Disposition".to_string(),
            },
            fix_suggestion: Some("map the disposition to the configured list".to_string()),
        },
        ValidationRule {
            id: "OPT_001".to_string(),
            severity: Severity::Optional,
            kind: RuleKind::FieldPresent {
                field: "Officer".to_string(),
            },
            fix_suggestion: None,
        },
        ValidationRule {
            id: "OPT_002".to_string(),
            severity: Severity::Optional,
            kind: RuleKind::FieldPresent {
                field: "Narrative".to_string(),
            },
            fix_suggestion: None,
        },
    ]
}

/// Default rule-based corrections applied after the manual sets.
pub fn default_correction_rules() -> Vec<CorrectionRule> {
    vec![CorrectionRule {
        name: "backup_location".to_string(),
        correction_type: "address_fix".to_string(),
        match_field: "Incident".to_string(),
        pattern: r"(?i)\bBACK\s*UP\b|\bBACKUP\b".to_string(),
        target_field: "FullAddress2".to_string(),
        value: "Location Per CAD System".to_string(),
        only_if_blank: true,
    }]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registry: default_registry(),
            quality_weights: default_weights(),
            rules: default_rules(),
            sampling: SamplingConfig::default(),
            matching: MatchingConfig::default(),
            correction_rules: default_correction_rules(),
        }
    }
}

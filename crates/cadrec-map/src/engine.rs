//! Schema mapping engine.
//!
//! Maps raw source rows into canonical records in three strict steps:
//! renaming via alias resolution, declared per-field transformations, then
//! pattern validation (counted, never fatal). Unknown columns pass through
//! under their original name; nothing is dropped.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::{debug, warn};

use cadrec_model::{
    CanonicalRecord, FieldValidation, RunContext, SchemaRegistry, SourceRecord, Transformation,
};

/// Compiled per-field machinery, built once from the registry.
#[derive(Debug)]
struct CompiledField {
    transformations: Vec<CompiledTransformation>,
    validation: Option<CompiledValidation>,
}

#[derive(Debug)]
enum CompiledTransformation {
    RegexExtract(Regex),
    ExpandAbbreviation { from: String, to: String },
    AppendDefault { marker: String, suffix: String },
    DeriveFrom { field: String },
    Uppercase,
    NormalizeWhitespace,
}

#[derive(Debug)]
struct CompiledValidation {
    pattern: Regex,
    fallback: Option<Regex>,
}

/// The schema mapper for one run. Holds the immutable registry plus compiled
/// patterns; all per-run statistics go to the caller's [`RunContext`].
#[derive(Debug)]
pub struct SchemaMapper<'a> {
    registry: &'a SchemaRegistry,
    compiled: BTreeMap<String, CompiledField>,
}

impl<'a> SchemaMapper<'a> {
    /// Compile the registry's patterns. Patterns were validated at config
    /// load, so compilation failures cannot occur for a validated config;
    /// a field whose pattern still fails to compile keeps no machinery and
    /// passes values through.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        let mut compiled = BTreeMap::new();
        for field in &registry.fields {
            let transformations = field
                .transformations
                .iter()
                .filter_map(compile_transformation)
                .collect();
            let validation = field.validation.as_ref().and_then(compile_validation);
            compiled.insert(
                field.name.clone(),
                CompiledField {
                    transformations,
                    validation,
                },
            );
        }
        Self { registry, compiled }
    }

    /// Case-insensitive alias resolution. `None` for unknown columns.
    pub fn resolve(&self, raw_field_name: &str) -> Option<&str> {
        self.registry.resolve(raw_field_name)
    }

    /// Map one source record into a canonical record.
    pub fn map(&self, source: &SourceRecord, context: &mut RunContext) -> CanonicalRecord {
        let mut fields: BTreeMap<String, String> = BTreeMap::new();

        // Step 1: renaming. Later raw columns overwrite earlier ones that
        // resolve to the same canonical name (last-write-wins), with a
        // configuration warning.
        for (raw_name, value) in &source.columns {
            match self.resolve(raw_name) {
                Some(canonical) => {
                    let canonical = canonical.to_string();
                    if fields.contains_key(&canonical) {
                        context.warn(format!(
                            "columns collide on canonical field '{canonical}' \
                             (later column '{raw_name}' wins)"
                        ));
                        warn!(canonical = %canonical, raw = %raw_name, "duplicate column mapping");
                    }
                    context.record_mapped(&canonical);
                    fields.insert(canonical, value.clone());
                }
                None => {
                    // Unknown column: pass through unchanged under its
                    // original name.
                    context.record_unmapped(raw_name);
                    debug!(column = %raw_name, "unmapped column passed through");
                    fields.insert(raw_name.clone(), value.clone());
                }
            }
        }

        // Step 2: declared transformations, in declaration order.
        for field in &self.registry.fields {
            let Some(machinery) = self.compiled.get(&field.name) else {
                continue;
            };
            for transformation in &machinery.transformations {
                apply_transformation(&mut fields, &field.name, transformation);
            }
        }

        // Step 3: validation, counted but never fatal.
        for field in &self.registry.fields {
            let Some(machinery) = self.compiled.get(&field.name) else {
                continue;
            };
            let Some(validation) = &machinery.validation else {
                continue;
            };
            let Some(value) = fields.get(&field.name) else {
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }
            if validation.pattern.is_match(value) {
                continue;
            }
            match &validation.fallback {
                Some(fallback) if fallback.is_match(value) => {
                    context.record_fallback_validation(&field.name);
                }
                _ => context.record_validation_failure(&field.name),
            }
        }

        let case_key = fields
            .get(&self.registry.case_key_field)
            .map(|value| value.trim().to_string())
            .unwrap_or_default();
        let valid_case_key = !case_key.is_empty();
        if !valid_case_key {
            // Tagged invalid, never dropped.
            context.match_key_missing += 1;
        }

        CanonicalRecord {
            case_key,
            source_system: source.provenance.source_system,
            fields,
            valid_case_key,
        }
    }
}

fn compile_transformation(transformation: &Transformation) -> Option<CompiledTransformation> {
    match transformation {
        Transformation::RegexExtract { pattern } => Regex::new(pattern)
            .ok()
            .map(CompiledTransformation::RegexExtract),
        Transformation::ExpandAbbreviation { from, to } => {
            Some(CompiledTransformation::ExpandAbbreviation {
                from: from.clone(),
                to: to.clone(),
            })
        }
        Transformation::AppendDefault { marker, suffix } => {
            Some(CompiledTransformation::AppendDefault {
                marker: marker.clone(),
                suffix: suffix.clone(),
            })
        }
        Transformation::DeriveFrom { field } => Some(CompiledTransformation::DeriveFrom {
            field: field.clone(),
        }),
        Transformation::Uppercase => Some(CompiledTransformation::Uppercase),
        Transformation::NormalizeWhitespace => Some(CompiledTransformation::NormalizeWhitespace),
    }
}

fn compile_validation(validation: &FieldValidation) -> Option<CompiledValidation> {
    let pattern = Regex::new(&validation.pattern).ok()?;
    let fallback = validation
        .fallback
        .as_ref()
        .and_then(|raw| Regex::new(raw).ok());
    Some(CompiledValidation { pattern, fallback })
}

fn apply_transformation(
    fields: &mut BTreeMap<String, String>,
    field_name: &str,
    transformation: &CompiledTransformation,
) {
    match transformation {
        CompiledTransformation::DeriveFrom { field: other } => {
            let current_blank = fields
                .get(field_name)
                .is_none_or(|value| value.trim().is_empty());
            if current_blank {
                if let Some(derived) = fields.get(other).cloned() {
                    fields.insert(field_name.to_string(), derived);
                }
            }
        }
        _ => {
            let Some(value) = fields.get_mut(field_name) else {
                return;
            };
            match transformation {
                CompiledTransformation::RegexExtract(pattern) => {
                    if let Some(captures) = pattern.captures(value) {
                        if let Some(extracted) = captures.get(1) {
                            *value = extracted.as_str().to_string();
                        }
                    }
                }
                CompiledTransformation::ExpandAbbreviation { from, to } => {
                    let expanded: Vec<String> = value
                        .split_whitespace()
                        .map(|token| {
                            if token.eq_ignore_ascii_case(from) {
                                to.clone()
                            } else {
                                token.to_string()
                            }
                        })
                        .collect();
                    *value = expanded.join(" ");
                }
                CompiledTransformation::AppendDefault { marker, suffix } => {
                    if !value.trim().is_empty() && !value.contains(marker.as_str()) {
                        value.push_str(suffix);
                    }
                }
                CompiledTransformation::Uppercase => {
                    *value = value.to_uppercase();
                }
                CompiledTransformation::NormalizeWhitespace => {
                    *value = value.split_whitespace().collect::<Vec<_>>().join(" ");
                }
                CompiledTransformation::DeriveFrom { .. } => unreachable!("handled above"),
            }
        }
    }
}

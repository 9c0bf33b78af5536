//! Sample drawing.
//!
//! All three methods run off a caller-supplied seed: the same seed over the
//! same input always yields the same sample, so validation runs are
//! reproducible.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use cadrec_config::{SamplingConfig, SamplingMethod};
use cadrec_model::CanonicalRecord;

/// Bucket name for strata collapsed below the minimum size.
pub const OTHER_STRATUM: &str = "Other";

/// Stratum name for records with a blank stratification value.
const UNKNOWN_STRATUM: &str = "Unknown";

#[derive(Debug, Clone, Serialize)]
pub struct SampleStratum {
    pub key: String,
    pub population_size: usize,
    pub sample_size: usize,
}

/// A drawn sample: record indices into the population, plus the strata that
/// produced them (a single synthetic stratum for the non-stratified methods).
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub method: SamplingMethod,
    pub seed: u64,
    pub population_size: usize,
    pub indices: Vec<usize>,
    pub strata: Vec<SampleStratum>,
}

impl Sample {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Draw a sample from the population per the sampling configuration.
pub fn draw(population: &[CanonicalRecord], config: &SamplingConfig) -> Sample {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let target = config.target_sample_size.min(population.len());

    let (indices, strata) = match config.method {
        SamplingMethod::Stratified => {
            let field = config.stratify_by.as_deref().unwrap_or_default();
            stratified(population, field, config.min_stratum_size, target, &mut rng)
        }
        SamplingMethod::Systematic => systematic(population.len(), target, &mut rng),
        SamplingMethod::Random => random(population.len(), target, &mut rng),
    };

    info!(
        method = config.method.as_str(),
        population = population.len(),
        sample = indices.len(),
        strata = strata.len(),
        "sample drawn"
    );
    Sample {
        method: config.method,
        seed: config.seed,
        population_size: population.len(),
        indices,
        strata,
    }
}

/// Stratified draw: group by the categorical field, collapse small strata
/// into `Other`, then allocate by largest-remainder apportionment so the
/// allocations sum exactly to the target and never exceed a stratum's
/// population.
fn stratified(
    population: &[CanonicalRecord],
    field: &str,
    min_stratum_size: usize,
    target: usize,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<SampleStratum>) {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (position, record) in population.iter().enumerate() {
        let raw = record.get(field).unwrap_or("").trim();
        let key = if raw.is_empty() {
            UNKNOWN_STRATUM.to_string()
        } else {
            raw.to_string()
        };
        groups.entry(key).or_default().push(position);
    }

    // Collapse sub-minimum strata into the Other bucket.
    let mut collapsed: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (key, members) in groups {
        if members.len() < min_stratum_size && key != OTHER_STRATUM {
            collapsed
                .entry(OTHER_STRATUM.to_string())
                .or_default()
                .extend(members);
        } else {
            collapsed.entry(key).or_default().extend(members);
        }
    }
    for members in collapsed.values_mut() {
        members.sort_unstable();
    }

    let population_total: usize = collapsed.values().map(Vec::len).sum();
    if population_total == 0 || target == 0 {
        return (Vec::new(), Vec::new());
    }

    // Largest-remainder apportionment of the target across strata.
    let mut allocations: Vec<(String, usize, f64)> = collapsed
        .iter()
        .map(|(key, members)| {
            let exact = target as f64 * members.len() as f64 / population_total as f64;
            let floor = (exact.floor() as usize).min(members.len());
            (key.clone(), floor, exact - exact.floor())
        })
        .collect();
    let mut allocated: usize = allocations.iter().map(|(_, floor, _)| floor).sum();
    // Distribute the remainder by descending fractional part; ties break on
    // stratum name for determinism.
    let mut order: Vec<usize> = (0..allocations.len()).collect();
    order.sort_by(|&left, &right| {
        allocations[right]
            .2
            .partial_cmp(&allocations[left].2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| allocations[left].0.cmp(&allocations[right].0))
    });
    while allocated < target {
        let mut progressed = false;
        for &slot in &order {
            if allocated == target {
                break;
            }
            let stratum_population = collapsed[&allocations[slot].0].len();
            if allocations[slot].1 < stratum_population {
                allocations[slot].1 += 1;
                allocated += 1;
                progressed = true;
            }
        }
        if !progressed {
            break; // every stratum saturated
        }
    }

    let mut indices = Vec::with_capacity(target);
    let mut strata = Vec::with_capacity(allocations.len());
    for (key, amount, _) in allocations {
        let members = &collapsed[&key];
        let drawn = sample_without_replacement(members, amount, rng);
        strata.push(SampleStratum {
            key,
            population_size: members.len(),
            sample_size: drawn.len(),
        });
        indices.extend(drawn);
    }
    indices.sort_unstable();
    (indices, strata)
}

/// Systematic draw: random start offset in `[0, interval)`, then every
/// `interval`-th record.
fn systematic(
    population_size: usize,
    target: usize,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<SampleStratum>) {
    if population_size == 0 || target == 0 {
        return (Vec::new(), Vec::new());
    }
    let interval = (population_size / target).max(1);
    let start = rng.gen_range(0..interval);
    let indices: Vec<usize> = (start..population_size)
        .step_by(interval)
        .take(target)
        .collect();
    let strata = vec![SampleStratum {
        key: "All".to_string(),
        population_size,
        sample_size: indices.len(),
    }];
    (indices, strata)
}

/// Uniform draw without replacement.
fn random(
    population_size: usize,
    target: usize,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<SampleStratum>) {
    let members: Vec<usize> = (0..population_size).collect();
    let mut indices = sample_without_replacement(&members, target, rng);
    indices.sort_unstable();
    let strata = vec![SampleStratum {
        key: "All".to_string(),
        population_size,
        sample_size: indices.len(),
    }];
    (indices, strata)
}

/// Partial Fisher-Yates over a copy of the member list.
fn sample_without_replacement(members: &[usize], amount: usize, rng: &mut StdRng) -> Vec<usize> {
    let amount = amount.min(members.len());
    let mut pool: Vec<usize> = members.to_vec();
    for position in 0..amount {
        let swap = rng.gen_range(position..pool.len());
        pool.swap(position, swap);
    }
    pool.truncate(amount);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadrec_model::SourceSystem;

    fn population(incidents: &[(&str, usize)]) -> Vec<CanonicalRecord> {
        let mut records = Vec::new();
        for (incident, count) in incidents {
            for index in 0..*count {
                records.push(CanonicalRecord {
                    case_key: format!("24-{index:06}"),
                    source_system: SourceSystem::Cad,
                    fields: [("Incident".to_string(), (*incident).to_string())]
                        .into_iter()
                        .collect(),
                    valid_case_key: true,
                });
            }
        }
        records
    }

    fn config(method: SamplingMethod, target: usize) -> SamplingConfig {
        SamplingConfig {
            method,
            seed: 42,
            target_sample_size: target,
            min_stratum_size: 50,
            stratify_by: Some("Incident".to_string()),
            ..SamplingConfig::default()
        }
    }

    #[test]
    fn same_seed_same_sample() {
        let records = population(&[("THEFT", 400), ("ALARM", 300), ("BACKUP", 300)]);
        let config = config(SamplingMethod::Stratified, 100);
        let first = draw(&records, &config);
        let second = draw(&records, &config);
        assert_eq!(first.indices, second.indices);
    }

    #[test]
    fn stratified_proportions_are_preserved() {
        // 10,000 rows, 1,000-row sample: each stratum's sample share must
        // track its population share within rounding tolerance.
        let records = population(&[
            ("THEFT", 5_000),
            ("ALARM", 3_000),
            ("CRASH", 1_960),
            ("RAREBIRD", 40),
        ]);
        let sample = draw(&records, &config(SamplingMethod::Stratified, 1_000));
        assert_eq!(sample.len(), 1_000);

        for stratum in &sample.strata {
            assert!(stratum.sample_size <= stratum.population_size);
            let population_share = stratum.population_size as f64 / 10_000.0;
            let sample_share = stratum.sample_size as f64 / 1_000.0;
            assert!(
                (population_share - sample_share).abs() < 0.005,
                "stratum {} drifted: population {population_share:.4} vs sample {sample_share:.4}",
                stratum.key
            );
        }

        // The 40-row stratum sits below the minimum and must only appear
        // inside Other.
        assert!(!sample.strata.iter().any(|stratum| stratum.key == "RAREBIRD"));
        let other = sample
            .strata
            .iter()
            .find(|stratum| stratum.key == OTHER_STRATUM)
            .expect("Other bucket present");
        assert_eq!(other.population_size, 40);
    }

    #[test]
    fn blank_stratum_values_group_as_unknown() {
        let mut records = population(&[("THEFT", 60)]);
        for record in records.iter_mut().take(55) {
            record.fields.insert("Incident".to_string(), " ".to_string());
        }
        let sample = draw(&records, &config(SamplingMethod::Stratified, 20));
        assert!(sample.strata.iter().any(|stratum| stratum.key == "Unknown"));
    }

    #[test]
    fn systematic_uses_constant_interval() {
        let records = population(&[("THEFT", 100)]);
        let sample = draw(&records, &config(SamplingMethod::Systematic, 10));
        assert_eq!(sample.len(), 10);
        let interval = sample.indices[1] - sample.indices[0];
        for window in sample.indices.windows(2) {
            assert_eq!(window[1] - window[0], interval);
        }
        assert!(sample.indices[0] < interval);
    }

    #[test]
    fn random_draws_without_replacement() {
        let records = population(&[("THEFT", 50)]);
        let sample = draw(&records, &config(SamplingMethod::Random, 25));
        assert_eq!(sample.len(), 25);
        let mut unique = sample.indices.clone();
        unique.dedup();
        assert_eq!(unique.len(), 25);
    }

    #[test]
    fn target_larger_than_population_is_capped() {
        let records = population(&[("THEFT", 30)]);
        let sample = draw(&records, &config(SamplingMethod::Random, 100));
        assert_eq!(sample.len(), 30);
        assert_eq!(sample.population_size, 30);
    }
}

//! Round-robin filter assigning scenarios to one of N workers.
//!
//! Every plain scenario and every data row of a scenario outline is one
//! schedulable unit. Units are numbered in document order across the whole
//! run and worker `i` of `n` keeps the units where the shared counter is a
//! multiple of `n`. Each worker process builds its own filter; as long as all
//! of them see the same suite in the same order the partitions are disjoint
//! and together cover every unit.

use std::collections::HashSet;

use gherkin::{Examples, Feature, Scenario};
use stepkit_core::Result;
use tracing::{debug, instrument};

use crate::config::WorkerConfig;

/// Position of a schedulable unit inside a feature.
///
/// `rule` is `None` for scenarios directly under the feature. `row` indexes
/// the Examples table rows, so the first data row is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchedulableUnit {
    Scenario {
        rule: Option<usize>,
        scenario: usize,
    },
    Example {
        rule: Option<usize>,
        scenario: usize,
        examples: usize,
        row: usize,
    },
}

impl SchedulableUnit {
    pub fn scenario<'f>(&self, feature: &'f Feature) -> Option<&'f Scenario> {
        let (rule, index) = match *self {
            SchedulableUnit::Scenario { rule, scenario } => (rule, scenario),
            SchedulableUnit::Example { rule, scenario, .. } => (rule, scenario),
        };
        match rule {
            None => feature.scenarios.get(index),
            Some(rule) => feature.rules.get(rule)?.scenarios.get(index),
        }
    }

    /// Source line of the scenario, or of the example row.
    ///
    /// Example rows are assumed to sit on consecutive lines after the table
    /// header; use [`SchedulableUnit::line_in_source`] when comments or
    /// blank lines may sit between rows.
    pub fn line(&self, feature: &Feature) -> Option<usize> {
        let scenario = self.scenario(feature)?;
        match *self {
            SchedulableUnit::Scenario { .. } => Some(scenario.position.line),
            SchedulableUnit::Example { examples, row, .. } => {
                let table = scenario.examples.get(examples)?.table.as_ref()?;
                Some(table.position.line + row)
            }
        }
    }

    /// Like [`SchedulableUnit::line`], but finds example rows in `source`,
    /// the text `feature` was parsed from.
    pub fn line_in_source(&self, feature: &Feature, source: &str) -> Option<usize> {
        let SchedulableUnit::Example { examples, row, .. } = *self else {
            return self.line(feature);
        };
        let table = self.scenario(feature)?.examples.get(examples)?.table.as_ref()?;
        table_row_line(source, table.position.line, row)
    }
}

/// Line of row `row` of the table starting on `table_line`, counting only
/// lines that hold table cells.
fn table_row_line(source: &str, table_line: usize, row: usize) -> Option<usize> {
    source
        .lines()
        .enumerate()
        .skip(table_line.saturating_sub(1))
        .filter(|(_, text)| text.trim_start().starts_with('|'))
        .nth(row)
        .map(|(index, _)| index + 1)
}

/// Every schedulable unit of `feature` in document order: scenarios
/// directly under the feature first, then those of each rule.
pub fn schedulable_units(feature: &Feature) -> Vec<SchedulableUnit> {
    let mut units = Vec::new();
    collect_units(None, &feature.scenarios, &mut units);
    for (index, rule) in feature.rules.iter().enumerate() {
        collect_units(Some(index), &rule.scenarios, &mut units);
    }
    units
}

fn collect_units(rule: Option<usize>, scenarios: &[Scenario], units: &mut Vec<SchedulableUnit>) {
    for (scenario_index, scenario) in scenarios.iter().enumerate() {
        if !is_outline(scenario) {
            units.push(SchedulableUnit::Scenario {
                rule,
                scenario: scenario_index,
            });
            continue;
        }
        for (examples_index, examples) in scenario.examples.iter().enumerate() {
            let rows = examples.table.as_ref().map_or(0, |t| t.rows.len());
            units.extend((1..rows).map(|row| SchedulableUnit::Example {
                rule,
                scenario: scenario_index,
                examples: examples_index,
                row,
            }));
        }
    }
}

fn is_outline(scenario: &Scenario) -> bool {
    !scenario.examples.is_empty()
}

/// The selection interface a runner drives while loading features.
pub trait FeatureFilter {
    fn is_feature_match(&self, feature: &Feature) -> bool;

    fn is_scenario_match(&self, feature: &Feature, scenario: &Scenario) -> bool;

    /// The part of `feature` this filter keeps, or `None` when nothing is left.
    fn filter_feature(&mut self, feature: Feature) -> Option<Feature>;
}

#[derive(Debug, Clone)]
pub struct ParallelWorkerFilter {
    config: WorkerConfig,
    scenario_counter: usize,
}

impl ParallelWorkerFilter {
    pub fn new(current_worker: usize, total_workers: usize) -> Result<Self> {
        Self::from_config(WorkerConfig::new(current_worker, total_workers))
    }

    pub fn from_config(config: WorkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            // The first unit lands on worker 0.
            scenario_counter: config.total_workers - config.current_worker,
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Take the next position in the rotation; `true` when it is ours.
    pub fn claim_next(&mut self) -> bool {
        let mine = self.scenario_counter % self.config.total_workers == 0;
        self.scenario_counter += 1;
        mine
    }

    /// Units of `feature` that belong to this worker, advancing the counter.
    pub fn assign(&mut self, feature: &Feature) -> Vec<SchedulableUnit> {
        let units = schedulable_units(feature);
        if self.config.line_mode {
            return if self.claim_next() { units } else { Vec::new() };
        }
        units.into_iter().filter(|_| self.claim_next()).collect()
    }

    /// Filter a whole suite in order, sharing one counter.
    pub fn filter_features<I>(&mut self, features: I) -> Vec<Feature>
    where
        I: IntoIterator<Item = Feature>,
    {
        features
            .into_iter()
            .filter_map(|feature| self.filter_feature(feature))
            .collect()
    }
}

impl FeatureFilter for ParallelWorkerFilter {
    /// Never matches; selection happens in [`FeatureFilter::filter_feature`].
    fn is_feature_match(&self, _feature: &Feature) -> bool {
        false
    }

    /// Always matches; selection happens in [`FeatureFilter::filter_feature`].
    fn is_scenario_match(&self, _feature: &Feature, _scenario: &Scenario) -> bool {
        true
    }

    #[instrument(skip(self, feature), fields(feature = %feature.name, worker = self.config.current_worker))]
    fn filter_feature(&mut self, feature: Feature) -> Option<Feature> {
        if self.config.line_mode {
            let keep = self.claim_next();
            debug!(keep, "line mode decision");
            return keep.then_some(feature);
        }

        let kept: HashSet<SchedulableUnit> = self.assign(&feature).into_iter().collect();
        debug!(kept = kept.len(), "units assigned to this worker");
        rebuild(feature, &kept)
    }
}

fn rebuild(feature: Feature, kept: &HashSet<SchedulableUnit>) -> Option<Feature> {
    let mut feature = feature;
    let scenarios = retain_scenarios(None, std::mem::take(&mut feature.scenarios), kept);

    let rules: Vec<_> = std::mem::take(&mut feature.rules)
        .into_iter()
        .enumerate()
        .filter_map(|(index, mut rule)| {
            rule.scenarios = retain_scenarios(Some(index), std::mem::take(&mut rule.scenarios), kept);
            (!rule.scenarios.is_empty()).then_some(rule)
        })
        .collect();

    if scenarios.is_empty() && rules.is_empty() {
        return None;
    }
    feature.scenarios = scenarios;
    feature.rules = rules;
    Some(feature)
}

fn retain_scenarios(
    rule: Option<usize>,
    scenarios: Vec<Scenario>,
    kept: &HashSet<SchedulableUnit>,
) -> Vec<Scenario> {
    scenarios
        .into_iter()
        .enumerate()
        .filter_map(|(index, mut scenario)| {
            if !is_outline(&scenario) {
                let unit = SchedulableUnit::Scenario {
                    rule,
                    scenario: index,
                };
                return kept.contains(&unit).then_some(scenario);
            }

            let examples: Vec<Examples> = std::mem::take(&mut scenario.examples)
                .into_iter()
                .enumerate()
                .filter_map(|(examples_index, examples)| {
                    retain_rows(examples, |row| {
                        kept.contains(&SchedulableUnit::Example {
                            rule,
                            scenario: index,
                            examples: examples_index,
                            row,
                        })
                    })
                })
                .collect();

            if examples.is_empty() {
                return None;
            }
            scenario.examples = examples;
            Some(scenario)
        })
        .collect()
}

/// Keep the header row and the data rows `keep` accepts; `None` when no
/// data row survives.
fn retain_rows(mut examples: Examples, keep: impl Fn(usize) -> bool) -> Option<Examples> {
    let mut table = examples.table.take()?;
    let mut rows = std::mem::take(&mut table.rows).into_iter().enumerate();
    let (_, header) = rows.next()?;

    let data: Vec<Vec<String>> = rows
        .filter(|(row, _)| keep(*row))
        .map(|(_, cells)| cells)
        .collect();
    if data.is_empty() {
        return None;
    }

    table.rows = std::iter::once(header).chain(data).collect();
    examples.table = Some(table);
    Some(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gherkin::GherkinEnv;

    fn parse(source: &str) -> Feature {
        Feature::parse(source, GherkinEnv::default()).expect("valid feature")
    }

    fn names(feature: &Option<Feature>) -> Vec<String> {
        feature
            .iter()
            .flat_map(|f| f.scenarios.iter().map(|s| s.name.clone()))
            .collect()
    }

    const ABC: &str = "\
Feature: Letters
  Scenario: A
    Given a step

  Scenario: B
    Given a step

  Scenario: C
    Given a step
";

    const OUTLINE: &str = "\
@slow
Feature: Outlines
  Background:
    Given a background step

  Scenario: Plain
    Given a step

  Scenario Outline: Numbers
    Given the number <n>

    Examples:
      | n |
      | 1 |
      | 2 |
      | 3 |

  Scenario: Last
    Given a step
";

    #[test]
    fn two_workers_split_three_scenarios() {
        let mut first = ParallelWorkerFilter::new(0, 2).unwrap();
        let mut second = ParallelWorkerFilter::new(1, 2).unwrap();

        assert_eq!(names(&first.filter_feature(parse(ABC))), vec!["A", "C"]);
        assert_eq!(names(&second.filter_feature(parse(ABC))), vec!["B"]);
    }

    #[test]
    fn single_worker_keeps_everything() {
        let mut filter = ParallelWorkerFilter::new(0, 1).unwrap();
        let original = parse(OUTLINE);
        assert_eq!(filter.filter_feature(original.clone()), Some(original));
    }

    #[test]
    fn outline_rows_are_units_and_header_is_kept() {
        // Units: Plain, n=1, n=2, n=3, Last
        let mut filter = ParallelWorkerFilter::new(1, 2).unwrap();
        let feature = filter.filter_feature(parse(OUTLINE)).unwrap();

        assert_eq!(names(&Some(feature.clone())), vec!["Numbers"]);
        let table = feature.scenarios[0].examples[0].table.as_ref().unwrap();
        assert_eq!(table.rows, vec![vec!["n".to_string()], vec!["1".to_string()], vec!["3".to_string()]]);
        assert_eq!(feature.tags, vec!["slow".to_string()]);
        assert!(feature.background.is_some());
    }

    #[test]
    fn first_worker_takes_even_positions_across_outline_rows() {
        let mut filter = ParallelWorkerFilter::new(0, 2).unwrap();
        let feature = filter.filter_feature(parse(OUTLINE)).unwrap();

        assert_eq!(names(&Some(feature.clone())), vec!["Plain", "Numbers", "Last"]);
        let table = feature.scenarios[1].examples[0].table.as_ref().unwrap();
        assert_eq!(table.rows, vec![vec!["n".to_string()], vec!["2".to_string()]]);
    }

    #[test]
    fn outlines_without_surviving_rows_are_dropped() {
        // Units: Plain, n=1, n=2, n=3, Last with four workers; worker 0 gets Plain and Last.
        let mut filter = ParallelWorkerFilter::new(0, 4).unwrap();
        assert_eq!(names(&filter.filter_feature(parse(OUTLINE))), vec!["Plain", "Last"]);
    }

    #[test]
    fn counter_carries_across_features() {
        let mut filter = ParallelWorkerFilter::new(0, 2).unwrap();
        let kept = filter.filter_features([parse(ABC), parse(ABC)]);

        // Global order A B C A B C: worker 0 gets positions 0, 2, 4.
        assert_eq!(names(&kept.first().cloned()), vec!["A", "C"]);
        assert_eq!(names(&kept.get(1).cloned()), vec!["B"]);
    }

    #[test]
    fn empty_results_are_none() {
        let mut filter = ParallelWorkerFilter::new(2, 3).unwrap();
        let single = parse("Feature: One\n  Scenario: Only\n    Given a step\n");
        assert!(filter.filter_feature(single).is_none());
    }

    #[test]
    fn line_mode_decides_whole_features() {
        let config = WorkerConfig::new(1, 2).with_line_mode(true);
        let mut filter = ParallelWorkerFilter::from_config(config).unwrap();

        assert!(filter.filter_feature(parse(ABC)).is_none());
        assert_eq!(names(&filter.filter_feature(parse(ABC))), vec!["A", "B", "C"]);
        assert!(filter.filter_feature(parse(ABC)).is_none());
    }

    #[test]
    fn predicates_are_constant() {
        let filter = ParallelWorkerFilter::new(0, 3).unwrap();
        let feature = parse(ABC);
        assert!(!filter.is_feature_match(&feature));
        assert!(feature
            .scenarios
            .iter()
            .all(|scenario| filter.is_scenario_match(&feature, scenario)));
    }

    #[test]
    fn rules_are_filtered_after_feature_scenarios() {
        let source = "\
Feature: Rules
  Scenario: Top
    Given a step

  Rule: First rule
    Scenario: R1
      Given a step

    Scenario: R2
      Given a step

  Rule: Second rule
    Scenario: R3
      Given a step
";
        let mut filter = ParallelWorkerFilter::new(1, 2).unwrap();
        let feature = filter.filter_feature(parse(source)).unwrap();

        assert!(feature.scenarios.is_empty());
        assert_eq!(feature.rules.len(), 2);
        assert_eq!(feature.rules[0].scenarios[0].name, "R1");
        assert_eq!(feature.rules[1].scenarios[0].name, "R3");
    }

    #[test]
    fn unit_lines_point_at_source() {
        let feature = parse(OUTLINE);
        let lines: Vec<_> = schedulable_units(&feature)
            .iter()
            .map(|unit| unit.line(&feature).unwrap())
            .collect();
        assert_eq!(lines, vec![6, 14, 15, 16, 18]);
    }

    #[test]
    fn row_lines_skip_comments_inside_examples() {
        let source = "\
Feature: Commented
  Scenario Outline: Numbers
    Given the number <n>

    Examples:
      | n |
      # disabled for now
      | 1 |

      | 2 |
";
        assert_eq!(table_row_line(source, 6, 0), Some(6));
        assert_eq!(table_row_line(source, 6, 1), Some(8));
        assert_eq!(table_row_line(source, 6, 2), Some(10));
        assert_eq!(table_row_line(source, 6, 3), None);

        let feature = parse(OUTLINE);
        for unit in schedulable_units(&feature) {
            assert_eq!(unit.line_in_source(&feature, OUTLINE), unit.line(&feature));
        }
    }

    #[test]
    fn construction_validates() {
        assert!(ParallelWorkerFilter::new(0, 0).is_err());
        assert!(ParallelWorkerFilter::new(2, 2).is_err());
    }
}

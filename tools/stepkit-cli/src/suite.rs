//! Loading feature files and listing one worker's share of them.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use gherkin::{Feature, GherkinEnv};
use parallel_worker::{schedulable_units, ParallelWorkerFilter, SchedulableUnit, WorkerConfig};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A feature file, optionally narrowed to the scenario at `line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRef {
    pub path: PathBuf,
    pub line: Option<usize>,
}

/// One scenario or example row handed to this worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub path: PathBuf,
    pub line: usize,
    pub name: String,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.path.display(), self.line, self.name)
    }
}

/// Split `path:line` when line references are enabled.
pub fn parse_reference(arg: &str, line_mode: bool) -> FeatureRef {
    if line_mode {
        if let Some((path, line)) = arg.rsplit_once(':') {
            if let (false, Ok(line)) = (path.is_empty(), line.parse::<usize>()) {
                return FeatureRef {
                    path: PathBuf::from(path),
                    line: Some(line),
                };
            }
        }
    }
    FeatureRef {
        path: PathBuf::from(arg),
        line: None,
    }
}

/// Expand directories into the `.feature` files below them, sorted by name.
pub fn collect_references(args: &[String], line_mode: bool) -> anyhow::Result<Vec<FeatureRef>> {
    let mut references = Vec::new();

    for arg in args {
        let reference = parse_reference(arg, line_mode);
        if !reference.path.is_dir() {
            references.push(reference);
            continue;
        }
        if reference.line.is_some() {
            bail!("{arg} points a line number at a directory");
        }

        for entry in WalkDir::new(&reference.path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", reference.path.display()))?;
            if entry.file_type().is_file() && is_feature_file(entry.path()) {
                references.push(FeatureRef {
                    path: entry.into_path(),
                    line: None,
                });
            }
        }
    }

    Ok(references)
}

fn is_feature_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "feature")
}

/// Everything worker `config.current_worker` runs, in suite order.
pub fn partition(config: WorkerConfig, args: &[String]) -> anyhow::Result<Vec<Assignment>> {
    let mut filter = ParallelWorkerFilter::from_config(config)?;
    let mut assigned = Vec::new();

    for reference in collect_references(args, config.line_mode)? {
        let source = fs::read_to_string(&reference.path)
            .with_context(|| format!("failed to read {}", reference.path.display()))?;
        let feature = Feature::parse(&source, GherkinEnv::default())
            .with_context(|| format!("failed to parse {}", reference.path.display()))?;

        let units = match reference.line {
            None => filter.assign(&feature),
            Some(line) => {
                let units = units_at_line(&feature, &source, line);
                if units.is_empty() {
                    warn!(path = %reference.path.display(), line, "no scenario at this line");
                    continue;
                }
                if filter.claim_next() {
                    units
                } else {
                    Vec::new()
                }
            }
        };
        debug!(path = %reference.path.display(), units = units.len(), "feature assigned");

        assigned.extend(
            units
                .iter()
                .filter_map(|unit| describe(&reference.path, &feature, &source, unit)),
        );
    }

    Ok(assigned)
}

/// Units starting at `line`; an outline's own line selects all its rows.
fn units_at_line(feature: &Feature, source: &str, line: usize) -> Vec<SchedulableUnit> {
    schedulable_units(feature)
        .into_iter()
        .filter(|unit| {
            unit.line_in_source(feature, source) == Some(line)
                || unit.scenario(feature).map(|s| s.position.line) == Some(line)
        })
        .collect()
}

fn describe(
    path: &Path,
    feature: &Feature,
    source: &str,
    unit: &SchedulableUnit,
) -> Option<Assignment> {
    let scenario = unit.scenario(feature)?;
    let name = match unit {
        SchedulableUnit::Scenario { .. } => scenario.name.clone(),
        SchedulableUnit::Example { row, .. } => format!("{} (example {row})", scenario.name),
    };
    Some(Assignment {
        path: path.to_path_buf(),
        line: unit.line_in_source(feature, source)?,
        name,
    })
}

use std::error::Error;
use crate::logger::{Logger, LogEvent};
use crate::logln;
use crate::errln;

/// Function type for scenario entry functions
/// The seed makes every iteration of a scenario reproducible
pub type ScenarioFn = fn(scenario_name: &str, seed: u64, logger: &mut Logger) -> Result<(), Box<dyn Error>>;

/// Entry in the scenario catalog
#[derive(Clone)]
pub struct ScenarioEntry {
    pub short_name: &'static str,
    pub run: ScenarioFn,
}

// Create an inventory collection for scenario entries
inventory::collect!(ScenarioEntry);

/// Get all registered scenarios from the catalog, sorted by name
pub fn get_scenario_catalog() -> Vec<ScenarioEntry> {
    let mut entries: Vec<ScenarioEntry> = inventory::iter::<ScenarioEntry>
        .into_iter()
        .cloned()
        .collect();
    entries.sort_by_key(|entry| entry.short_name);
    entries
}

/// Collects the outcome of scenario checks and logs each one as it is made
pub struct Validation {
    errors: Vec<String>,
}

impl Validation {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn check(&mut self, passed: bool, msg: String, logger: &mut Logger) {
        if passed {
            logln!(logger, LogEvent::Scenario, "✓ {}", msg);
        } else {
            errln!(logger, LogEvent::Scenario, "✗ {}", msg);
            self.errors.push(msg);
        }
    }

    pub fn finish(self, scenario_name: &str) -> Result<(), Box<dyn Error>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(format!("Scenario '{}' validation failed:\n{}", scenario_name, self.errors.join("\n")).into())
        }
    }
}

// Scenario modules
pub mod balanced_gsp;
pub mod vcg_vs_gsp;
pub mod utility_formula;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_contains_all_scenarios() {
        let names: Vec<&str> = get_scenario_catalog().iter().map(|s| s.short_name).collect();
        assert_eq!(names, vec!["balanced_gsp", "utility_formula", "vcg_vs_gsp"]);
    }

    #[test]
    fn test_validation_collects_failures() {
        let mut logger = Logger::new();
        let mut validation = Validation::new();
        validation.check(true, "fine".to_string(), &mut logger);
        assert!(Validation::new().finish("empty").is_ok());
        validation.check(false, "broken".to_string(), &mut logger);
        let err = validation.finish("demo").unwrap_err();
        assert_eq!(err.to_string(), "Scenario 'demo' validation failed:\nbroken");
    }

    #[test]
    fn test_all_scenarios_pass() {
        let mut logger = Logger::new();
        for scenario in get_scenario_catalog() {
            for seed in 0..3 {
                if let Err(e) = (scenario.run)(scenario.short_name, seed, &mut logger) {
                    panic!("{} failed with seed {}: {}", scenario.short_name, seed, e);
                }
            }
        }
    }
}

//! Built-in evaluators.
//!
//! `structure` is the default and needs no configuration. `rubric` is loaded
//! from a YAML file named in the config (`evaluator.path`).

pub mod rubric;
pub mod structure;
pub mod terms;

use doceval_core::evaluator::{Evaluator, EvaluatorRegistry};
use std::sync::Arc;

pub use rubric::{Rubric, RubricEvaluator};
pub use structure::StructureEvaluator;

/// Registry with every built-in evaluator.
pub fn default_registry() -> EvaluatorRegistry {
    let mut reg = EvaluatorRegistry::new();
    reg.register(structure::NAME, |_| {
        Ok(Arc::new(StructureEvaluator::default()) as Arc<dyn Evaluator>)
    });
    reg.register(rubric::NAME, |path| {
        let path = path.ok_or_else(|| {
            anyhow::anyhow!("config error: evaluator 'rubric' requires evaluator.path")
        })?;
        Ok(Arc::new(RubricEvaluator::from_path(path)?) as Arc<dyn Evaluator>)
    });
    reg
}

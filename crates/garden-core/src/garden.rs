//! The path DAG: a declaration of which derived `(name, version)` points can
//! be computed from which ordered inputs.

use std::collections::{HashMap, HashSet};

use crate::error::CycleError;

/// A `(name, version)` reference to a path destination or input.
pub type PathRef = (String, String);

/// An ordered list of input refs: one recipe for computing a destination.
pub type Recipe = Vec<PathRef>;

/// The path DAG, keyed by value (`(name, version)`) rather than by pointer,
/// per the garden's design notes on representing cyclic/shared graph nodes.
///
/// Append-only after construction: paths are added once and read many times,
/// safe for concurrent reads.
#[derive(Debug, Clone, Default)]
pub struct Garden {
    inputs_of: HashMap<PathRef, Vec<Recipe>>,
    paths_requiring: HashMap<PathRef, Vec<PathRef>>,
}

impl Garden {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recipe for `(name, version)`. Re-adding the same destination
    /// appends another recipe (alternative recipes are permitted, duplicates
    /// included); an empty `inputs` list marks the destination as a raw
    /// input seed.
    ///
    /// Fails with [`CycleError`] if `(name, version)` is one of its own
    /// inputs, or if `(name, version)` is already a transitive ancestor of
    /// one of the inputs (meaning the input already depends on this
    /// destination, directly or indirectly). On failure the Garden is left
    /// unchanged.
    pub fn add_path(
        &mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        inputs: Vec<PathRef>,
    ) -> Result<(), CycleError> {
        let dest: PathRef = (name.into(), version.into());

        if inputs.iter().any(|input| input == &dest) {
            return Err(CycleError::SelfReference(dest));
        }
        for input in &inputs {
            let mut ancestors = HashSet::new();
            self.collect_ancestors(input, &mut ancestors);
            if ancestors.contains(&dest) {
                return Err(CycleError::AncestorCycle {
                    dest,
                    input: input.clone(),
                });
            }
        }

        for input in &inputs {
            self.paths_requiring
                .entry(input.clone())
                .or_default()
                .push(dest.clone());
        }
        self.inputs_of.entry(dest).or_default().push(inputs);
        Ok(())
    }

    /// The transitive ancestor set of `node`: every `(name, version)` that
    /// `node` depends on, directly or indirectly, across all of its
    /// recipes. A DFS over `inputs_of`, visited-set-bounded so it terminates
    /// even if called before a cycle check (the Garden itself is acyclic by
    /// construction once a path is successfully added).
    fn collect_ancestors(&self, node: &PathRef, visited: &mut HashSet<PathRef>) {
        let Some(recipes) = self.inputs_of.get(node) else {
            return;
        };
        for recipe in recipes {
            for input in recipe {
                if visited.insert(input.clone()) {
                    self.collect_ancestors(input, visited);
                }
            }
        }
    }

    /// Destinations that require `(name, version)` as one of their inputs.
    /// Empty if unknown.
    pub fn paths_requiring(&self, name: &str, version: &str) -> Vec<PathRef> {
        self.paths_requiring
            .get(&(name.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// The recipes declared for `(name, version)`. Empty if unknown.
    pub fn inputs_for(&self, name: &str, version: &str) -> Vec<Recipe> {
        self.inputs_of
            .get(&(name.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(name: &str, version: &str) -> PathRef {
        (name.to_string(), version.to_string())
    }

    #[test]
    fn add_path_preserves_input_order() {
        let mut garden = Garden::new();
        garden
            .add_path("cake", "1", vec![pr("eggs", "1"), pr("flour", "1")])
            .unwrap();
        let recipes = garden.inputs_for("cake", "1");
        assert_eq!(recipes, vec![vec![pr("eggs", "1"), pr("flour", "1")]]);
    }

    #[test]
    fn re_adding_same_destination_appends_alternative_recipe() {
        let mut garden = Garden::new();
        garden.add_path("cake", "1", vec![pr("flour", "1")]).unwrap();
        garden.add_path("cake", "1", vec![pr("rice", "1")]).unwrap();
        assert_eq!(garden.inputs_for("cake", "1").len(), 2);
    }

    #[test]
    fn empty_recipe_marks_a_raw_input_seed() {
        let mut garden = Garden::new();
        garden.add_path("flour", "1", vec![]).unwrap();
        assert_eq!(garden.inputs_for("flour", "1"), vec![vec![]]);
    }

    #[test]
    fn self_reference_is_rejected() {
        let mut garden = Garden::new();
        let err = garden.add_path("a", "1", vec![pr("a", "1")]).unwrap_err();
        assert_eq!(err, CycleError::SelfReference(pr("a", "1")));
        assert!(garden.inputs_for("a", "1").is_empty());
    }

    #[test]
    fn transitive_cycle_is_rejected_and_state_is_unchanged() {
        let mut garden = Garden::new();
        garden.add_path("a", "1", vec![pr("b", "1")]).unwrap();
        garden.add_path("b", "1", vec![pr("c", "1")]).unwrap();
        let err = garden.add_path("c", "1", vec![pr("a", "1")]).unwrap_err();
        assert!(matches!(err, CycleError::AncestorCycle { .. }));
        assert!(garden.inputs_for("c", "1").is_empty());
        assert_eq!(garden.inputs_for("a", "1"), vec![vec![pr("b", "1")]]);
        assert_eq!(garden.inputs_for("b", "1"), vec![vec![pr("c", "1")]]);
    }

    #[test]
    fn paths_requiring_reports_direct_dependents() {
        let mut garden = Garden::new();
        garden.add_path("cake", "1", vec![pr("flour", "1")]).unwrap();
        assert_eq!(garden.paths_requiring("flour", "1"), vec![pr("cake", "1")]);
        assert!(garden.paths_requiring("cake", "1").is_empty());
    }

    #[test]
    fn unknown_path_returns_empty() {
        let garden = Garden::new();
        assert!(garden.inputs_for("nope", "1").is_empty());
        assert!(garden.paths_requiring("nope", "1").is_empty());
    }
}

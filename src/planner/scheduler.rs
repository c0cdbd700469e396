use crate::planner::PlanGraph;
use serde::Serialize;
use std::collections::BTreeMap;

/// Steps with no edges between them, eligible to run concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wave {
    pub index: usize,
    /// Step ids in plan declaration order.
    pub steps: Vec<String>,
}

impl Wave {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub struct DependencyScheduler;

impl DependencyScheduler {
    /// Topological leveling: each wave holds every step whose predecessors
    /// all sit in earlier waves.
    pub fn schedule(graph: &PlanGraph) -> Vec<Wave> {
        let mut in_degree = graph
            .steps()
            .iter()
            .map(|step| (step.id.as_str(), graph.dependencies_of(&step.id).count()))
            .collect::<BTreeMap<_, _>>();

        let mut ready = graph
            .steps()
            .iter()
            .filter(|step| in_degree.get(step.id.as_str()) == Some(&0))
            .map(|step| step.id.as_str())
            .collect::<Vec<_>>();

        let mut waves = Vec::new();
        while !ready.is_empty() {
            let mut next = Vec::new();
            for step_id in &ready {
                for child in graph.dependents_of(step_id) {
                    if let Some(degree) = in_degree.get_mut(child) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(child);
                        }
                    }
                }
            }
            next.sort_by_key(|id| graph.declaration_index(id));

            waves.push(Wave {
                index: waves.len(),
                steps: ready.iter().map(|id| (*id).to_string()).collect(),
            });
            ready = next;
        }

        debug_assert_eq!(
            waves.iter().map(Wave::len).sum::<usize>(),
            graph.len(),
            "validated plan graphs are acyclic"
        );

        waves
    }

    /// Flattened execution order implied by the waves.
    pub fn execution_order(waves: &[Wave]) -> Vec<&str> {
        waves
            .iter()
            .flat_map(|wave| wave.steps.iter().map(String::as_str))
            .collect()
    }
}

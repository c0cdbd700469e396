use crate::error::PlanError;
use crate::planner::ToolStep;
use std::collections::{BTreeMap, BTreeSet, btree_set};

/// Lookup of tool identifiers a plan is allowed to reference.
pub trait ToolCatalog {
    fn has_tool(&self, name: &str) -> bool;
}

impl ToolCatalog for BTreeSet<String> {
    fn has_tool(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl ToolCatalog for [&str] {
    fn has_tool(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

/// Validated, acyclic dependency graph of a plan.
///
/// Edge `a -> b` means `b` consumes `a`'s output or declares `a` in
/// `depends_on`. Immutable once built.
#[derive(Debug, Clone)]
pub struct PlanGraph {
    steps: Vec<ToolStep>,
    index: BTreeMap<String, usize>,
    dependencies: BTreeMap<String, BTreeSet<String>>,
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl PlanGraph {
    pub fn validate<C>(steps: Vec<ToolStep>, tools: &C) -> Result<Self, PlanError>
    where
        C: ToolCatalog + ?Sized,
    {
        let index = index_steps(&steps)?;

        let mut dependencies = BTreeMap::new();
        let mut dependents = BTreeMap::new();
        for step in &steps {
            dependencies.insert(step.id.clone(), BTreeSet::new());
            dependents.insert(step.id.clone(), BTreeSet::new());
        }

        for step in &steps {
            if !tools.has_tool(&step.tool) {
                return Err(PlanError::UnknownTool {
                    step: step.id.clone(),
                    tool: step.tool.clone(),
                });
            }

            for reference in step.referenced_steps() {
                if reference == step.id {
                    return Err(PlanError::SelfReference {
                        step: step.id.clone(),
                    });
                }
                if !index.contains_key(reference) {
                    return Err(PlanError::UnknownStep {
                        step: step.id.clone(),
                        reference: reference.to_string(),
                    });
                }

                if let Some(parents) = dependencies.get_mut(&step.id) {
                    parents.insert(reference.to_string());
                }
                if let Some(children) = dependents.get_mut(reference) {
                    children.insert(step.id.clone());
                }
            }
        }

        validate_cycle_free(&steps, &dependents)?;

        Ok(Self {
            steps,
            index,
            dependencies,
            dependents,
        })
    }

    /// Steps in plan declaration order.
    pub fn steps(&self) -> &[ToolStep] {
        &self.steps
    }

    pub fn step(&self, id: &str) -> Option<&ToolStep> {
        self.index.get(id).map(|index| &self.steps[*index])
    }

    pub fn declaration_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Direct predecessors of `id`.
    pub fn dependencies_of(&self, id: &str) -> impl Iterator<Item = &str> {
        self.dependencies
            .get(id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Direct successors of `id`.
    pub fn dependents_of(&self, id: &str) -> impl Iterator<Item = &str> {
        self.dependents
            .get(id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(BTreeSet::len).sum()
    }
}

fn index_steps(steps: &[ToolStep]) -> Result<BTreeMap<String, usize>, PlanError> {
    let mut index = BTreeMap::new();

    for (position, step) in steps.iter().enumerate() {
        if step.id.trim().is_empty() {
            return Err(PlanError::EmptyStepId { index: position });
        }

        if index.insert(step.id.clone(), position).is_some() {
            return Err(PlanError::DuplicateStepId(step.id.clone()));
        }
    }

    Ok(index)
}

fn validate_cycle_free(
    steps: &[ToolStep],
    adjacency: &BTreeMap<String, BTreeSet<String>>,
) -> Result<(), PlanError> {
    let mut states = BTreeMap::new();

    for step in steps {
        if states.contains_key(step.id.as_str()) {
            continue;
        }

        if let Some(cycle) = detect_cycle(&step.id, adjacency, &mut states) {
            return Err(PlanError::CyclicDependency { cycle });
        }
    }

    Ok(())
}

/// Depth-first walk from `root` on an explicit frame stack, so chain depth
/// is bounded by heap rather than thread stack. The open frames are the
/// current path; meeting a `Visiting` node closes a cycle along it.
fn detect_cycle<'a>(
    root: &'a str,
    adjacency: &'a BTreeMap<String, BTreeSet<String>>,
    states: &mut BTreeMap<&'a str, NodeState>,
) -> Option<Vec<String>> {
    let mut frames: Vec<(&'a str, Option<btree_set::Iter<'a, String>>)> = Vec::new();
    states.insert(root, NodeState::Visiting);
    frames.push((root, adjacency.get(root).map(BTreeSet::iter)));

    loop {
        let (node_id, next) = match frames.last_mut() {
            Some((node_id, neighbors)) => (*node_id, neighbors.as_mut().and_then(Iterator::next)),
            None => return None,
        };

        let Some(neighbor) = next else {
            states.insert(node_id, NodeState::Visited);
            frames.pop();
            continue;
        };

        match states.get(neighbor.as_str()) {
            Some(NodeState::Visiting) => {
                let start = frames
                    .iter()
                    .position(|(id, _)| *id == neighbor.as_str())
                    .unwrap_or(0);
                let mut cycle = frames[start..]
                    .iter()
                    .map(|(id, _)| (*id).to_string())
                    .collect::<Vec<_>>();
                cycle.push(neighbor.clone());
                return Some(cycle);
            }
            Some(NodeState::Visited) => {}
            None => {
                states.insert(neighbor.as_str(), NodeState::Visiting);
                frames.push((neighbor.as_str(), adjacency.get(neighbor).map(BTreeSet::iter)));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Visiting,
    Visited,
}

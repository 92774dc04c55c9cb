//! Attribute dependency graph.
//!
//! Nodes are `(item, attribute)` pairs. An edge `B -> A` means A has a
//! modifier whose magnitude reads B, so B must be resolved first. The
//! calculator only ever walks the part of the graph a query needs, so a
//! cycle elsewhere in the fit does not poison unrelated attributes.

use crate::error::DataIntegrityError;
use crate::item::AttrKey;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A directed graph of attribute dependencies.
///
/// # Examples
///
/// ```rust
/// use fitcalc::graph::AttrGraph;
/// use fitcalc::item::{AttrKey, ItemKey};
///
/// let bonus = AttrKey::new(ItemKey(0), "shipBonusAF");
/// let resist = AttrKey::new(ItemKey(0), "armorEmDamageResonance");
///
/// let mut graph = AttrGraph::new();
/// // The resonance depends on the ship bonus.
/// graph.add_edge(resist.clone(), bonus.clone());
///
/// let order = graph.topological_sort().unwrap();
/// assert_eq!(order, vec![bonus, resist]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AttrGraph {
    graph: DiGraph<AttrKey, ()>,
    node_map: HashMap<AttrKey, NodeIndex>,
}

impl AttrGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if it is not already present and return its index.
    pub fn add_node(&mut self, key: AttrKey) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&key) {
            idx
        } else {
            let idx = self.graph.add_node(key.clone());
            self.node_map.insert(key, idx);
            idx
        }
    }

    /// `dependent` reads `dependency`. Both nodes are added if missing.
    pub fn add_edge(&mut self, dependent: AttrKey, dependency: AttrKey) {
        let from = self.add_node(dependent);
        let to = self.add_node(dependency);
        if !self.graph.contains_edge(to, from) {
            self.graph.add_edge(to, from, ());
        }
    }

    pub fn contains_node(&self, key: &AttrKey) -> bool {
        self.node_map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Find a cycle, reporting its path closed on the starting node.
    pub fn detect_cycles(&self) -> Result<(), DataIntegrityError> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();

        for node in self.graph.node_indices() {
            if !visited.contains(&node) {
                let mut path = Vec::new();
                if let Some(cycle) = self.dfs_cycle(node, &mut visited, &mut on_stack, &mut path) {
                    return Err(cycle);
                }
            }
        }
        Ok(())
    }

    fn dfs_cycle(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        on_stack: &mut HashSet<NodeIndex>,
        path: &mut Vec<AttrKey>,
    ) -> Option<DataIntegrityError> {
        visited.insert(node);
        on_stack.insert(node);
        path.push(self.graph[node].clone());

        for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if !visited.contains(&next) {
                if let Some(cycle) = self.dfs_cycle(next, visited, on_stack, path) {
                    return Some(cycle);
                }
            } else if on_stack.contains(&next) {
                let start_key = &self.graph[next];
                let start = path.iter().position(|k| k == start_key).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(start_key.clone());
                return Some(DataIntegrityError::Cycle { path: cycle });
            }
        }

        on_stack.remove(&node);
        path.pop();
        None
    }

    /// Resolution order: dependencies before dependents.
    pub fn topological_sort(&self) -> Result<Vec<AttrKey>, DataIntegrityError> {
        self.detect_cycles()?;

        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(cycle) => Err(DataIntegrityError::Cycle {
                path: vec![self.graph[cycle.node_id()].clone()],
            }),
        }
    }

    /// The targets plus everything they transitively depend on.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fitcalc::graph::AttrGraph;
    /// use fitcalc::item::{AttrKey, ItemKey};
    ///
    /// let skill_bonus = AttrKey::new(ItemKey(5), "velocityBonus");
    /// let velocity = AttrKey::new(ItemKey(0), "maxVelocity");
    /// let unrelated = AttrKey::new(ItemKey(0), "agility");
    ///
    /// let mut graph = AttrGraph::new();
    /// graph.add_edge(velocity.clone(), skill_bonus.clone());
    /// graph.add_node(unrelated.clone());
    ///
    /// let sub = graph.subgraph_for_targets(&[velocity.clone()]);
    /// assert!(sub.contains_node(&velocity));
    /// assert!(sub.contains_node(&skill_bonus));
    /// assert!(!sub.contains_node(&unrelated));
    /// ```
    pub fn subgraph_for_targets(&self, targets: &[AttrKey]) -> AttrGraph {
        let mut subgraph = AttrGraph::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<AttrKey> = targets.to_vec();

        while let Some(key) = stack.pop() {
            if !visited.insert(key.clone()) {
                continue;
            }
            let Some(&idx) = self.node_map.get(&key) else {
                continue;
            };
            subgraph.add_node(key.clone());

            for dep_idx in self.graph.neighbors_directed(idx, Direction::Incoming) {
                let dep = self.graph[dep_idx].clone();
                subgraph.add_edge(key.clone(), dep.clone());
                if !visited.contains(&dep) {
                    stack.push(dep);
                }
            }
        }

        subgraph
    }
}

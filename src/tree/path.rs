//! Passive Pathfinding
//!
//! Multi-source BFS from the allocated set to a target node. Path cost is the
//! number of newly allocated nodes; node weights only drive value scoring.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use super::{NodeType, SkillGraph, VALUABLE_WEIGHT};

/// Per-node breakdown of a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetail {
    pub id: u32,
    pub name: String,
    pub node_type: NodeType,
    pub weight: u32,
}

/// Outcome of a shortest-path query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub found: bool,
    pub already_allocated: bool,
    /// New nodes in travel order; the target is last
    pub path: Vec<u32>,
    pub cost: usize,
    pub total_weight: u32,
    pub efficiency: f64,
    pub detour_nodes: Vec<u32>,
    pub valuable_nodes: Vec<u32>,
    pub node_details: Vec<NodeDetail>,
}

impl PathResult {
    fn not_found() -> Self {
        Self::default()
    }

    fn allocated() -> Self {
        Self {
            found: true,
            already_allocated: true,
            ..Self::default()
        }
    }
}

/// Kind of node a suggestion leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Keystone,
    Notable,
}

impl SuggestionCategory {
    pub fn priority(&self) -> u32 {
        match self {
            SuggestionCategory::Keystone => 10,
            SuggestionCategory::Notable => 5,
        }
    }
}

impl fmt::Display for SuggestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionCategory::Keystone => write!(f, "keystone"),
            SuggestionCategory::Notable => write!(f, "notable"),
        }
    }
}

/// A ranked route to a missing keystone or notable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSuggestion {
    pub target_node_id: u32,
    pub target_node_name: String,
    pub category: SuggestionCategory,
    pub path: Vec<u32>,
    pub cost: usize,
    pub efficiency: f64,
    pub detour_count: usize,
    pub priority: u32,
}

/// Shortest-path queries over a [`SkillGraph`]
pub struct PathFinder<'a> {
    graph: &'a SkillGraph,
}

impl<'a> PathFinder<'a> {
    pub fn new(graph: &'a SkillGraph) -> Self {
        Self { graph }
    }

    /// Shortest path from any allocated node to `target`
    ///
    /// Allocated nodes are pre-visited and never appear in the path. An
    /// unknown target or an empty allocation yields a not-found result.
    pub fn find_shortest_path(&self, allocated: &HashSet<u32>, target: u32) -> PathResult {
        if allocated.contains(&target) {
            return PathResult::allocated();
        }
        if !self.graph.contains(target) {
            return PathResult::not_found();
        }

        // Seed in ID order so ties resolve the same way on every run
        let mut seeds: Vec<u32> = allocated
            .iter()
            .copied()
            .filter(|id| self.graph.contains(*id))
            .collect();
        seeds.sort_unstable();

        let mut visited: HashSet<u32> = allocated.clone();
        let mut parent: HashMap<u32, u32> = HashMap::new();
        let mut queue: VecDeque<u32> = seeds.into_iter().collect();

        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors(current) {
                if !visited.insert(neighbor) {
                    continue;
                }
                parent.insert(neighbor, current);
                if neighbor == target {
                    let path = reconstruct(&parent, allocated, target);
                    return self.score_path(path);
                }
                queue.push_back(neighbor);
            }
        }

        PathResult::not_found()
    }

    /// Ranked paths to missing keystones (first) and notables
    ///
    /// Every target is evaluated; unreachable or already allocated targets
    /// are dropped. Sorted by priority, then cost, then efficiency, and
    /// truncated to `max_suggestions`. Overlapping paths are not merged.
    pub fn suggest_optimal_paths(
        &self,
        allocated: &HashSet<u32>,
        missing_keystones: &[u32],
        missing_notables: &[u32],
        max_suggestions: usize,
    ) -> Vec<PathSuggestion> {
        let targets = missing_keystones
            .iter()
            .map(|id| (*id, SuggestionCategory::Keystone))
            .chain(missing_notables.iter().map(|id| (*id, SuggestionCategory::Notable)));

        let mut suggestions: Vec<PathSuggestion> = targets
            .filter_map(|(target, category)| {
                let result = self.find_shortest_path(allocated, target);
                if !result.found || result.already_allocated {
                    return None;
                }
                Some(PathSuggestion {
                    target_node_id: target,
                    target_node_name: self.graph.node_name(target),
                    category,
                    detour_count: result.detour_nodes.len(),
                    path: result.path,
                    cost: result.cost,
                    efficiency: result.efficiency,
                    priority: category.priority(),
                })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.cost.cmp(&b.cost))
                .then_with(|| b.efficiency.total_cmp(&a.efficiency))
        });
        suggestions.truncate(max_suggestions);

        tracing::debug!("Path suggestions: {}", suggestions.len());
        suggestions
    }

    fn score_path(&self, path: Vec<u32>) -> PathResult {
        let mut total_weight = 0;
        let mut detour_nodes = Vec::new();
        let mut valuable_nodes = Vec::new();
        let mut node_details = Vec::with_capacity(path.len());

        for &id in &path {
            let Some(node) = self.graph.get(id) else {
                continue;
            };
            let weight = node.weight();
            total_weight += weight;

            if node.is_detour() {
                detour_nodes.push(id);
            } else if weight >= VALUABLE_WEIGHT {
                valuable_nodes.push(id);
            }

            node_details.push(NodeDetail {
                id,
                name: node.name.clone(),
                node_type: node.node_type,
                weight,
            });
        }

        let cost = path.len();
        let efficiency = if cost > 0 {
            total_weight as f64 / cost as f64
        } else {
            0.0
        };

        PathResult {
            found: true,
            already_allocated: false,
            path,
            cost,
            total_weight,
            efficiency,
            detour_nodes,
            valuable_nodes,
            node_details,
        }
    }
}

/// Walk parents back from the target, stopping at the allocated set
fn reconstruct(parent: &HashMap<u32, u32>, allocated: &HashSet<u32>, target: u32) -> Vec<u32> {
    let mut path = vec![target];
    let mut current = target;
    while let Some(&prev) = parent.get(&current) {
        if allocated.contains(&prev) {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

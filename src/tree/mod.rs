//! Passive Skill Graph
//!
//! Node map plus undirected adjacency built from the skill-tree reference
//! payload. Nodes are indexed by ID in a `HashMap` and mirrored into a
//! petgraph `UnGraph` for traversal.
//!
//! This module is shared between:
//! - Extraction (keystone/notable subsets, cluster socket kinds)
//! - Comparison (missing node classification, path suggestions)

pub mod classify;
pub mod path;

pub use classify::{classify_node_type, cluster_size_of, NodeBuckets};
pub use path::{NodeDetail, PathFinder, PathResult, PathSuggestion, SuggestionCategory};

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::error::{BuildError, Result};
use crate::model::SocketKind;

/// Node IDs at or above this value are treated as ascendancy nodes.
///
/// Heuristic range check shared by the extractor and the classifier; the
/// payload does not give an authoritative flag for every revision.
pub const ASCENDANCY_NODE_THRESHOLD: u32 = 60_000;

// =============================================================================
// Node Types
// =============================================================================

/// Classification of a passive node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Keystone,
    Notable,
    JewelSocket,
    Mastery,
    Ascendancy,
    SmallPassive,
    ClassStart,
}

impl NodeType {
    /// Path-value weight of the node type
    pub fn base_weight(&self) -> u32 {
        match self {
            NodeType::Keystone => 100,
            NodeType::Ascendancy => 80,
            NodeType::Notable => 50,
            NodeType::Mastery => 40,
            NodeType::JewelSocket => 30,
            NodeType::SmallPassive => 1,
            NodeType::ClassStart => 0,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeType::Keystone => "keystone",
            NodeType::Notable => "notable",
            NodeType::JewelSocket => "jewel_socket",
            NodeType::Mastery => "mastery",
            NodeType::Ascendancy => "ascendancy",
            NodeType::SmallPassive => "small_passive",
            NodeType::ClassStart => "class_start",
        };
        write!(f, "{}", s)
    }
}

/// Weight at or above which a node on a path counts as valuable
pub const VALUABLE_WEIGHT: u32 = 50;

/// Cluster jewel size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterSize {
    Small,
    Medium,
    Large,
}

impl ClusterSize {
    /// Size implied by the number of passive slots the socket expands into
    pub fn from_total_indices(total: u32) -> Self {
        match total {
            0..=3 => ClusterSize::Small,
            4..=6 => ClusterSize::Medium,
            _ => ClusterSize::Large,
        }
    }

    fn weight_bonus(&self) -> u32 {
        match self {
            ClusterSize::Large => 20,
            ClusterSize::Medium => 10,
            ClusterSize::Small => 0,
        }
    }

    pub fn socket_kind(&self) -> SocketKind {
        match self {
            ClusterSize::Small => SocketKind::ClusterSmall,
            ClusterSize::Medium => SocketKind::ClusterMedium,
            ClusterSize::Large => SocketKind::ClusterLarge,
        }
    }
}

/// A classified passive node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveNode {
    pub node_id: u32,
    pub name: String,
    pub node_type: NodeType,
    pub stats: Vec<String>,
    /// Connected node IDs as listed in the payload
    pub connections: Vec<u32>,
    pub is_cluster_socket: bool,
    pub cluster_size: Option<ClusterSize>,
}

impl PassiveNode {
    /// Path-value weight: type weight plus the cluster size bonus
    pub fn weight(&self) -> u32 {
        let base = self.node_type.base_weight();
        match (self.is_cluster_socket, self.cluster_size) {
            (true, Some(size)) => base + size.weight_bonus(),
            _ => base,
        }
    }

    /// Small passive without stat text, likely pure connective tissue
    pub fn is_detour(&self) -> bool {
        self.node_type == NodeType::SmallPassive && self.stats.is_empty()
    }
}

// =============================================================================
// Payload
// =============================================================================

/// Node reference in `out`/`in` lists; exports use both numbers and strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeRef {
    Id(u32),
    Text(String),
}

impl NodeRef {
    pub fn id(&self) -> Option<u32> {
        match self {
            NodeRef::Id(id) => Some(*id),
            NodeRef::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Raw node attributes from the skill-tree payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNode {
    #[serde(default, alias = "dn")]
    pub name: Option<String>,
    #[serde(default, alias = "sd")]
    pub stats: Vec<String>,
    #[serde(default)]
    pub out: Vec<NodeRef>,
    #[serde(default, rename = "in")]
    pub inbound: Vec<NodeRef>,
    #[serde(default, rename = "isKeystone", alias = "ks")]
    pub is_keystone: bool,
    #[serde(default, rename = "isNotable", alias = "not")]
    pub is_notable: bool,
    #[serde(default, rename = "isMastery", alias = "m")]
    pub is_mastery: bool,
    #[serde(default, rename = "isJewelSocket")]
    pub is_jewel_socket: bool,
    #[serde(default, rename = "classStartIndex")]
    pub class_start_index: Option<u32>,
    #[serde(default, rename = "expansionJewel")]
    pub expansion_jewel: Option<serde_json::Value>,
}

/// Skill-tree reference payload: node-ID string to node attributes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreePayload {
    #[serde(default)]
    pub nodes: HashMap<String, RawNode>,
}

// =============================================================================
// Skill Graph
// =============================================================================

/// Result of a fuzzy node search
#[derive(Debug, Clone, Serialize)]
pub struct NodeMatch {
    pub node_id: u32,
    pub name: String,
    pub node_type: NodeType,
    pub score: i64,
}

/// The passive skill graph
pub struct SkillGraph {
    graph: UnGraph<u32, ()>,
    nodes: HashMap<u32, PassiveNode>,
    node_indices: HashMap<u32, NodeIndex>,
    fingerprint: String,
}

impl fmt::Debug for SkillGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillGraph")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.graph.edge_count())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

impl SkillGraph {
    /// Parse the JSON payload and build the graph
    ///
    /// The fingerprint is the SHA-256 of the raw payload text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let payload: TreePayload = serde_json::from_str(json)?;
        let mut graph = Self::from_payload(&payload)?;
        graph.fingerprint = format!("{:x}", Sha256::digest(json.as_bytes()));
        Ok(graph)
    }

    /// Build the graph from a parsed payload
    ///
    /// Entries whose key is not numeric (e.g. the tree root) are skipped.
    /// Connections to unknown nodes are dropped.
    pub fn from_payload(payload: &TreePayload) -> Result<Self> {
        if payload.nodes.is_empty() {
            return Err(BuildError::InvalidReference(
                "skill tree payload has no nodes".to_string(),
            ));
        }

        // Sorted so that graph construction (and BFS tie-breaking) is stable
        let mut parsed: BTreeMap<u32, PassiveNode> = BTreeMap::new();
        let mut raw_by_id: BTreeMap<u32, &RawNode> = BTreeMap::new();
        for (key, raw) in &payload.nodes {
            let Ok(node_id) = key.trim().parse::<u32>() else {
                tracing::debug!("Skipping non-numeric tree node key '{}'", key);
                continue;
            };

            let is_cluster_socket = raw
                .expansion_jewel
                .as_ref()
                .map(|v| v.as_object().map(|o| !o.is_empty()).unwrap_or(false))
                .unwrap_or(false);

            let node = PassiveNode {
                node_id,
                name: raw.name.clone().unwrap_or_else(|| format!("Node {}", node_id)),
                node_type: classify_node_type(node_id, raw),
                stats: raw.stats.clone(),
                connections: raw.out.iter().filter_map(NodeRef::id).collect(),
                is_cluster_socket,
                cluster_size: if is_cluster_socket { cluster_size_of(raw) } else { None },
            };
            parsed.insert(node_id, node);
            raw_by_id.insert(node_id, raw);
        }

        if parsed.is_empty() {
            return Err(BuildError::InvalidReference(
                "skill tree payload has no numeric node IDs".to_string(),
            ));
        }

        let mut graph = UnGraph::with_capacity(parsed.len(), parsed.len() * 2);
        let mut node_indices = HashMap::with_capacity(parsed.len());
        let mut hasher = Sha256::new();

        for (id, node) in &parsed {
            node_indices.insert(*id, graph.add_node(*id));
            hasher.update(id.to_le_bytes());
            hasher.update(node.name.as_bytes());
        }

        let mut seen_edges: HashSet<(u32, u32)> = HashSet::new();
        for (&id, raw) in &raw_by_id {
            let neighbors = raw.out.iter().chain(raw.inbound.iter()).filter_map(NodeRef::id);
            for other in neighbors {
                if other == id {
                    continue;
                }
                let key = (id.min(other), id.max(other));
                if !seen_edges.insert(key) {
                    continue;
                }
                if let (Some(&a), Some(&b)) = (node_indices.get(&id), node_indices.get(&other)) {
                    graph.add_edge(a, b, ());
                    hasher.update(key.0.to_le_bytes());
                    hasher.update(key.1.to_le_bytes());
                }
            }
        }

        let fingerprint = format!("{:x}", hasher.finalize());
        tracing::info!(
            "Skill graph built: {} nodes, {} edges ({})",
            parsed.len(),
            graph.edge_count(),
            &fingerprint[..12]
        );

        Ok(Self {
            graph,
            nodes: parsed.into_iter().collect(),
            node_indices,
            fingerprint,
        })
    }

    // ========== Public API ==========

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Identifies the tree revision
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn get(&self, node_id: u32) -> Option<&PassiveNode> {
        self.nodes.get(&node_id)
    }

    pub fn contains(&self, node_id: u32) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Display name, or a placeholder for unknown nodes
    pub fn node_name(&self, node_id: u32) -> String {
        self.get(node_id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| format!("Unknown Node {}", node_id))
    }

    /// Neighbors of a node, in either edge direction
    pub fn neighbors(&self, node_id: u32) -> Vec<u32> {
        let Some(&idx) = self.node_indices.get(&node_id) else {
            return Vec::new();
        };
        self.graph
            .neighbors(idx)
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect()
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &PassiveNode> {
        self.nodes.values()
    }

    /// Search nodes by name (fuzzy), best matches first
    pub fn search(&self, query: &str, limit: usize) -> Vec<NodeMatch> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default();
        let mut results: Vec<NodeMatch> = self
            .nodes
            .values()
            .filter_map(|node| {
                matcher.fuzzy_match(&node.name, query).map(|score| NodeMatch {
                    node_id: node.node_id,
                    name: node.name.clone(),
                    node_type: node.node_type,
                    score,
                })
            })
            .collect();

        // Higher score first, then prefer more valuable nodes, then lower IDs
        results.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.node_type.base_weight().cmp(&a.node_type.base_weight()))
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        results.truncate(limit);
        results
    }

    /// Resolve a query (numeric ID, exact name, or fuzzy name) to a node ID
    pub fn resolve(&self, query: &str) -> Option<u32> {
        if let Ok(id) = query.trim().parse::<u32>() {
            if self.contains(id) {
                return Some(id);
            }
        }

        let mut exact: Vec<&PassiveNode> = self
            .nodes
            .values()
            .filter(|n| n.name.eq_ignore_ascii_case(query.trim()))
            .collect();
        if !exact.is_empty() {
            exact.sort_by_key(|n| (std::cmp::Reverse(n.weight()), n.node_id));
            return Some(exact[0].node_id);
        }

        self.search(query, 1).first().map(|m| m.node_id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Small tree used across the tree tests:
    ///
    /// ```text
    /// 1 (start) - 2 - 3 - 4 (notable)
    ///             |
    ///             5 - 6 (keystone)
    /// 7 - 8 (island, notable)
    /// ```
    pub(crate) fn sample_graph() -> SkillGraph {
        let payload = json!({
            "nodes": {
                "root": { "out": ["1"] },
                "1": { "name": "Witch Start", "classStartIndex": 3, "out": [2] },
                "2": { "name": "Intelligence", "stats": ["+10 to Intelligence"], "out": [3, 5] },
                "3": { "name": "Path", "out": [4] },
                "4": { "name": "Arcane Focus", "isNotable": true, "stats": ["20% increased Energy Shield"] },
                "5": { "name": "Spell Damage", "stats": ["8% increased Spell Damage"], "out": ["6"] },
                "6": { "name": "Chaos Inoculation", "ks": true, "stats": ["Maximum Life becomes 1"] },
                "7": { "name": "Lonely", "out": [8] },
                "8": { "name": "Island Notable", "not": true }
            }
        });
        let payload: TreePayload = serde_json::from_value(payload).unwrap();
        SkillGraph::from_payload(&payload).unwrap()
    }

    #[test]
    fn test_graph_construction() {
        let graph = sample_graph();
        assert_eq!(graph.node_count(), 8);
        assert_eq!(graph.edge_count(), 6);
        assert_eq!(graph.get(6).unwrap().node_type, NodeType::Keystone);
        assert_eq!(graph.get(1).unwrap().node_type, NodeType::ClassStart);
        assert_eq!(graph.fingerprint().len(), 64);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let graph = sample_graph();
        assert!(graph.neighbors(4).contains(&3));
        assert!(graph.neighbors(3).contains(&4));
    }

    #[test]
    fn test_resolve_by_id_and_name() {
        let graph = sample_graph();
        assert_eq!(graph.resolve("6"), Some(6));
        assert_eq!(graph.resolve("chaos inoculation"), Some(6));
        assert_eq!(graph.resolve("Arcane Foc"), Some(4));
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert!(SkillGraph::from_json_str(r#"{"nodes": {}}"#).is_err());
    }

    #[test]
    fn test_cluster_weight_bonus() {
        let node = PassiveNode {
            node_id: 10,
            name: "Large Socket".into(),
            node_type: NodeType::JewelSocket,
            stats: vec![],
            connections: vec![],
            is_cluster_socket: true,
            cluster_size: Some(ClusterSize::Large),
        };
        assert_eq!(node.weight(), 50);
    }
}

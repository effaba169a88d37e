//! Passive tree allocation

use serde::{Deserialize, Serialize};

use super::equipment::EquipmentItem;

/// Kind of jewel socket on the passive tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SocketKind {
    #[default]
    Regular,
    ClusterSmall,
    ClusterMedium,
    ClusterLarge,
}

impl SocketKind {
    pub fn is_cluster(&self) -> bool {
        !matches!(self, Self::Regular)
    }
}

/// A jewel socket referenced by the build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JewelSocket {
    pub node_id: u32,
    pub kind: SocketKind,
    /// Whether the socket node itself is allocated
    pub allocated: bool,
    /// The jewel placed in the socket, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jewel: Option<EquipmentItem>,
}

/// Allocated passive nodes and their derived subsets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassiveAllocation {
    /// Allocated node IDs, unique, in export order
    pub allocated_nodes: Vec<u32>,
    /// Keystones among the allocated nodes
    pub keystone_nodes: Vec<u32>,
    /// Notables among the allocated nodes
    pub notable_nodes: Vec<u32>,
    pub jewel_sockets: Vec<JewelSocket>,
    /// Tree planner URL
    pub tree_url: Option<String>,
    pub class_start_node: Option<u32>,
}

impl PassiveAllocation {
    pub fn total_points_used(&self) -> usize {
        self.allocated_nodes.len()
    }

    pub fn is_allocated(&self, node_id: u32) -> bool {
        self.allocated_nodes.contains(&node_id)
    }

    /// Allocated nodes as a set, for graph searches
    pub fn allocated_set(&self) -> std::collections::HashSet<u32> {
        self.allocated_nodes.iter().copied().collect()
    }

    /// Jewel sockets whose socket node is allocated
    pub fn allocated_sockets(&self) -> impl Iterator<Item = &JewelSocket> {
        self.jewel_sockets.iter().filter(|s| s.allocated)
    }

    /// Whether the keystone and notable subsets only contain allocated nodes
    pub fn subsets_consistent(&self) -> bool {
        let allocated = self.allocated_set();
        self.keystone_nodes
            .iter()
            .chain(self.notable_nodes.iter())
            .all(|id| allocated.contains(id))
    }
}

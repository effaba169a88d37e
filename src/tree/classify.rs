//! Node Classification
//!
//! Maps raw payload attributes to a [`NodeType`] and groups node ID lists
//! into per-type buckets.

use serde::Serialize;

use super::{ClusterSize, NodeType, RawNode, SkillGraph, ASCENDANCY_NODE_THRESHOLD};

/// Classify a raw node
///
/// Precedence: keystone, notable, mastery, jewel socket, ascendancy ID
/// range, class start, small passive.
pub fn classify_node_type(node_id: u32, raw: &RawNode) -> NodeType {
    if raw.is_keystone {
        NodeType::Keystone
    } else if raw.is_notable {
        NodeType::Notable
    } else if raw.is_mastery {
        NodeType::Mastery
    } else if raw.is_jewel_socket {
        NodeType::JewelSocket
    } else if node_id >= ASCENDANCY_NODE_THRESHOLD {
        NodeType::Ascendancy
    } else if raw.class_start_index.is_some() {
        NodeType::ClassStart
    } else {
        NodeType::SmallPassive
    }
}

/// Cluster size from `expansionJewel.totalIndices`, if the node expands
pub fn cluster_size_of(raw: &RawNode) -> Option<ClusterSize> {
    let jewel = raw.expansion_jewel.as_ref()?.as_object()?;
    if jewel.is_empty() {
        return None;
    }
    let total = jewel
        .get("totalIndices")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    Some(ClusterSize::from_total_indices(total.min(u32::MAX as u64) as u32))
}

/// Node IDs grouped by type
///
/// Class-start nodes are not bucketed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeBuckets {
    pub keystone: Vec<u32>,
    pub notable: Vec<u32>,
    pub jewel_socket: Vec<u32>,
    pub mastery: Vec<u32>,
    pub ascendancy: Vec<u32>,
    pub small_passive: Vec<u32>,
}

impl NodeBuckets {
    pub fn total(&self) -> usize {
        self.keystone.len()
            + self.notable.len()
            + self.jewel_socket.len()
            + self.mastery.len()
            + self.ascendancy.len()
            + self.small_passive.len()
    }
}

impl SkillGraph {
    /// Bucket node IDs by type, keeping input order; unknown IDs are skipped
    pub fn classify_nodes(&self, node_ids: &[u32]) -> NodeBuckets {
        let mut buckets = NodeBuckets::default();
        for &id in node_ids {
            let Some(node) = self.get(id) else {
                continue;
            };
            let bucket = match node.node_type {
                NodeType::Keystone => &mut buckets.keystone,
                NodeType::Notable => &mut buckets.notable,
                NodeType::JewelSocket => &mut buckets.jewel_socket,
                NodeType::Mastery => &mut buckets.mastery,
                NodeType::Ascendancy => &mut buckets.ascendancy,
                NodeType::SmallPassive => &mut buckets.small_passive,
                NodeType::ClassStart => continue,
            };
            bucket.push(id);
        }
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::sample_graph;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_classification_precedence() {
        assert_eq!(
            classify_node_type(1, &raw(json!({"ks": true, "not": true}))),
            NodeType::Keystone
        );
        assert_eq!(
            classify_node_type(1, &raw(json!({"isNotable": true, "isMastery": true}))),
            NodeType::Notable
        );
        assert_eq!(
            classify_node_type(61000, &raw(json!({"isJewelSocket": true}))),
            NodeType::JewelSocket
        );
        assert_eq!(classify_node_type(61000, &raw(json!({}))), NodeType::Ascendancy);
        assert_eq!(
            classify_node_type(5, &raw(json!({"classStartIndex": 0}))),
            NodeType::ClassStart
        );
        assert_eq!(classify_node_type(5, &raw(json!({}))), NodeType::SmallPassive);
    }

    #[test]
    fn test_cluster_sizes() {
        let small = raw(json!({"isJewelSocket": true, "expansionJewel": {"size": 0, "totalIndices": 3}}));
        let medium = raw(json!({"expansionJewel": {"totalIndices": 6}}));
        let large = raw(json!({"expansionJewel": {"totalIndices": 12}}));
        let plain = raw(json!({"isJewelSocket": true, "expansionJewel": {}}));

        assert_eq!(cluster_size_of(&small), Some(ClusterSize::Small));
        assert_eq!(cluster_size_of(&medium), Some(ClusterSize::Medium));
        assert_eq!(cluster_size_of(&large), Some(ClusterSize::Large));
        assert_eq!(cluster_size_of(&plain), None);
    }

    #[test]
    fn test_classify_nodes_skips_unknown() {
        let graph = sample_graph();
        let buckets = graph.classify_nodes(&[1, 2, 4, 6, 999]);
        assert_eq!(buckets.keystone, vec![6]);
        assert_eq!(buckets.notable, vec![4]);
        assert_eq!(buckets.small_passive, vec![2]);
        assert_eq!(buckets.total(), 3);
    }
}

//! Build Extraction
//!
//! Turns a decoded record tree into a [`StandardizedCharacter`].
//!
//! Only a missing `Build` record is fatal. Missing `Tree`, `Skills` or `Items`
//! sections degrade to empty sub-models and are reported through
//! [`Diagnostics`].

pub mod diagnostics;
pub mod items;
pub mod skills;

pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use items::parse_item_text;

use std::collections::{HashMap, HashSet};

use crate::error::{BuildError, Result};
use crate::model::{
    AscendancyStatus, CharacterCore, EquipmentItem, EquipmentSnapshot, JewelSocket,
    PassiveAllocation, Slot, SocketKind, StandardizedCharacter, ToolVariant,
    MAX_ASCENDANCY_POINTS,
};
use crate::record::RecordNode;
use crate::reference::ReferenceData;
use crate::tree::ASCENDANCY_NODE_THRESHOLD;

/// Item ID to item record, from `Items/Item@id`
type ItemPool<'r> = HashMap<&'r str, &'r RecordNode>;

/// Extracts canonical builds against a fixed set of reference data
pub struct BuildExtractor<'a> {
    reference: &'a ReferenceData,
}

impl<'a> BuildExtractor<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    /// Extract a build, discarding diagnostics
    pub fn extract(&self, root: &RecordNode) -> Result<StandardizedCharacter> {
        self.extract_with_diagnostics(root).map(|(character, _)| character)
    }

    /// Extract a build and return the degraded-input notes alongside it
    pub fn extract_with_diagnostics(
        &self,
        root: &RecordNode,
    ) -> Result<(StandardizedCharacter, Diagnostics)> {
        let mut diagnostics = Diagnostics::new();
        let variant = detect_variant(root);
        tracing::debug!("Detected {} export", variant);

        let build = root
            .child("Build")
            .ok_or_else(|| BuildError::structural("Build", "record not found"))?;

        let mut core = extract_core(build, &mut diagnostics);

        let items = root.child("Items");
        let pool = items.map(item_pool).unwrap_or_default();

        let passive_allocation = match root.child("Tree") {
            Some(tree) => self.extract_passives(tree, variant, &pool, &mut diagnostics),
            None => {
                diagnostics.note("Tree", DiagnosticCode::MissingTree, "no passive tree; passives left empty");
                PassiveAllocation::default()
            }
        };

        let (status, points) = ascendancy_progress(core.ascendancy.as_deref(), &passive_allocation);
        core.ascendancy_status = status;
        core.ascendancy_points = points;

        let main_socket_group = build.attr_parsed::<usize>("mainSocketGroup").unwrap_or(1);
        let skill_setup = match root.child("Skills") {
            Some(skills) => skills::extract_skill_setup(
                skills,
                main_socket_group,
                variant,
                self.reference,
                &mut diagnostics,
            ),
            None => {
                diagnostics.note("Skills", DiagnosticCode::MissingSkills, "no skills; skill setup left empty");
                Default::default()
            }
        };

        let mut equipment_snapshot = match items {
            Some(items) => extract_equipment(items, &pool, &mut diagnostics),
            None => {
                diagnostics.note("Items", DiagnosticCode::MissingItems, "no items; equipment left empty");
                EquipmentSnapshot::default()
            }
        };
        equipment_snapshot.jewels = passive_allocation
            .jewel_sockets
            .iter()
            .filter_map(|s| s.jewel.clone())
            .collect();

        let mut character = StandardizedCharacter::new(core);
        character.passive_allocation = passive_allocation;
        character.skill_setup = skill_setup;
        character.equipment_snapshot = equipment_snapshot;
        character.tool_variant = variant;

        tracing::info!(
            "Extracted {} level {} ({} passives, {} skill groups, {} items)",
            character.character_core.character_class,
            character.character_core.level,
            character.passive_allocation.total_points_used(),
            character.skill_setup.skill_groups.len(),
            character.equipment_snapshot.items.len()
        );

        Ok((character, diagnostics))
    }

    fn extract_passives(
        &self,
        tree: &RecordNode,
        variant: ToolVariant,
        pool: &ItemPool<'_>,
        diagnostics: &mut Diagnostics,
    ) -> PassiveAllocation {
        let active = tree.attr_parsed::<usize>("activeSpec").unwrap_or(1);
        let spec = tree
            .children_named("Spec")
            .nth(active.saturating_sub(1))
            .or_else(|| tree.child("Spec"));
        let Some(spec) = spec else {
            diagnostics.note("Tree", DiagnosticCode::MissingTree, "tree has no spec; passives left empty");
            return PassiveAllocation::default();
        };

        let mut allocated_nodes = Vec::new();
        let mut seen = HashSet::new();
        let node_ids = spec
            .children_named("Node")
            .filter_map(|n| n.attr_parsed::<u32>("nodeId"));
        let listed: Vec<u32> = match variant {
            ToolVariant::Community => spec
                .attr("nodes")
                .map(|list| list.split(',').filter_map(|v| v.trim().parse().ok()).collect())
                .unwrap_or_default(),
            ToolVariant::Official => Vec::new(),
        };
        for id in node_ids.chain(listed) {
            if id > 0 && seen.insert(id) {
                allocated_nodes.push(id);
            }
        }

        let tree_url = spec
            .child("URL")
            .and_then(|u| u.text.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let class_start_node = spec.attr_parsed::<u32>("classId");

        let graph = self.reference.skill_graph.as_ref();
        let (keystone_nodes, notable_nodes) = match graph {
            Some(graph) => {
                let buckets = graph.classify_nodes(&allocated_nodes);
                (buckets.keystone, buckets.notable)
            }
            None => {
                if !allocated_nodes.is_empty() {
                    diagnostics.note(
                        "Tree",
                        DiagnosticCode::SkillGraphUnavailable,
                        "skill graph unavailable; keystones and notables not classified",
                    );
                }
                (Vec::new(), Vec::new())
            }
        };

        let mut jewel_sockets = Vec::new();
        for socket in spec
            .child("Sockets")
            .into_iter()
            .flat_map(|s| s.children_named("Socket"))
        {
            let Some(node_id) = socket.attr_parsed::<u32>("nodeId") else {
                continue;
            };
            let kind = graph
                .and_then(|g| g.get(node_id))
                .and_then(|n| n.cluster_size)
                .map(|size| size.socket_kind())
                .unwrap_or(SocketKind::Regular);

            let jewel = match socket.attr("itemId").filter(|id| *id != "0") {
                Some(item_id) => {
                    let item = resolve_item(pool, item_id, &format!("Jewel {}", node_id));
                    if item.is_none() {
                        diagnostics.unknown_item("Tree", &format!("socket {}", node_id), item_id);
                    }
                    item
                }
                None => None,
            };

            jewel_sockets.push(JewelSocket {
                node_id,
                kind,
                allocated: seen.contains(&node_id),
                jewel,
            });
        }

        PassiveAllocation {
            allocated_nodes,
            keystone_nodes,
            notable_nodes,
            jewel_sockets,
            tree_url,
            class_start_node,
        }
    }
}

/// A `Calcs` record anywhere in the tree marks the community fork
pub fn detect_variant(root: &RecordNode) -> ToolVariant {
    if root.tag == "Calcs" || root.descendant("Calcs").is_some() {
        ToolVariant::Community
    } else {
        ToolVariant::Official
    }
}

fn extract_core(build: &RecordNode, diagnostics: &mut Diagnostics) -> CharacterCore {
    let level = match build.attr("level") {
        None => 1,
        Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
            diagnostics.invalid_attribute("Build", "level", raw);
            1
        }),
    }
    .clamp(1, 100);

    let class = build
        .attr("className")
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("Unknown");

    let mut core = CharacterCore::new(level, class);
    core.ascendancy = build
        .attr("ascendClassName")
        .map(str::trim)
        .filter(|a| !a.is_empty() && *a != "None")
        .map(str::to_string);
    if let Some(league) = build.attr("league").filter(|l| !l.trim().is_empty()) {
        core.league = league.to_string();
    }
    core
}

/// Status and points from allocated nodes in the ascendancy ID range
///
/// No ascendancy name, or nothing allocated, is `None`/0.
pub fn ascendancy_progress(
    ascendancy: Option<&str>,
    passives: &PassiveAllocation,
) -> (AscendancyStatus, u32) {
    if ascendancy.is_none() {
        return (AscendancyStatus::None, 0);
    }
    let count = passives
        .allocated_nodes
        .iter()
        .filter(|id| **id >= ASCENDANCY_NODE_THRESHOLD)
        .count();
    let points = (count as u32).min(MAX_ASCENDANCY_POINTS);
    (AscendancyStatus::from_node_count(count), points)
}

fn item_pool(items: &RecordNode) -> ItemPool<'_> {
    items
        .children_named("Item")
        .filter_map(|item| item.attr("id").filter(|id| !id.is_empty()).map(|id| (id, item)))
        .collect()
}

fn resolve_item(pool: &ItemPool<'_>, item_id: &str, slot: &str) -> Option<EquipmentItem> {
    pool.get(item_id)
        .map(|record| items::parse_item_text(slot, record.text_or_empty()))
}

fn extract_equipment(
    items: &RecordNode,
    pool: &ItemPool<'_>,
    diagnostics: &mut Diagnostics,
) -> EquipmentSnapshot {
    let active_set = items.attr("activeItemSet").unwrap_or("1");
    let item_set = items
        .children_named("ItemSet")
        .find(|s| s.attr("id") == Some(active_set))
        .or_else(|| items.child("ItemSet"));
    let Some(item_set) = item_set else {
        diagnostics.note("Items", DiagnosticCode::MissingItemSet, "no item set; equipment left empty");
        return EquipmentSnapshot::default();
    };

    let mut snapshot = EquipmentSnapshot::default();
    for slot_record in item_set.children_named("Slot") {
        let Some(slot_name) = slot_record.attr("name") else {
            continue;
        };
        let Some(slot) = Slot::ALL.iter().copied().find(|s| s.record_name() == slot_name) else {
            continue;
        };
        let Some(item_id) = slot_record.attr("itemId").filter(|id| !id.is_empty() && *id != "0") else {
            continue;
        };
        match resolve_item(pool, item_id, slot.record_name()) {
            Some(item) => {
                snapshot.items.insert(slot, item);
            }
            None => diagnostics.unknown_item("Items", slot_name, item_id),
        }
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_build() -> RecordNode {
        RecordNode::new("PathOfBuilding").with_child(
            RecordNode::new("Build")
                .with_attr("level", "95")
                .with_attr("className", "Witch")
                .with_attr("ascendClassName", "Elementalist"),
        )
    }

    #[test]
    fn test_missing_build_is_structural() {
        let refs = ReferenceData::default();
        let err = BuildExtractor::new(&refs)
            .extract(&RecordNode::new("PathOfBuilding"))
            .unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_empty_build_degrades() {
        let refs = ReferenceData::default();
        let (character, diags) = BuildExtractor::new(&refs)
            .extract_with_diagnostics(&minimal_build())
            .unwrap();

        assert_eq!(character.character_core.level, 95);
        assert_eq!(character.character_core.ascendancy.as_deref(), Some("Elementalist"));
        assert_eq!(character.character_core.ascendancy_status, AscendancyStatus::None);
        assert_eq!(character.character_core.ascendancy_points, 0);
        assert!(character.passive_allocation.allocated_nodes.is_empty());
        assert!(character.skill_setup.skill_groups.is_empty());
        assert!(character.equipment_snapshot.is_empty());
        assert!(diags.has(DiagnosticCode::MissingTree));
        assert!(diags.has(DiagnosticCode::MissingSkills));
        assert!(diags.has(DiagnosticCode::MissingItems));
        assert!(character.validate().is_ok());
    }

    #[test]
    fn test_ascendancy_buckets() {
        let mut passives = PassiveAllocation::default();
        passives.allocated_nodes = vec![100, 200];
        assert_eq!(ascendancy_progress(Some("Necromancer"), &passives), (AscendancyStatus::None, 0));

        passives.allocated_nodes.extend([60001, 60002, 60003]);
        assert_eq!(ascendancy_progress(Some("Necromancer"), &passives), (AscendancyStatus::Partial, 3));

        passives.allocated_nodes.extend(60004..60010);
        assert_eq!(ascendancy_progress(Some("Necromancer"), &passives), (AscendancyStatus::Complete, 8));
        assert_eq!(ascendancy_progress(None, &passives), (AscendancyStatus::None, 0));
    }

    #[test]
    fn test_level_is_clamped() {
        let root = RecordNode::new("PathOfBuilding")
            .with_child(RecordNode::new("Build").with_attr("level", "0"));
        let refs = ReferenceData::default();
        let character = BuildExtractor::new(&refs).extract(&root).unwrap();
        assert_eq!(character.character_core.level, 1);
        assert_eq!(character.character_core.character_class, "Unknown");
    }

    #[test]
    fn test_variant_detection() {
        assert_eq!(detect_variant(&minimal_build()), ToolVariant::Official);
        let community = minimal_build().with_child(RecordNode::new("Calcs"));
        assert_eq!(detect_variant(&community), ToolVariant::Community);
    }

    #[test]
    fn test_community_node_list_and_dedup() {
        let root = minimal_build()
            .with_child(RecordNode::new("Calcs"))
            .with_child(
                RecordNode::new("Tree").with_child(
                    RecordNode::new("Spec")
                        .with_attr("nodes", "10, 20,30,0,20")
                        .with_child(RecordNode::new("Node").with_attr("nodeId", "10")),
                ),
            );
        let refs = ReferenceData::default();
        let character = BuildExtractor::new(&refs).extract(&root).unwrap();
        assert_eq!(character.tool_variant, ToolVariant::Community);
        assert_eq!(character.passive_allocation.allocated_nodes, vec![10, 20, 30]);
    }

    #[test]
    fn test_active_item_set_and_unknown_reference() {
        let root = minimal_build().with_child(
            RecordNode::new("Items")
                .with_attr("activeItemSet", "2")
                .with_child(
                    RecordNode::new("Item")
                        .with_attr("id", "1")
                        .with_text("Rarity: UNIQUE\nGoldrim\nLeather Cap"),
                )
                .with_child(
                    RecordNode::new("ItemSet")
                        .with_attr("id", "1")
                        .with_child(RecordNode::new("Slot").with_attr("name", "Boots").with_attr("itemId", "1")),
                )
                .with_child(
                    RecordNode::new("ItemSet")
                        .with_attr("id", "2")
                        .with_child(RecordNode::new("Slot").with_attr("name", "Helmet").with_attr("itemId", "1"))
                        .with_child(RecordNode::new("Slot").with_attr("name", "Gloves").with_attr("itemId", "9")),
                ),
        );
        let refs = ReferenceData::default();
        let (character, diags) = BuildExtractor::new(&refs).extract_with_diagnostics(&root).unwrap();

        let helmet = character.equipment_snapshot.get(Slot::Helmet).unwrap();
        assert_eq!(helmet.name, "Goldrim");
        assert_eq!(helmet.base_type, "Leather Cap");
        assert!(character.equipment_snapshot.get(Slot::Boots).is_none());
        assert!(character.equipment_snapshot.get(Slot::Gloves).is_none());
        assert!(diags.has(DiagnosticCode::UnknownItemReference));
    }
}

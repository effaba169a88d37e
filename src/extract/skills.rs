//! Skill Setup Extraction

use crate::model::{Gem, QualityVariant, SkillGroup, SkillSetup, ToolVariant};
use crate::record::RecordNode;
use crate::reference::ReferenceData;

use super::diagnostics::{DiagnosticCode, Diagnostics};

const SECTION: &str = "Skills";

/// Walk `Skills/SkillSet/Skill` (or `Skills/Skill`) and resolve the main group
///
/// `main_socket_group` is the 1-based index from `Build@mainSocketGroup`.
pub(crate) fn extract_skill_setup(
    skills: &RecordNode,
    main_socket_group: usize,
    variant: ToolVariant,
    reference: &ReferenceData,
    diagnostics: &mut Diagnostics,
) -> SkillSetup {
    let skill_records: Vec<&RecordNode> = if skills.child("SkillSet").is_some() {
        skills
            .children_named("SkillSet")
            .flat_map(|set| set.children_named("Skill"))
            .collect()
    } else {
        skills.children_named("Skill").collect()
    };

    let mut skill_groups = Vec::with_capacity(skill_records.len());
    for (i, skill) in skill_records.iter().enumerate() {
        let label = skill
            .attr("label")
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Group {}", i + 1));
        let slot = skill.attr("slot").unwrap_or("Unknown");
        let enabled = skill.attr_bool("enabled", true);

        let gems = skill
            .children_named("Gem")
            .map(|g| extract_gem(g, variant, reference, diagnostics))
            .collect();

        skill_groups.push(SkillGroup::new(label, slot, enabled, gems));
    }

    let has_gems = skill_groups.iter().any(|g| !g.gems.is_empty());
    if has_gems && reference.gems.is_none() {
        diagnostics.note(
            SECTION,
            DiagnosticCode::GemTableUnavailable,
            "gem table unavailable; support gems detected by identifier and name",
        );
    }

    let main_group_index = resolve_main_group(&skill_groups, main_socket_group);
    if let Some(index) = main_group_index {
        tracing::debug!(
            "Main skill group {} ({:?}, {} links)",
            index + 1,
            skill_groups[index].main_skill,
            skill_groups[index].link_count
        );
    }

    SkillSetup {
        skill_groups,
        main_group_index,
    }
}

/// The declared group when it is enabled and has an active skill, else the
/// enabled group with the most links (first wins on ties)
pub(crate) fn resolve_main_group(groups: &[SkillGroup], main_socket_group: usize) -> Option<usize> {
    let declared = main_socket_group.checked_sub(1);
    if let Some(index) = declared {
        if let Some(group) = groups.get(index) {
            if group.enabled && group.main_skill.is_some() {
                return Some(index);
            }
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (index, group) in groups.iter().enumerate() {
        if !group.enabled || group.main_skill.is_none() {
            continue;
        }
        match best {
            Some((_, links)) if links >= group.link_count => {}
            _ => best = Some((index, group.link_count)),
        }
    }
    best.map(|(index, _)| index)
}

fn extract_gem(
    record: &RecordNode,
    variant: ToolVariant,
    reference: &ReferenceData,
    diagnostics: &mut Diagnostics,
) -> Gem {
    let name = match variant {
        ToolVariant::Official => record.attr("nameSpec"),
        ToolVariant::Community => record.attr_any(&["nameSpec", "name"]),
    }
    .filter(|n| !n.trim().is_empty())
    .unwrap_or("Unknown")
    .to_string();

    let gem_id = record.attr_any(&["gemId", "skillId"]);
    let is_support = reference.is_support_gem(&name, gem_id);

    let mut gem = if is_support {
        Gem::support(name)
    } else {
        Gem::active(name)
    };
    gem.is_awakened = gem.name.contains("Awakened");

    gem = gem
        .with_level(numeric_attr(record, "level", 1, diagnostics))
        .with_quality(numeric_attr(record, "quality", 0, diagnostics));
    gem.enabled = record.attr_bool("enabled", true);
    gem.quality_variant = record
        .attr("qualityId")
        .map(QualityVariant::from_quality_id)
        .unwrap_or_default();
    gem.experience_percent = record.attr_parsed::<f64>("experience");
    gem
}

fn numeric_attr(record: &RecordNode, key: &str, default: u32, diagnostics: &mut Diagnostics) -> u32 {
    match record.attr(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            diagnostics.invalid_attribute(SECTION, key, raw);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gem(name: &str) -> RecordNode {
        RecordNode::new("Gem").with_attr("nameSpec", name)
    }

    fn skill(slot: &str, gems: &[&str]) -> RecordNode {
        gems.iter()
            .fold(RecordNode::new("Skill").with_attr("slot", slot), |s, g| s.with_child(gem(g)))
    }

    #[test]
    fn test_declared_main_group() {
        let skills = RecordNode::new("Skills").with_child(
            RecordNode::new("SkillSet")
                .with_child(skill("Helmet", &["Hatred", "Enlighten Support"]))
                .with_child(skill("Body Armour", &["Arc", "Spell Echo Support", "Controlled Destruction Support", "Inspiration Support"])),
        );
        let mut diags = Diagnostics::new();
        let setup = extract_skill_setup(&skills, 1, ToolVariant::Official, &ReferenceData::default(), &mut diags);

        assert_eq!(setup.skill_groups.len(), 2);
        assert_eq!(setup.main_group_index, Some(0));
        assert_eq!(setup.skill_groups[1].link_count, 4);
        assert_eq!(setup.skill_groups[1].support_gems.len(), 3);
        assert!(diags.has(DiagnosticCode::GemTableUnavailable));
    }

    #[test]
    fn test_fallback_to_most_links() {
        let skills = RecordNode::new("Skills")
            .with_child(skill("Helmet", &["Enlighten Support"]))
            .with_child(skill("Gloves", &["Frostbite", "Blasphemy Support"]))
            .with_child(skill("Body Armour", &["Arc", "Spell Echo Support", "Inspiration Support"]))
            .with_child(skill("Boots", &["Storm Brand", "Spell Echo Support", "Inspiration Support"]));
        let mut diags = Diagnostics::new();
        // Group 1 has no active skill
        let setup = extract_skill_setup(&skills, 1, ToolVariant::Official, &ReferenceData::default(), &mut diags);
        assert_eq!(setup.main_group_index, Some(2));
    }

    #[test]
    fn test_gem_attributes() {
        let record = RecordNode::new("Gem")
            .with_attr("name", "Arc")
            .with_attr("level", "21")
            .with_attr("quality", "abc")
            .with_attr("qualityId", "Alternate1")
            .with_attr("enabled", "false")
            .with_attr("experience", "42.5");
        let mut diags = Diagnostics::new();

        let official = extract_gem(&record, ToolVariant::Official, &ReferenceData::default(), &mut diags);
        assert_eq!(official.name, "Unknown");

        let gem = extract_gem(&record, ToolVariant::Community, &ReferenceData::default(), &mut diags);
        assert_eq!(gem.name, "Arc");
        assert_eq!(gem.level, 21);
        assert_eq!(gem.quality, 0);
        assert!(!gem.enabled);
        assert_eq!(gem.quality_variant, QualityVariant::Anomalous);
        assert_eq!(gem.experience_percent, Some(42.5));
        assert!(diags.has(DiagnosticCode::InvalidAttribute));
    }
}

//! Equipment, sockets and item modifiers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Slots
// =============================================================================

/// Equipment slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "weapon_main_hand")]
    WeaponMainHand,
    #[serde(rename = "weapon_off_hand")]
    WeaponOffHand,
    #[serde(rename = "helmet")]
    Helmet,
    #[serde(rename = "body_armour")]
    BodyArmour,
    #[serde(rename = "gloves")]
    Gloves,
    #[serde(rename = "boots")]
    Boots,
    #[serde(rename = "amulet")]
    Amulet,
    #[serde(rename = "ring_1")]
    Ring1,
    #[serde(rename = "ring_2")]
    Ring2,
    #[serde(rename = "belt")]
    Belt,
    #[serde(rename = "flask_1")]
    Flask1,
    #[serde(rename = "flask_2")]
    Flask2,
    #[serde(rename = "flask_3")]
    Flask3,
    #[serde(rename = "flask_4")]
    Flask4,
    #[serde(rename = "flask_5")]
    Flask5,
}

impl Slot {
    pub const ALL: [Slot; 15] = [
        Slot::WeaponMainHand,
        Slot::WeaponOffHand,
        Slot::Helmet,
        Slot::BodyArmour,
        Slot::Gloves,
        Slot::Boots,
        Slot::Amulet,
        Slot::Ring1,
        Slot::Ring2,
        Slot::Belt,
        Slot::Flask1,
        Slot::Flask2,
        Slot::Flask3,
        Slot::Flask4,
        Slot::Flask5,
    ];

    /// Name used by the build export ("Body Armour")
    pub fn record_name(&self) -> &'static str {
        match self {
            Slot::WeaponMainHand => "Weapon 1",
            Slot::WeaponOffHand => "Weapon 2",
            Slot::Helmet => "Helmet",
            Slot::BodyArmour => "Body Armour",
            Slot::Gloves => "Gloves",
            Slot::Boots => "Boots",
            Slot::Amulet => "Amulet",
            Slot::Ring1 => "Ring 1",
            Slot::Ring2 => "Ring 2",
            Slot::Belt => "Belt",
            Slot::Flask1 => "Flask 1",
            Slot::Flask2 => "Flask 2",
            Slot::Flask3 => "Flask 3",
            Slot::Flask4 => "Flask 4",
            Slot::Flask5 => "Flask 5",
        }
    }

    /// Canonical snake_case key ("body_armour")
    pub fn key(&self) -> &'static str {
        match self {
            Slot::WeaponMainHand => "weapon_main_hand",
            Slot::WeaponOffHand => "weapon_off_hand",
            Slot::Helmet => "helmet",
            Slot::BodyArmour => "body_armour",
            Slot::Gloves => "gloves",
            Slot::Boots => "boots",
            Slot::Amulet => "amulet",
            Slot::Ring1 => "ring_1",
            Slot::Ring2 => "ring_2",
            Slot::Belt => "belt",
            Slot::Flask1 => "flask_1",
            Slot::Flask2 => "flask_2",
            Slot::Flask3 => "flask_3",
            Slot::Flask4 => "flask_4",
            Slot::Flask5 => "flask_5",
        }
    }

    /// Parse a record name, a canonical key or a short alias ("mainhand", "body")
    pub fn parse(name: &str) -> Option<Slot> {
        let trimmed = name.trim();
        if let Some(slot) = Slot::ALL
            .iter()
            .find(|s| s.record_name().eq_ignore_ascii_case(trimmed) || s.key() == trimmed)
        {
            return Some(*slot);
        }

        match trimmed.to_lowercase().as_str() {
            "mainhand" | "weapon" => Some(Slot::WeaponMainHand),
            "offhand" | "shield" => Some(Slot::WeaponOffHand),
            "body" => Some(Slot::BodyArmour),
            "ring1" => Some(Slot::Ring1),
            "ring2" => Some(Slot::Ring2),
            "flask1" => Some(Slot::Flask1),
            "flask2" => Some(Slot::Flask2),
            "flask3" => Some(Slot::Flask3),
            "flask4" => Some(Slot::Flask4),
            "flask5" => Some(Slot::Flask5),
            _ => None,
        }
    }

    pub fn is_flask(&self) -> bool {
        matches!(
            self,
            Slot::Flask1 | Slot::Flask2 | Slot::Flask3 | Slot::Flask4 | Slot::Flask5
        )
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.record_name())
    }
}

// =============================================================================
// Rarity & Sockets
// =============================================================================

/// Item rarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    #[default]
    Normal,
    Magic,
    Rare,
    Unique,
}

impl Rarity {
    /// Parse "RARE", "Rare", "unique", ...; unknown values yield `None`
    pub fn parse(value: &str) -> Option<Rarity> {
        match value.trim().to_uppercase().as_str() {
            "NORMAL" => Some(Rarity::Normal),
            "MAGIC" => Some(Rarity::Magic),
            "RARE" => Some(Rarity::Rare),
            "UNIQUE" | "RELIC" => Some(Rarity::Unique),
            _ => None,
        }
    }

    /// Unique and rare items carry a name line separate from their base
    pub fn is_named(&self) -> bool {
        matches!(self, Rarity::Rare | Rarity::Unique)
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rarity::Normal => write!(f, "NORMAL"),
            Rarity::Magic => write!(f, "MAGIC"),
            Rarity::Rare => write!(f, "RARE"),
            Rarity::Unique => write!(f, "UNIQUE"),
        }
    }
}

/// Socket colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketColor {
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "B")]
    Blue,
    #[serde(rename = "W")]
    White,
    #[serde(rename = "A")]
    Abyss,
}

impl SocketColor {
    pub fn from_char(c: char) -> Option<SocketColor> {
        match c.to_ascii_uppercase() {
            'R' => Some(SocketColor::Red),
            'G' => Some(SocketColor::Green),
            'B' => Some(SocketColor::Blue),
            'W' => Some(SocketColor::White),
            'A' => Some(SocketColor::Abyss),
            _ => None,
        }
    }
}

/// A run of sockets; `linked` when the sockets are connected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketGroup {
    pub colors: Vec<SocketColor>,
    pub linked: bool,
}

impl SocketGroup {
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

// =============================================================================
// Modifiers
// =============================================================================

/// Where a modifier comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Implicit,
    Explicit,
    Crafted,
    Fractured,
    Enchant,
}

/// Modifier tier: T1 is the strongest roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ModTier {
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    #[default]
    Unknown,
}

impl ModTier {
    /// Numeric rank; larger is weaker, `Unknown` sorts after every real tier
    pub fn rank(&self) -> u8 {
        match self {
            ModTier::T1 => 1,
            ModTier::T2 => 2,
            ModTier::T3 => 3,
            ModTier::T4 => 4,
            ModTier::T5 => 5,
            ModTier::T6 => 6,
            ModTier::T7 => 7,
            ModTier::Unknown => 99,
        }
    }

    pub fn from_number(n: u32) -> ModTier {
        match n {
            1 => ModTier::T1,
            2 => ModTier::T2,
            3 => ModTier::T3,
            4 => ModTier::T4,
            5 => ModTier::T5,
            6 => ModTier::T6,
            7 => ModTier::T7,
            _ => ModTier::Unknown,
        }
    }
}

impl fmt::Display for ModTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModTier::Unknown => write!(f, "T?"),
            tier => write!(f, "T{}", tier.rank()),
        }
    }
}

/// Numeric values rolled on a modifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// One modifier line on an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub text: String,
    pub kind: ModifierKind,
    #[serde(default)]
    pub tier: ModTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<ValueRange>,
}

impl Modifier {
    pub fn new(text: impl Into<String>, kind: ModifierKind) -> Self {
        Self {
            text: text.into(),
            kind,
            tier: ModTier::Unknown,
            values: None,
        }
    }

    pub fn with_tier(mut self, tier: ModTier) -> Self {
        self.tier = tier;
        self
    }
}

// =============================================================================
// Items
// =============================================================================

/// Influence and corruption flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFlags {
    pub corrupted: bool,
    pub mirrored: bool,
    pub synthesised: bool,
    pub elder: bool,
    pub shaper: bool,
    pub crusader: bool,
    pub hunter: bool,
    pub redeemer: bool,
    pub warlord: bool,
}

impl ItemFlags {
    /// Names of the influences present on the item
    pub fn influences(&self) -> Vec<&'static str> {
        [
            (self.elder, "Elder"),
            (self.shaper, "Shaper"),
            (self.crusader, "Crusader"),
            (self.hunter, "Hunter"),
            (self.redeemer, "Redeemer"),
            (self.warlord, "Warlord"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

/// A single equipped item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    /// Slot name as exported
    pub slot: String,
    pub name: String,
    pub base_type: String,
    pub rarity: Rarity,
    pub item_level: u32,
    pub quality: u32,
    pub sockets: Vec<SocketGroup>,
    pub implicit_mods: Vec<Modifier>,
    pub explicit_mods: Vec<Modifier>,
    pub crafted_mods: Vec<Modifier>,
    pub fractured_mods: Vec<Modifier>,
    pub enchant_mods: Vec<Modifier>,
    pub flags: ItemFlags,
}

impl EquipmentItem {
    /// Bare item with no sockets or modifiers
    pub fn new(slot: impl Into<String>, name: impl Into<String>, base_type: impl Into<String>, rarity: Rarity) -> Self {
        Self {
            slot: slot.into(),
            name: name.into(),
            base_type: base_type.into(),
            rarity,
            item_level: 0,
            quality: 0,
            sockets: Vec::new(),
            implicit_mods: Vec::new(),
            explicit_mods: Vec::new(),
            crafted_mods: Vec::new(),
            fractured_mods: Vec::new(),
            enchant_mods: Vec::new(),
            flags: ItemFlags::default(),
        }
    }

    pub fn total_sockets(&self) -> usize {
        self.sockets.iter().map(SocketGroup::len).sum()
    }

    /// Largest linked socket group, 0 when nothing is linked
    pub fn max_links(&self) -> usize {
        self.sockets
            .iter()
            .filter(|g| g.linked)
            .map(SocketGroup::len)
            .max()
            .unwrap_or(0)
    }

    pub fn is_influenced(&self) -> bool {
        !self.flags.influences().is_empty()
    }

    /// Implicit and explicit modifiers, the lines compared for gaps
    pub fn core_mods(&self) -> Vec<Modifier> {
        self.explicit_mods
            .iter()
            .chain(self.implicit_mods.iter())
            .cloned()
            .collect()
    }

    /// Every modifier regardless of origin
    pub fn all_mods(&self) -> impl Iterator<Item = &Modifier> {
        self.implicit_mods
            .iter()
            .chain(&self.explicit_mods)
            .chain(&self.crafted_mods)
            .chain(&self.fractured_mods)
            .chain(&self.enchant_mods)
    }
}

/// Everything the character has equipped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSnapshot {
    pub items: BTreeMap<Slot, EquipmentItem>,
    /// Jewels socketed in the passive tree
    pub jewels: Vec<EquipmentItem>,
}

impl EquipmentSnapshot {
    pub fn get(&self, slot: Slot) -> Option<&EquipmentItem> {
        self.items.get(&slot)
    }

    /// Look up an item by any slot spelling accepted by [`Slot::parse`]
    pub fn get_item_by_slot(&self, slot: &str) -> Option<&EquipmentItem> {
        Slot::parse(slot).and_then(|s| self.items.get(&s))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.jewels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_parse() {
        assert_eq!(Slot::parse("Body Armour"), Some(Slot::BodyArmour));
        assert_eq!(Slot::parse("body_armour"), Some(Slot::BodyArmour));
        assert_eq!(Slot::parse("mainhand"), Some(Slot::WeaponMainHand));
        assert_eq!(Slot::parse("Ring 2"), Some(Slot::Ring2));
        assert_eq!(Slot::parse("Weapon 1 Swap"), None);
    }

    #[test]
    fn test_socket_derivations() {
        let mut item = EquipmentItem::new("Body Armour", "Doom Shell", "Astral Plate", Rarity::Rare);
        item.sockets = vec![
            SocketGroup { colors: vec![SocketColor::Red; 4], linked: true },
            SocketGroup { colors: vec![SocketColor::Blue, SocketColor::Green], linked: true },
        ];
        assert_eq!(item.total_sockets(), 6);
        assert_eq!(item.max_links(), 4);

        item.sockets = vec![SocketGroup { colors: vec![SocketColor::Red], linked: false }];
        assert_eq!(item.max_links(), 0);
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(ModTier::T2.to_string(), "T2");
        assert_eq!(ModTier::Unknown.rank(), 99);
        assert_eq!(ModTier::from_number(9), ModTier::Unknown);
    }
}

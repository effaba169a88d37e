//! Item Text Parsing
//!
//! Items are exported as a clipboard-style text block:
//!
//! ```text
//! Rarity: RARE
//! Doom Shell
//! Vaal Regalia
//! Item Level: 86
//! Quality: +20%
//! Sockets: B-B-B-B-B-G
//! Implicits: 1
//! {crafted}+15% to all Elemental Resistances
//! {tier:1}+98 to maximum Energy Shield
//! Shaper Item
//! ```

use regex::Regex;
use std::sync::OnceLock;

use crate::model::{
    EquipmentItem, ItemFlags, ModTier, Modifier, ModifierKind, Rarity, SocketColor, SocketGroup,
    ValueRange,
};

fn metadata_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z ]*:(\s|$)").expect("valid pattern"))
}

fn brace_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([a-zA-Z]+)(?::([^}]*))?\}").expect("valid pattern"))
}

fn number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid pattern"))
}

/// Parse one item text block into an [`EquipmentItem`] bound to `slot`
pub fn parse_item_text(slot: &str, text: &str) -> EquipmentItem {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let rarity = lines
        .iter()
        .find_map(|l| strip_key(l, "Rarity"))
        .and_then(Rarity::parse)
        .unwrap_or(Rarity::Normal);

    let body: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| strip_key(l, "Rarity").is_none())
        .collect();

    let name = body.first().copied().unwrap_or("").to_string();
    let (base_type, header_len) = base_type_of(&body, &name, rarity);

    let mut item = EquipmentItem::new(slot, name, base_type, rarity);
    parse_body(&mut item, &body[header_len.min(body.len())..]);
    item
}

/// Base type and the number of leading body lines it consumed
fn base_type_of(body: &[&str], name: &str, rarity: Rarity) -> (String, usize) {
    let Some(first) = body.first() else {
        return (String::new(), 0);
    };

    if rarity.is_named() && !name.is_empty() {
        if let Some(pos) = body.iter().position(|l| *l == name) {
            if let Some(base) = body.get(pos + 1).filter(|l| !metadata_line().is_match(l)) {
                return (base.to_string(), pos + 2);
            }
        }
        return (first.to_string(), 1);
    }

    (first.to_string(), 1)
}

fn parse_body(item: &mut EquipmentItem, lines: &[&str]) {
    let mut implicits_left: Option<usize> = None;

    for line in lines {
        if let Some(value) = strip_key(line, "Item Level") {
            item.item_level = value.parse().unwrap_or(0);
            continue;
        }
        if let Some(value) = strip_key(line, "Quality") {
            item.quality = parse_quality(value);
            continue;
        }
        if let Some(value) = strip_key(line, "Sockets") {
            item.sockets = parse_sockets(value);
            continue;
        }
        if let Some(value) = strip_key(line, "Implicits") {
            implicits_left = Some(value.parse().unwrap_or(0));
            continue;
        }
        if apply_flag(&mut item.flags, line) || metadata_line().is_match(line) {
            continue;
        }

        let in_implicits = matches!(implicits_left, Some(n) if n > 0);
        let modifier = parse_modifier(line, in_implicits);
        if let Some(n) = implicits_left.as_mut() {
            *n = n.saturating_sub(1);
        }
        match modifier.kind {
            ModifierKind::Implicit => item.implicit_mods.push(modifier),
            ModifierKind::Explicit => item.explicit_mods.push(modifier),
            ModifierKind::Crafted => item.crafted_mods.push(modifier),
            ModifierKind::Fractured => item.fractured_mods.push(modifier),
            ModifierKind::Enchant => item.enchant_mods.push(modifier),
        }
    }
}

/// Parse a modifier line, stripping `{...}` markers
pub fn parse_modifier(line: &str, implicit: bool) -> Modifier {
    let mut kind = if implicit {
        ModifierKind::Implicit
    } else {
        ModifierKind::Explicit
    };
    let mut tier = ModTier::Unknown;

    for caps in brace_tag().captures_iter(line) {
        match caps.get(1).map(|m| m.as_str()) {
            Some("crafted") if !implicit => kind = ModifierKind::Crafted,
            Some("fractured") if !implicit => kind = ModifierKind::Fractured,
            Some("enchant") => kind = ModifierKind::Enchant,
            Some("tier") => {
                if let Some(n) = caps.get(2).and_then(|v| v.as_str().trim().parse().ok()) {
                    tier = ModTier::from_number(n);
                }
            }
            _ => {}
        }
    }

    let text = brace_tag().replace_all(line, "").trim().to_string();
    let values = parse_values(&text);

    Modifier {
        text,
        kind,
        tier,
        values,
    }
}

/// First one or two numbers of a modifier ("Adds 10 to 20 ...")
fn parse_values(text: &str) -> Option<ValueRange> {
    let mut numbers = number()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok());
    let min = numbers.next()?;
    let max = numbers.next().unwrap_or(min);
    Some(ValueRange { min, max })
}

fn parse_quality(value: &str) -> u32 {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u32>().map(|q| q.min(50)).unwrap_or(0)
}

/// "R-G-B B" => one linked group of three and a lone socket
pub fn parse_sockets(value: &str) -> Vec<SocketGroup> {
    value
        .split_whitespace()
        .filter_map(|group| {
            let colors: Vec<SocketColor> = group
                .split('-')
                .filter_map(|s| s.chars().next())
                .filter_map(SocketColor::from_char)
                .collect();
            if colors.is_empty() {
                None
            } else {
                let linked = colors.len() > 1;
                Some(SocketGroup { colors, linked })
            }
        })
        .collect()
}

fn apply_flag(flags: &mut ItemFlags, line: &str) -> bool {
    let flag = match line {
        "Corrupted" => &mut flags.corrupted,
        "Mirrored" => &mut flags.mirrored,
        "Synthesised Item" => &mut flags.synthesised,
        "Elder Item" => &mut flags.elder,
        "Shaper Item" => &mut flags.shaper,
        "Crusader Item" => &mut flags.crusader,
        "Hunter Item" => &mut flags.hunter,
        "Redeemer Item" => &mut flags.redeemer,
        "Warlord Item" => &mut flags.warlord,
        _ => return false,
    };
    *flag = true;
    true
}

/// Value of a `Key: value` line, case-insensitive on the key
fn strip_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (head, rest) = line.split_once(':')?;
    head.trim().eq_ignore_ascii_case(key).then(|| rest.trim())
}

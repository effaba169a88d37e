//! Diagnostics
//!
//! Collects degraded-input notes during extraction. None of these stop an
//! extraction; structural failures are returned as errors instead.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Sections ===
    /// No `Tree` record; passives left empty
    MissingTree,
    /// No `Skills` record; skill setup left empty
    MissingSkills,
    /// No `Items` record; equipment left empty
    MissingItems,
    /// `Items` present but no item set
    MissingItemSet,

    // === References ===
    /// Slot or socket points at an item ID not in the pool
    UnknownItemReference,
    /// Attribute present but not parseable; default used
    InvalidAttribute,

    // === Reference Data ===
    /// Support classification fell back to heuristics
    GemTableUnavailable,
    /// Keystone/notable subsets and socket kinds not classified
    SkillGraphUnavailable,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTree => "W001",
            Self::MissingSkills => "W002",
            Self::MissingItems => "W003",
            Self::MissingItemSet => "W004",
            Self::UnknownItemReference => "W005",
            Self::InvalidAttribute => "W006",
            Self::GemTableUnavailable => "I001",
            Self::SkillGraphUnavailable => "I002",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingTree
            | Self::MissingSkills
            | Self::MissingItems
            | Self::MissingItemSet
            | Self::UnknownItemReference
            | Self::InvalidAttribute => Severity::Warning,

            Self::GemTableUnavailable | Self::SkillGraphUnavailable => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Record section the note refers to ("Tree", "Items", ...)
    pub section: String,
    pub code: DiagnosticCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(section: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.section
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from one extraction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an item and mirror it to the log
    pub fn push(&mut self, item: DiagnosticItem) {
        match item.severity() {
            Severity::Warning => tracing::warn!("{}: {}", item.section, item.message),
            Severity::Info => tracing::info!("{}: {}", item.section, item.message),
        }
        self.items.push(item);
    }

    pub fn note(&mut self, section: &str, code: DiagnosticCode, message: impl Into<String>) {
        self.push(DiagnosticItem::new(section, code, message));
    }

    /// Slot or socket referencing an item that is not in the pool
    pub fn unknown_item(&mut self, section: &str, owner: &str, item_id: &str) {
        self.push(
            DiagnosticItem::new(
                section,
                DiagnosticCode::UnknownItemReference,
                format!("'{}' references unknown item {}", owner, item_id),
            )
            .with_context(format!("Item ID: {}", item_id)),
        );
    }

    /// Attribute that failed to parse
    pub fn invalid_attribute(&mut self, section: &str, key: &str, value: &str) {
        self.push(
            DiagnosticItem::new(
                section,
                DiagnosticCode::InvalidAttribute,
                format!("attribute '{}' has unparseable value '{}'", key, value),
            ),
        );
    }

    pub fn has(&self, code: DiagnosticCode) -> bool {
        self.items.iter().any(|i| i.code == code)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if !self.is_empty() {
            output.push_str(&format!(
                "\n{} note(s), {} warning(s)\n",
                self.len(),
                self.warning_count()
            ));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_severity() {
        assert_eq!(DiagnosticCode::MissingTree.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::GemTableUnavailable.severity(), Severity::Info);
    }

    #[test]
    fn test_diagnostics_collection() {
        let mut diags = Diagnostics::new();
        diags.note("Tree", DiagnosticCode::MissingTree, "no passive tree");
        diags.note("Skills", DiagnosticCode::GemTableUnavailable, "heuristic support detection");
        diags.unknown_item("Items", "Helmet", "42");

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.warning_count(), 2);
        assert!(diags.has(DiagnosticCode::UnknownItemReference));
        assert!(diags.format_all().contains("W005"));
    }
}

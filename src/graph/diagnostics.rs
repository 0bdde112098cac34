//! Diagnostics
//!
//! Collects non-fatal findings from registry ingestion, instance
//! extraction, and edge resolution. Collisions and ambiguities are
//! expected noise in real model files; they are reported with full
//! context instead of aborting the build.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic code for categorizing findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Two or more instances share a (type, name) key
    NameCollision,
    /// A field value matches several object names; no edge was emitted
    AmbiguousReference,
    /// A type block re-registered an existing type name under last-wins
    TypeOverwritten,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameCollision => "W001",
            Self::AmbiguousReference => "W002",
            Self::TypeOverwritten => "W003",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::NameCollision | Self::AmbiguousReference | Self::TypeOverwritten => {
                Severity::Warning
            }
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

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

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Type name (and object name, where applicable) that triggered this
    pub subject: String,
    pub code: DiagnosticCode,
    pub message: String,
    /// Additional context, e.g. every candidate of an ambiguous match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(
        subject: impl Into<String>,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
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
            self.subject
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

/// Collection of diagnostics from one build phase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Record a (type, name) collision between two instances
    pub fn name_collision(&mut self, type_name: &str, name: &str) {
        self.push(DiagnosticItem::new(
            format!("{type_name} '{name}'"),
            DiagnosticCode::NameCollision,
            format!("multiple {type_name} objects named '{name}'; the later one is not indexed"),
        ));
    }

    /// Record an ambiguous reference with every candidate it matched
    pub fn ambiguous_reference(
        &mut self,
        source: &str,
        field: &str,
        value: &str,
        candidates: impl IntoIterator<Item = String>,
    ) {
        let mut item = DiagnosticItem::new(
            source,
            DiagnosticCode::AmbiguousReference,
            format!("field '{field}' value '{value}' matches multiple objects; no edge emitted"),
        );
        for candidate in candidates {
            item = item.with_context(candidate);
        }
        self.push(item);
    }

    /// Record a last-wins overwrite of a registered type
    pub fn type_overwritten(&mut self, type_name: &str) {
        self.push(DiagnosticItem::new(
            type_name,
            DiagnosticCode::TypeOverwritten,
            "type registered twice; the later definition replaced the earlier one",
        ));
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
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
    fn severity_by_code() {
        assert_eq!(DiagnosticCode::NameCollision.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::TypeOverwritten.severity(), Severity::Warning);
        assert!(Severity::Info < Severity::Warning);
    }

    #[test]
    fn ambiguous_reference_lists_candidates() {
        let mut diags = Diagnostics::new();
        diags.ambiguous_reference(
            "SURFACE 'Wall1'",
            "Zone Name",
            "Zone1",
            vec!["ZONE 'Zone1'".to_string(), "ZONELIST 'Zone1'".to_string()],
        );

        let item = &diags.all()[0];
        assert_eq!(item.code, DiagnosticCode::AmbiguousReference);
        assert_eq!(item.context.len(), 2);
        let rendered = item.to_string();
        assert!(rendered.contains("ZONELIST 'Zone1'"));
    }

    #[test]
    fn merge_concatenates() {
        let mut a = Diagnostics::new();
        a.name_collision("ZONE", "Zone1");
        let mut b = Diagnostics::new();
        b.type_overwritten("ZONE");
        a.merge(b);
        assert_eq!(a.len(), 2);
    }
}

//! Diagnostic report produced by the completeness validator.

use std::fmt;

use serde::Serialize;

/// Which side of a mapping function is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Every writable destination field must be written
    Destination,
    /// Every readable source field must be read
    Source,
}

/// Findings for one mapping function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticBlock {
    /// `Owner::name(param: &Type, ...)`
    pub method: String,
    /// Checked side
    pub mode: ValidationMode,
    /// Fields not covered, in declaration order
    pub unmapped: Vec<String>,
    /// Suggested code lines, one per unmapped field
    pub suggestions: Vec<String>,
}

impl fmt::Display for DiagnosticBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Method {} does not map the following fields:", self.method)?;
        for field in &self.unmapped {
            writeln!(f, "\t{field}")?;
        }
        writeln!(f)?;
        writeln!(f, "Suggestion:")?;
        for line in &self.suggestions {
            writeln!(f, "\t{line}")?;
        }
        writeln!(f)
    }
}

/// Aggregated findings of one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    blocks: Vec<DiagnosticBlock>,
}

impl DiagnosticReport {
    pub(crate) fn new(blocks: Vec<DiagnosticBlock>) -> Self {
        Self { blocks }
    }

    /// Whether every function passed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Per-function findings, in registration order
    #[must_use]
    pub fn blocks(&self) -> &[DiagnosticBlock] {
        &self.blocks
    }

    /// Report as JSON, for tooling that consumes the findings
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Warning,
    Pattern,
    Anomaly,
    Increase,
    Decrease,
}

impl InsightKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Warning => "warning",
            Self::Pattern => "pattern",
            Self::Anomaly => "anomaly",
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Numeric rank for ordering; higher is more urgent.
    pub const fn priority(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

/// A generated, human-readable observation with severity and actionability
/// metadata. Computed fresh per call and never persisted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Stable slug, category-qualified where relevant (for example
    /// `anomaly-spike-groceries`).
    pub id: String,
    pub kind: InsightKind,
    pub message: String,
    pub severity: Severity,
    pub actionable: bool,
    pub recommendation: Option<String>,
    pub metadata: Option<Value>,
}

impl Insight {
    pub fn new(
        id: impl Into<String>,
        kind: InsightKind,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            message: message.into(),
            severity,
            actionable: false,
            recommendation: None,
            metadata: None,
        }
    }

    pub fn actionable(mut self) -> Self {
        self.actionable = true;
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self.actionable = true;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Lowercases and collapses a category name into an id-safe slug.
pub fn slug(value: &str) -> String {
    let mut output = String::new();
    let mut previous_dash = false;
    for character in value.trim().chars() {
        if character.is_ascii_alphanumeric() {
            output.push(character.to_ascii_lowercase());
            previous_dash = false;
        } else if !previous_dash && !output.is_empty() {
            output.push('-');
            previous_dash = true;
        }
    }
    while output.ends_with('-') {
        output.pop();
    }
    if output.is_empty() {
        return "uncategorized".to_string();
    }
    output
}

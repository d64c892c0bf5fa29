use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Output format for CLI results
#[derive(Clone, Copy, Debug, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        ViewportSize {
            width: 1280,
            height: 800,
        }
    }
}

impl ViewportSize {
    /// Parse viewport size from "WIDTHxHEIGHT" format (e.g., "1920x1080")
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid viewport format. Use WIDTHxHEIGHT (e.g., 1920x1080)");
        }

        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid width in viewport size"))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid height in viewport size"))?;

        Ok(ViewportSize { width, height })
    }
}

/// Tags that count as fillable form controls
pub const FIELD_TAGS: [&str; 3] = ["input", "textarea", "select"];

/// What a [`LocatorQuery`] looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// `<label>` whose text contains the needle, then the nearest following control
    LabelFollows,
    /// Control whose placeholder or aria-label contains the needle
    AttributeContains,
    /// Any element whose text contains the needle, then the nearest following control
    TextProximity,
    /// Every `<input type="radio">` on the page (needle unused)
    RadioInputs,
}

/// Immutable description of how to find elements on a page.
///
/// A query is pure data: building or rendering one never touches the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocatorQuery {
    pub kind: QueryKind,
    pub needle: String,
}

impl LocatorQuery {
    pub fn new(kind: QueryKind, needle: impl Into<String>) -> Self {
        LocatorQuery {
            kind,
            needle: needle.into(),
        }
    }

    pub fn label_follows(label: &str) -> Self {
        Self::new(QueryKind::LabelFollows, label)
    }

    pub fn attribute_contains(label: &str) -> Self {
        Self::new(QueryKind::AttributeContains, label)
    }

    pub fn text_proximity(label: &str) -> Self {
        Self::new(QueryKind::TextProximity, label)
    }

    pub fn radio_inputs() -> Self {
        Self::new(QueryKind::RadioInputs, "")
    }

    /// Render this query as an XPath union expression
    pub fn to_xpath(&self) -> String {
        let lit = xpath_literal(&self.needle);
        match self.kind {
            QueryKind::LabelFollows => FIELD_TAGS
                .iter()
                .map(|tag| {
                    format!(
                        "//label[contains(normalize-space(.), {})]/following::{}[1]",
                        lit, tag
                    )
                })
                .collect::<Vec<_>>()
                .join(" | "),
            QueryKind::AttributeContains => format!(
                "//input[contains(@placeholder, {lit}) or contains(@aria-label, {lit})] | \
                 //textarea[contains(@placeholder, {lit}) or contains(@aria-label, {lit})] | \
                 //select[contains(@aria-label, {lit})]"
            ),
            QueryKind::TextProximity => ["input", "select", "textarea"]
                .iter()
                .map(|tag| {
                    format!(
                        "//*[contains(normalize-space(.), {})]/following::{}[1]",
                        lit, tag
                    )
                })
                .collect::<Vec<_>>()
                .join(" | "),
            QueryKind::RadioInputs => "//input[@type='radio']".to_string(),
        }
    }
}

/// Quote `s` as an XPath 1.0 string literal.
///
/// XPath has no escape sequences, so a value holding both quote kinds is
/// split into pieces and joined with `concat()`.
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('"') {
        return format!("\"{}\"", s);
    }
    if !s.contains('\'') {
        return format!("'{}'", s);
    }

    let mut parts = Vec::new();
    for (i, piece) in s.split('"').enumerate() {
        if i > 0 {
            parts.push("'\"'".to_string());
        }
        if !piece.is_empty() {
            parts.push(format!("\"{}\"", piece));
        }
    }
    format!("concat({})", parts.join(", "))
}

/// Collapse runs of whitespace and trim, like XPath `normalize-space()`
pub fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

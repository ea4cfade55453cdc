// src/patterns/render.rs

use crate::patterns::detect::Pattern;
use crate::types::Severity;

pub const EMPTY_MESSAGE: &str = "No concerning patterns detected.";

fn glyph(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "🔴",
        Severity::Medium => "🟡",
        Severity::Low => "🔵",
    }
}

/// Markdown report: a header, then one bullet per pattern with its tip
/// indented underneath.
pub fn render_markdown(patterns: &[Pattern]) -> String {
    if patterns.is_empty() {
        return EMPTY_MESSAGE.to_string();
    }

    let blocks: Vec<String> = patterns
        .iter()
        .map(|p| {
            let mut block = format!("- {} {}", glyph(p.severity), p.message);
            if let Some(tip) = &p.guidance {
                block.push_str("\n\n  Tip: ");
                block.push_str(tip);
            }
            block
        })
        .collect();

    format!("## Detected Patterns\n\n{}", blocks.join("\n\n"))
}

pub fn render_json(patterns: &[Pattern]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(patterns)
}

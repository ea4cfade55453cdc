// src/commands/patterns.rs

use std::io::Write;

use crate::cli::PatternsArgs;
use crate::config::ConfigFile;
use crate::errors::Result;
use crate::metrics::MetricsStore;
use crate::patterns::{render_json, render_markdown, PatternDetector};

pub fn run(
    config: &ConfigFile,
    store: &dyn MetricsStore,
    args: &PatternsArgs,
    out: &mut dyn Write,
) -> Result<i32> {
    let period = args.period.unwrap_or(config.config.period);
    let patterns = PatternDetector::new(store)
        .with_tips(config.hook_tips())
        .detect_patterns(args.min_severity, period);

    let rendered = if args.json {
        render_json(&patterns)?
    } else {
        render_markdown(&patterns)
    };
    writeln!(out, "{rendered}")?;
    Ok(0)
}

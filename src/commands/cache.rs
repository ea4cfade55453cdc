// src/commands/cache.rs

use std::io::Write;
use std::path::Path;

use crate::cli::CacheTarget;
use crate::commands::App;
use crate::errors::{HookwiseError, Result};
use crate::hook_cache::HookCache;

fn cache(app: &App) -> HookCache {
    HookCache::new(app.fs.clone(), app.ctx.clone())
}

/// Exit code 0 on a hit, 1 on a miss.
pub fn check(app: &App, target: &CacheTarget, out: &mut dyn Write) -> Result<i32> {
    let hook = app.config.hook(&target.plugin, &target.hook)?;
    let dir = app.ctx.absolute_dir(target.dir.as_deref());

    let hit = cache(app).is_cache_hit(&target.plugin, &target.hook, &dir, &hook.if_changed);
    writeln!(out, "{}", if hit { "hit" } else { "miss" })?;
    Ok(if hit { 0 } else { 1 })
}

pub fn update(app: &App, target: &CacheTarget, out: &mut dyn Write) -> Result<i32> {
    let hook = app.config.hook(&target.plugin, &target.hook)?;
    let dir = app.ctx.absolute_dir(target.dir.as_deref());

    if !cache(app).track_files(&target.plugin, &target.hook, &dir, &hook.if_changed) {
        return Err(HookwiseError::Other(anyhow::anyhow!(
            "failed to update cache for {}/{} in {:?}",
            target.plugin,
            target.hook,
            dir
        )));
    }
    writeln!(out, "Updated cache for {}/{}", target.plugin, target.hook)?;
    Ok(0)
}

pub fn clear(
    app: &App,
    plugin: Option<&str>,
    hook: Option<&str>,
    dir: Option<&Path>,
    out: &mut dyn Write,
) -> Result<i32> {
    let cache = cache(app);
    match (plugin, hook) {
        (Some(plugin), Some(hook)) => {
            let dir = app.ctx.absolute_dir(dir);
            let removed = cache.invalidate(plugin, hook, &dir);
            writeln!(
                out,
                "{} cache entry for {plugin}/{hook}",
                if removed { "Removed" } else { "No" }
            )?;
        }
        _ => {
            let removed = cache.clear();
            writeln!(out, "Removed {removed} cache entries")?;
        }
    }
    Ok(0)
}

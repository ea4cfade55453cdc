// tests/hook_cache.rs

mod common;

use common::{hook_cache, patterns, TestResult};
use hookwise_test_utils::{init_tracing, ProjectFixture};

fn project() -> ProjectFixture {
    let fx = ProjectFixture::new();
    fx.write("packages/web/package.json", "{}");
    fx.write("packages/web/src/app.ts", "app");
    fx.write("packages/web/src/app.css", "body {}");
    fx.write("packages/api/package.json", "{}");
    fx.write("packages/api/src/server.ts", "server");
    fx
}

#[test]
fn tracked_state_is_a_hit_until_something_in_scope_changes() -> TestResult {
    init_tracing();
    let fx = project();
    let cache = hook_cache(&fx);
    let web = fx.path("packages/web");
    let ts = patterns(&["**/*.ts"]);

    assert!(!cache.is_cache_hit("jutsu-biome", "lint", &web, &ts));
    assert!(cache.track_files("jutsu-biome", "lint", &web, &ts));
    assert!(cache.is_cache_hit("jutsu-biome", "lint", &web, &ts));

    // Out of scope: neither a .ts file nor inside the directory.
    fx.write("packages/web/src/app.css", "body { color: red }");
    fx.write("packages/api/src/server.ts", "server v2");
    assert!(cache.is_cache_hit("jutsu-biome", "lint", &web, &ts));

    fx.write("packages/web/src/app.ts", "app v2");
    assert!(!cache.is_cache_hit("jutsu-biome", "lint", &web, &ts));
    Ok(())
}

#[test]
fn entries_are_stored_per_plugin_hook_and_directory() -> TestResult {
    init_tracing();
    let fx = project();
    let cache = hook_cache(&fx);
    let ts = patterns(&["**/*.ts"]);

    assert!(cache.track_files("jutsu/biome", "lint", &fx.path("packages/web"), &ts));
    assert!(cache.track_files("jutsu/biome", "lint", fx.root(), &ts));

    let dir = fx.cache_dir().join("hook-cache");
    assert!(dir.join("jutsu_biome_lint_packages_web.json").is_file());
    assert!(dir.join("jutsu_biome_lint_root.json").is_file());

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("jutsu_biome_lint_packages_web.json"))?)?;
    assert!(stored.get("src/app.ts").is_some());
    Ok(())
}

#[test]
fn clearing_forces_misses() -> TestResult {
    init_tracing();
    let fx = project();
    let cache = hook_cache(&fx);
    let ts = patterns(&["**/*.ts"]);
    let api = fx.path("packages/api");

    assert!(cache.track_files("bun", "test", &api, &ts));
    assert!(cache.track_files("bun", "typecheck", &api, &ts));
    assert_eq!(cache.clear(), 2);
    assert!(!cache.is_cache_hit("bun", "test", &api, &ts));
    assert_eq!(cache.clear(), 0);
    Ok(())
}

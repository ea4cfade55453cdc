#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;

use hookwise::checkpoint::{CheckpointId, CheckpointStore};
use hookwise::fs::RealFileSystem;
use hookwise::hook_cache::HookCache;
use hookwise_test_utils::ProjectFixture;

pub type TestResult = Result<(), Box<dyn Error>>;

pub fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn id(raw: &str) -> CheckpointId {
    CheckpointId::new(raw).expect("valid checkpoint id")
}

pub fn checkpoint_store(fixture: &ProjectFixture) -> CheckpointStore {
    CheckpointStore::new(Arc::new(RealFileSystem), fixture.context())
}

pub fn hook_cache(fixture: &ProjectFixture) -> HookCache {
    HookCache::new(Arc::new(RealFileSystem), fixture.context())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use crate::{AgentManager, CrawlManager, PlacesSearchManager, ReindexManager, StepManager, TransformManager};

/// Routes a step's `action` tag to its `StepManager`, mirroring the
/// teacher's adapter-registry-by-type pattern.
pub struct StepManagerRegistry {
    managers: HashMap<&'static str, Arc<dyn StepManager>>,
}

impl StepManagerRegistry {
    /// The closed set of actions from spec §9, wired to their managers:
    /// `classify`/`summarize`/`agent` all share `AgentManager` (spec
    /// §4.5/§2: "agent (classify/summarize)" is one manager).
    pub fn with_default_managers() -> Self {
        let mut registry = Self { managers: HashMap::new() };
        registry.register("crawl", Arc::new(CrawlManager::default()));
        registry.register("transform", Arc::new(TransformManager::default()));
        registry.register("agent", Arc::new(AgentManager::default()));
        registry.register("classify", Arc::new(AgentManager::default()));
        registry.register("summarize", Arc::new(AgentManager::default()));
        registry.register("places_search", Arc::new(PlacesSearchManager::default()));
        registry.register("reindex", Arc::new(ReindexManager::default()));
        registry
    }

    pub fn register(&mut self, action: &'static str, manager: Arc<dyn StepManager>) {
        self.managers.insert(action, manager);
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn StepManager>> {
        self.managers.get(action).cloned()
    }
}

impl Default for StepManagerRegistry {
    fn default() -> Self {
        Self::with_default_managers()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

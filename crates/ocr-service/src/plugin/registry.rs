use super::AiPlugin;
use anyhow::{anyhow, Result};
use common::ai_tasks::PluginInfo;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedPlugin = Arc<RwLock<dyn AiPlugin>>;

/// Registry of plugins keyed by plugin ID
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Arc<RwLock<HashMap<String, SharedPlugin>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin; IDs must be unique
    pub async fn register(&self, plugin: SharedPlugin) -> Result<()> {
        let id = plugin.read().await.id().to_string();

        let mut plugins = self.plugins.write().await;
        if plugins.contains_key(&id) {
            return Err(anyhow!("Plugin '{}' is already registered", id));
        }

        plugins.insert(id.clone(), plugin);
        tracing::info!(plugin = %id, "Registered plugin");
        Ok(())
    }

    pub async fn get(&self, plugin_id: &str) -> Result<SharedPlugin> {
        let plugins = self.plugins.read().await;
        plugins
            .get(plugin_id)
            .cloned()
            .ok_or_else(|| anyhow!("Plugin '{}' not found", plugin_id))
    }

    /// Plugin metadata, ordered by ID
    pub async fn list(&self) -> Vec<PluginInfo> {
        let plugins = self.plugins.read().await;
        let mut infos = Vec::with_capacity(plugins.len());
        for plugin in plugins.values() {
            infos.push(plugin.read().await.info());
        }
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    pub async fn has_plugin(&self, plugin_id: &str) -> bool {
        self.plugins.read().await.contains_key(plugin_id)
    }

    pub async fn count(&self) -> usize {
        self.plugins.read().await.len()
    }

    /// Health of every plugin; a failing check counts as unhealthy
    pub async fn health_check_all(&self) -> BTreeMap<String, bool> {
        let plugins = self.plugins.read().await;
        let mut results = BTreeMap::new();

        for (id, plugin) in plugins.iter() {
            let healthy = plugin.read().await.health_check().await.unwrap_or(false);
            results.insert(id.clone(), healthy);
        }

        results
    }

    /// Shut every plugin down, logging failures
    pub async fn shutdown_all(&self) -> Result<()> {
        let plugins = self.plugins.read().await;

        for (id, plugin) in plugins.iter() {
            if let Err(e) = plugin.write().await.shutdown().await {
                tracing::error!(plugin = %id, error = %e, "Error shutting down plugin");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::ai_tasks::{AiResult, VideoFrame};

    struct StubPlugin {
        id: &'static str,
        healthy: bool,
    }

    #[async_trait]
    impl AiPlugin for StubPlugin {
        fn id(&self) -> &'static str {
            self.id
        }

        fn name(&self) -> &'static str {
            "Stub Plugin"
        }

        fn description(&self) -> &'static str {
            "A stub plugin for testing"
        }

        async fn init(&mut self, _config: serde_json::Value) -> Result<()> {
            Ok(())
        }

        async fn process_frame(&self, frame: &VideoFrame) -> Result<AiResult> {
            Ok(AiResult {
                task_id: frame.source_id.clone(),
                timestamp: frame.timestamp,
                plugin_type: self.id().to_string(),
                detections: vec![],
                confidence: None,
                processing_time_ms: Some(0),
                metadata: None,
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.healthy)
        }
    }

    fn stub(id: &'static str, healthy: bool) -> SharedPlugin {
        Arc::new(RwLock::new(StubPlugin { id, healthy }))
    }

    #[tokio::test]
    async fn test_plugin_registration() {
        let registry = PluginRegistry::new();
        registry.register(stub("plate_reader", true)).await.unwrap();

        assert_eq!(registry.count().await, 1);
        assert!(registry.has_plugin("plate_reader").await);
        assert!(!registry.has_plugin("other").await);

        let retrieved = registry.get("plate_reader").await.unwrap();
        assert_eq!(retrieved.read().await.id(), "plate_reader");
        assert!(retrieved.read().await.as_plate_reader().is_none());
        assert!(registry.get("other").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let registry = PluginRegistry::new();
        registry.register(stub("plate_reader", true)).await.unwrap();
        assert!(registry.register(stub("plate_reader", true)).await.is_err());
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_health_is_reported() {
        let registry = PluginRegistry::new();
        registry.register(stub("zeta", false)).await.unwrap();
        registry.register(stub("alpha", true)).await.unwrap();

        let ids: Vec<String> = registry.list().await.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);

        let health = registry.health_check_all().await;
        assert_eq!(health.get("alpha"), Some(&true));
        assert_eq!(health.get("zeta"), Some(&false));

        registry.shutdown_all().await.unwrap();
    }
}

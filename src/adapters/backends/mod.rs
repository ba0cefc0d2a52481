//! Agent backend adapters and the registry that constructs them.

pub mod command;
pub mod extract;
pub mod http;
pub mod mock;

pub use command::CommandBackend;
pub use http::HttpBackend;
pub use mock::{MockBackend, MockScript};

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::BackendsConfig;
use crate::domain::ports::backend::{AgentBackend, BackendFactory};

/// Registry of configured agent backends.
///
/// Backends are constructed once and shared; `for_agent` applies the
/// configured agent-name mappings with the default backend as fallback.
pub struct BackendRegistry {
    config: BackendsConfig,
    command: Arc<dyn AgentBackend>,
    http: Option<Arc<dyn AgentBackend>>,
    mock: Arc<dyn AgentBackend>,
}

impl BackendRegistry {
    pub fn new(config: BackendsConfig) -> DomainResult<Self> {
        let command: Arc<dyn AgentBackend> =
            Arc::new(CommandBackend::new(config.command.clone()));
        let http: Option<Arc<dyn AgentBackend>> = if config.enabled.iter().any(|b| b == "http") {
            Some(Arc::new(HttpBackend::new(config.http.clone())?))
        } else {
            None
        };
        let mock: Arc<dyn AgentBackend> = Arc::new(MockBackend::returning(
            serde_json::json!({"status": "mocked"}),
        ));

        Ok(Self {
            config,
            command,
            http,
            mock,
        })
    }

    /// Replace the mock backend, e.g. with a scripted instance.
    pub fn with_mock(mut self, mock: Arc<dyn AgentBackend>) -> Self {
        self.mock = mock;
        self
    }

    /// Resolve the backend for a named agent, honoring `agent_mappings`.
    pub fn for_agent(&self, agent_name: &str) -> DomainResult<Arc<dyn AgentBackend>> {
        let backend_name = self
            .config
            .agent_mappings
            .get(agent_name)
            .cloned()
            .unwrap_or_else(|| self.config.default_backend.clone());

        self.by_name(&backend_name)
            .ok_or(DomainError::UnknownBackend(backend_name))
    }

    fn by_name(&self, name: &str) -> Option<Arc<dyn AgentBackend>> {
        match name {
            "command" => Some(self.command.clone()),
            "http" => self.http.clone(),
            "mock" => Some(self.mock.clone()),
            _ => None,
        }
    }
}

impl BackendFactory for BackendRegistry {
    fn create(&self, backend_type: &str) -> Option<Arc<dyn AgentBackend>> {
        self.by_name(backend_type)
    }

    fn available_types(&self) -> Vec<&'static str> {
        let mut types = vec!["command", "mock"];
        if self.http.is_some() {
            types.push("http");
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::BackendsConfig;

    fn config_with_mapping() -> BackendsConfig {
        let mut config = BackendsConfig {
            default_backend: "mock".to_string(),
            ..BackendsConfig::default()
        };
        config
            .agent_mappings
            .insert("environmental-engineer".to_string(), "command".to_string());
        config
    }

    #[test]
    fn test_mapping_routes_agent_to_backend() {
        let registry = BackendRegistry::new(config_with_mapping()).unwrap();

        let mapped = registry.for_agent("environmental-engineer").unwrap();
        assert_eq!(mapped.name(), "command");

        let unmapped = registry.for_agent("proteomics-analyst").unwrap();
        assert_eq!(unmapped.name(), "mock");
    }

    #[test]
    fn test_unknown_mapped_backend_fails() {
        let mut config = config_with_mapping();
        config
            .agent_mappings
            .insert("odd-agent".to_string(), "quantum".to_string());
        let registry = BackendRegistry::new(config).unwrap();

        let err = match registry.for_agent("odd-agent") {
            Ok(_) => panic!("expected for_agent to fail for unknown backend"),
            Err(e) => e,
        };
        assert!(matches!(err, DomainError::UnknownBackend(name) if name == "quantum"));
    }

    #[test]
    fn test_http_disabled_by_default() {
        let registry = BackendRegistry::new(BackendsConfig::default()).unwrap();
        assert!(registry.create("http").is_none());
        assert!(!registry.available_types().contains(&"http"));
    }

    #[test]
    fn test_http_enabled_when_configured() {
        let config = BackendsConfig {
            enabled: vec!["command".to_string(), "http".to_string()],
            ..BackendsConfig::default()
        };
        let registry = BackendRegistry::new(config).unwrap();
        assert!(registry.create("http").is_some());
        assert!(registry.available_types().contains(&"http"));
    }
}

use prometheus::Registry;
use serde::Deserialize;

use crate::error::Error;

/// Settings for bootstrapping a registry and the [`Factory`](crate::Factory) on top of it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Namespace applied to metrics that have none.
    pub default_namespace: String,

    /// Subsystem applied to metrics that have none.
    pub default_subsystem: String,

    /// Skips registering the process collector. Only has an effect with the
    /// `process` feature on Linux.
    pub disable_process_collector: bool,
}

impl Config {
    pub fn new(namespace: impl Into<String>, subsystem: impl Into<String>) -> Self {
        Self {
            default_namespace: namespace.into(),
            default_subsystem: subsystem.into(),
            disable_process_collector: false,
        }
    }
}

/// Creates a registry, registering the process collector unless disabled.
pub fn new_registry(config: &Config) -> Result<Registry, Error> {
    let registry = Registry::new();

    #[cfg(all(feature = "process", target_os = "linux"))]
    if !config.disable_process_collector {
        let collector = prometheus::process_collector::ProcessCollector::new(
            std::process::id() as i32,
            config.default_namespace.clone(),
        );
        registry.register(Box::new(collector))?;
        tracing::debug!(namespace = %config.default_namespace, "registered process collector");
    }

    #[cfg(not(all(feature = "process", target_os = "linux")))]
    let _ = config;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let config: Config = serde_json::from_str(
            r#"{"defaultNamespace": "app", "defaultSubsystem": "http", "disableProcessCollector": true}"#,
        )
        .unwrap();

        assert_eq!(
            config,
            Config {
                default_namespace: "app".to_string(),
                default_subsystem: "http".to_string(),
                disable_process_collector: true,
            }
        );
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());

        let config: Config = serde_json::from_str(r#"{"defaultNamespace": "app"}"#).unwrap();
        assert_eq!(config, Config::new("app", ""));
    }

    #[test]
    fn test_new_registry_without_process_collector() {
        let config = Config {
            disable_process_collector: true,
            ..Config::new("app", "")
        };

        let registry = new_registry(&config).unwrap();
        assert!(registry.gather().is_empty());
    }

    #[cfg(all(feature = "process", target_os = "linux"))]
    #[test]
    fn test_new_registry_with_process_collector() {
        let registry = new_registry(&Config::new("app", "")).unwrap();
        assert!(
            registry
                .gather()
                .iter()
                .any(|mf| mf.get_name().starts_with("app_process_"))
        );
    }
}

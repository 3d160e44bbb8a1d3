use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use launchdesk_core::config::{AppConfig, DEFAULT_CONFIG_FILE};
use toml::Value;

use crate::commands::{load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let file_path = detect_config_path();
    let file_doc = load_config_file_doc(file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, file_doc.as_ref(), file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_key, value) in effective_fields(&config) {
        lines.push(render_line(key_path, &value, source(key_path, env_key)));
    }

    CommandResult::success("config", lines.join("\n"))
}

fn effective_fields(config: &AppConfig) -> Vec<(&'static str, &'static str, String)> {
    vec![
        ("database.url", "LAUNCHDESK_DATABASE_URL", config.database.url.clone()),
        (
            "database.max_connections",
            "LAUNCHDESK_DATABASE_MAX_CONNECTIONS",
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            "LAUNCHDESK_DATABASE_TIMEOUT_SECS",
            config.database.timeout_secs.to_string(),
        ),
        ("server.bind_address", "LAUNCHDESK_SERVER_BIND_ADDRESS", config.server.bind_address.clone()),
        ("server.port", "LAUNCHDESK_SERVER_PORT", config.server.port.to_string()),
        (
            "server.max_upload_bytes",
            "LAUNCHDESK_SERVER_MAX_UPLOAD_BYTES",
            config.server.max_upload_bytes.to_string(),
        ),
        ("logging.level", "LAUNCHDESK_LOGGING_LEVEL", config.logging.level.clone()),
        ("logging.format", "LAUNCHDESK_LOGGING_FORMAT", format!("{:?}", config.logging.format)),
        (
            "ingest.seed_on_ingest",
            "LAUNCHDESK_INGEST_SEED_ON_INGEST",
            config.ingest.seed_on_ingest.to_string(),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if file_doc.is_some_and(|doc| contains_path(doc, key_path)) {
        let file_path = file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use launchdesk_core::config::AppConfig;
    use toml::Value;

    use super::{contains_path, effective_fields, field_source};

    #[test]
    fn nested_keys_are_found_in_the_file_document() {
        let doc: Value = "[server]\nport = 9000\n".parse().expect("toml");
        assert!(contains_path(&doc, "server.port"));
        assert!(!contains_path(&doc, "server.bind_address"));
        assert!(!contains_path(&doc, "database.url"));
    }

    #[test]
    fn file_source_names_the_file() {
        let doc: Value = "[ingest]\nseed_on_ingest = false\n".parse().expect("toml");
        let source = field_source(
            "ingest.seed_on_ingest",
            "LAUNCHDESK_TEST_UNSET_KEY",
            Some(&doc),
            Some(std::path::Path::new("launchdesk.toml")),
        );
        assert_eq!(source, "file (launchdesk.toml)");
        assert_eq!(field_source("server.port", "LAUNCHDESK_TEST_UNSET_KEY", Some(&doc), None), "default");
    }

    #[test]
    fn every_configurable_field_is_listed() {
        let keys = effective_fields(&AppConfig::default())
            .into_iter()
            .map(|(key, _, _)| key)
            .collect::<Vec<_>>();
        assert_eq!(keys.len(), 9);
        assert!(keys.contains(&"server.max_upload_bytes"));
        assert!(keys.contains(&"ingest.seed_on_ingest"));
    }
}

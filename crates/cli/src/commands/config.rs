use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use demogenie_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields(&config).into_iter().map(|field| {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        render_line(field.key, &field.value, source)
    }));

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let llm_api_key = if config.llm.has_credential() { "<redacted>" } else { "<unset>" };

    vec![
        Field {
            key: "database.url",
            value: config.database.url.clone(),
            env_keys: &["DEMOGENIE_DATABASE_URL"],
        },
        Field {
            key: "database.max_connections",
            value: config.database.max_connections.to_string(),
            env_keys: &["DEMOGENIE_DATABASE_MAX_CONNECTIONS"],
        },
        Field {
            key: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            env_keys: &["DEMOGENIE_DATABASE_TIMEOUT_SECS"],
        },
        Field {
            key: "database.seed_demo_data",
            value: config.database.seed_demo_data.to_string(),
            env_keys: &["DEMOGENIE_DATABASE_SEED_DEMO_DATA"],
        },
        Field {
            key: "llm.api_key",
            value: llm_api_key.to_string(),
            env_keys: &["DEMOGENIE_LLM_API_KEY", "OPENAI_API_KEY"],
        },
        Field {
            key: "llm.base_url",
            value: config.llm.base_url.clone(),
            env_keys: &["DEMOGENIE_LLM_BASE_URL"],
        },
        Field {
            key: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["DEMOGENIE_LLM_MODEL", "OPENAI_MODEL"],
        },
        Field {
            key: "llm.temperature",
            value: config.llm.temperature.to_string(),
            env_keys: &["DEMOGENIE_LLM_TEMPERATURE", "OPENAI_TEMPERATURE"],
        },
        Field {
            key: "llm.max_tokens",
            value: config.llm.max_tokens.to_string(),
            env_keys: &["DEMOGENIE_LLM_MAX_TOKENS", "OPENAI_MAX_TOKENS"],
        },
        Field {
            key: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["DEMOGENIE_LLM_TIMEOUT_SECS"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["DEMOGENIE_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["DEMOGENIE_SERVER_PORT"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["DEMOGENIE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "server.allowed_origins",
            value: config.server.allowed_origins.join(","),
            env_keys: &["DEMOGENIE_SERVER_ALLOWED_ORIGINS"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["DEMOGENIE_LOGGING_LEVEL", "DEMOGENIE_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["DEMOGENIE_LOGGING_FORMAT", "DEMOGENIE_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("demogenie.toml"), PathBuf::from("config/demogenie.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
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
    use std::path::Path;

    use super::{contains_path, field_source};

    #[test]
    fn nested_keys_are_found_in_file_documents() {
        let doc: toml::Value = "[llm]\nmodel = \"gpt-4o\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "llm.model"));
        assert!(!contains_path(&doc, "llm.api_key"));
        assert!(!contains_path(&doc, "database.url"));
    }

    #[test]
    fn file_source_names_the_file() {
        let doc: toml::Value = "[server]\nport = 9000\n".parse().expect("toml");
        let source = field_source(
            "server.port",
            &["DEMOGENIE_TEST_UNSET_PORT_VARIABLE"],
            Some(&doc),
            Some(Path::new("config/demogenie.toml")),
        );

        assert_eq!(source, "file (config/demogenie.toml)");
        assert_eq!(
            field_source("server.bind_address", &[], Some(&doc), None),
            "default".to_string()
        );
    }
}

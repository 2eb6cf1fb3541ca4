use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;
use toml_edit::value;

use crate::atomic_write::write_atomic_text;

const ENDPOINT_KEY: &str = "endpoint";
const PROMPT_LABEL_KEY: &str = "prompt_label";
const REQUEST_TIMEOUT_KEY: &str = "request_timeout_secs";

/// Values read from `config.toml`. Every key is optional; command-line flags
/// take precedence over anything set here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub prompt_label: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config file. A missing file yields defaults; a file that is not
    /// valid TOML is scanned line by line for top-level keys.
    pub fn load(&self) -> anyhow::Result<FileConfig> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(FileConfig::default());
        };

        let config = match content.parse::<DocumentMut>() {
            Ok(doc) => read_file_config(&doc),
            Err(err) => {
                tracing::warn!(
                    "{} is not valid TOML, reading it leniently: {err}",
                    self.path.display()
                );
                parse_file_config_fallback(&content)
            }
        };
        Ok(sanitize(config))
    }

    /// Persist `endpoint`, keeping every other line of the file intact.
    pub fn set_endpoint(&self, endpoint: &str) -> anyhow::Result<()> {
        let content = read_document_string(&self.path)?.unwrap_or_default();

        let mut doc = match content.parse::<DocumentMut>() {
            Ok(doc) => doc,
            Err(err) => anyhow::bail!(
                "refusing to edit {}: not valid TOML ({err})",
                self.path.display()
            ),
        };
        doc[ENDPOINT_KEY] = value(endpoint);

        write_atomic_text(&self.path, &doc.to_string())
    }
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".webpi").join("config.toml")
}

fn read_file_config(doc: &DocumentMut) -> FileConfig {
    let top_level = |key: &str| doc.get(key).and_then(TomlItem::as_value);
    FileConfig {
        endpoint: top_level(ENDPOINT_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string),
        prompt_label: top_level(PROMPT_LABEL_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string),
        request_timeout_secs: top_level(REQUEST_TIMEOUT_KEY)
            .and_then(|v| v.as_integer())
            .and_then(|secs| u64::try_from(secs).ok()),
    }
}

/// Drop values the terminal cannot use rather than failing startup over them.
fn sanitize(mut config: FileConfig) -> FileConfig {
    if config.request_timeout_secs == Some(0) {
        tracing::warn!("ignoring {REQUEST_TIMEOUT_KEY} = 0");
        config.request_timeout_secs = None;
    }
    if config.endpoint.as_deref().is_some_and(|e| e.trim().is_empty()) {
        config.endpoint = None;
    }
    if config.prompt_label.as_deref().is_some_and(str::is_empty) {
        config.prompt_label = None;
    }
    config
}

fn parse_file_config_fallback(contents: &str) -> FileConfig {
    let mut config = FileConfig::default();

    for line in contents.lines() {
        let trimmed = line.trim_start();
        // Only keys above the first table header are top-level.
        if trimmed.starts_with('[') {
            break;
        }
        let Some((key, raw)) = trimmed.split_once('=') else {
            continue;
        };
        let raw = raw.trim();
        match key.trim() {
            ENDPOINT_KEY => config.endpoint = parse_basic_string(raw),
            PROMPT_LABEL_KEY => config.prompt_label = parse_basic_string(raw),
            REQUEST_TIMEOUT_KEY => {
                let Some(token) = strip_toml_comment(raw) else {
                    continue;
                };
                config.request_timeout_secs = token.parse().ok();
            }
            _ => {}
        }
    }

    config
}

/// `"value"  # comment` -> `value`. Escapes are not interpreted.
fn parse_basic_string(raw: &str) -> Option<String> {
    let rest = raw.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn strip_toml_comment(line: &str) -> Option<&str> {
    let line = line.split_once('#').map_or(line, |(head, _)| head).trim();
    if line.is_empty() { None } else { Some(line) }
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}

//! Configuration resolution for Artificial workflow tooling.
//!
//! An adapter deployment keeps its configuration as a directory of YAML
//! fragments (the "config root"). The active configuration is the deep
//! merge of every fragment, with later files (by name) overriding earlier
//! ones. This crate resolves that merged document into a typed
//! [`AdapterConfig`].
//!
//! The config root is always passed in explicitly; this crate never reads
//! or writes process environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The `artificial` section of a merged configuration document.
///
/// Every field defaults to the empty string when absent, so a partial
/// config root still resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterConfig {
    /// Hostname of the Artificial instance the adapter talks to.
    pub host: String,
    /// API token for that instance.
    pub token: String,
    /// Resource prefix for the deployment.
    pub prefix: String,
    /// Lab the adapter is bound to.
    pub lab_id: String,
    /// Organization the lab belongs to.
    pub org_id: String,
}

/// Errors raised while resolving a config root.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config root does not exist or is not a directory.
    #[error("config root {0} is not a directory")]
    RootNotFound(PathBuf),
    /// A fragment could not be read.
    #[error("failed to read {path}")]
    Io {
        /// The fragment that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A fragment is not valid YAML.
    #[error("failed to parse {path}")]
    Parse {
        /// The fragment that failed.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
    /// The root contains no `*.yaml` / `*.yml` files.
    #[error("config root {0} contains no YAML fragments")]
    Empty(PathBuf),
    /// The merged document has no `artificial` section.
    #[error("merged configuration has no `artificial` section")]
    MissingSection,
    /// The `artificial` section does not match [`AdapterConfig`].
    #[error("invalid `artificial` section")]
    InvalidSection(#[source] serde_yaml::Error),
}

/// Resolve the adapter configuration from a config root directory.
///
/// Fragments are merged in file-name order, so `20-lab.yaml` overrides
/// `10-base.yaml`.
pub fn resolve(root: &Path) -> Result<AdapterConfig, ConfigError> {
    let merged = merged_document(root)?;
    let section = match merged {
        serde_yaml::Value::Mapping(mut map) => map
            .remove("artificial")
            .ok_or(ConfigError::MissingSection)?,
        _ => return Err(ConfigError::MissingSection),
    };
    serde_yaml::from_value(section).map_err(ConfigError::InvalidSection)
}

/// Deep-merge every YAML fragment under `root` into one document.
pub fn merged_document(root: &Path) -> Result<serde_yaml::Value, ConfigError> {
    if !root.is_dir() {
        return Err(ConfigError::RootNotFound(root.to_path_buf()));
    }

    let mut fragments: Vec<PathBuf> = std::fs::read_dir(root)
        .map_err(|source| ConfigError::Io {
            path: root.to_path_buf(),
            source,
        })?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_yaml(path))
        .collect();
    fragments.sort();

    if fragments.is_empty() {
        return Err(ConfigError::Empty(root.to_path_buf()));
    }

    let mut merged = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
    for path in fragments {
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let value: serde_yaml::Value =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })?;
        merge(&mut merged, value);
    }
    Ok(merged)
}

fn is_yaml(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml" | "yml")
        )
}

/// Recursively merge `overlay` into `base`. Mappings merge key by key;
/// anything else in the overlay replaces the base value.
fn merge(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.entry(key) {
                    serde_yaml::mapping::Entry::Occupied(entry) => merge(entry.into_mut(), value),
                    serde_yaml::mapping::Entry::Vacant(entry) => {
                        entry.insert(value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_resolve_single_fragment() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "base.yaml",
            "artificial:\n  host: lab.artificial.com\n  labId: lab_1\n",
        );

        let config = resolve(dir.path()).unwrap();
        assert_eq!(config.host, "lab.artificial.com");
        assert_eq!(config.lab_id, "lab_1");
        // Absent fields default to empty.
        assert_eq!(config.token, "");
        assert_eq!(config.org_id, "");
    }

    #[test]
    fn test_later_fragments_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "10-base.yaml",
            "artificial:\n  host: base.artificial.com\n  prefix: dev\n",
        );
        write(
            dir.path(),
            "20-lab.yml",
            "artificial:\n  host: lab.artificial.com\n  orgId: org_9\n",
        );

        let config = resolve(dir.path()).unwrap();
        assert_eq!(config.host, "lab.artificial.com");
        // Keys absent from the overriding fragment survive the merge.
        assert_eq!(config.prefix, "dev");
        assert_eq!(config.org_id, "org_9");
    }

    #[test]
    fn test_non_yaml_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "base.yaml", "artificial:\n  labId: lab_1\n");
        write(dir.path(), "notes.txt", "not: yaml-config\n");

        let config = resolve(dir.path()).unwrap();
        assert_eq!(config.lab_id, "lab_1");
    }

    #[test]
    fn test_missing_root() {
        let err = resolve(Path::new("/nonexistent/config/root")).unwrap_err();
        assert!(matches!(err, ConfigError::RootNotFound(_)));
    }

    #[test]
    fn test_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Empty(_)));
    }

    #[test]
    fn test_missing_section() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "other.yaml", "unrelated:\n  key: value\n");
        let err = resolve(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection));
    }

    #[test]
    fn test_parse_error_names_fragment() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.yaml", "artificial: [unclosed\n");
        let err = resolve(dir.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => {
                assert!(path.ends_with("broken.yaml"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let config = AdapterConfig {
            host: "h".into(),
            token: "t".into(),
            prefix: "p".into(),
            lab_id: "l".into(),
            org_id: "o".into(),
        };
        let value = serde_json::to_value(&config).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["host", "labId", "orgId", "prefix", "token"]);
    }

    #[test]
    fn test_idempotent_resolution() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "base.yaml",
            "artificial:\n  host: lab.artificial.com\n  token: secret\n",
        );

        let first = resolve(dir.path()).unwrap();
        let second = resolve(dir.path()).unwrap();
        assert_eq!(first, second);
    }
}

//! Startup configuration loading.
//!
//! A YAML document supplies the default database file path and
//! per-label parameter overrides for workspace entities. Application
//! is best-effort and per-field: an unknown label or an unassignable
//! key is logged and skipped, and never aborts the remaining fields —
//! configuration documents are hand-edited and expected to contain the
//! occasional stale key.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use alsvid_model::{Entity, Params, RefField};

use crate::error::{LibError, LibResult};
use crate::library::ChannelLibrary;

/// Keys that name identity or structural fields rather than scalar
/// parameters; these cannot be assigned from a configuration document.
const RESERVED_KEYS: &[&str] = &["id", "label", "kind", "snapshot"];

/// Startup configuration document.
///
/// ```yaml
/// db_file: /var/lib/alsvid/channels.sqlite
/// channels:
///   q1:
///     frequency: 5.1e9
///   src1:
///     power: -20.0
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StartupConfig {
    /// Database file to bind; in-memory when absent.
    pub db_file: Option<PathBuf>,

    /// Per-label parameter overrides.
    #[serde(default)]
    pub channels: BTreeMap<String, Params>,
}

impl StartupConfig {
    /// Parse a configuration document from YAML text.
    pub fn from_str(text: &str) -> LibResult<Self> {
        serde_yaml_ng::from_str(text).map_err(|e| LibError::Config(e.to_string()))
    }

    /// Parse a configuration document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> LibResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| LibError::Config(format!("{}: {e}", path.display())))?;
        Self::from_str(&text)
    }

    /// Open a channel library on the configured database file, or
    /// in-memory when none is configured.
    pub fn open_library(&self) -> LibResult<ChannelLibrary> {
        match &self.db_file {
            Some(path) => ChannelLibrary::open(path),
            None => ChannelLibrary::in_memory(),
        }
    }
}

/// Apply one label's settings onto an entity, best-effort.
///
/// Scalar keys land in the entity's parameter payload. Keys naming
/// identity fields or reference fields are logged and skipped;
/// references are wired by the linking helpers, not by configuration.
pub fn apply_settings(entity: &mut Entity, settings: &Params) {
    for (key, value) in settings {
        if RESERVED_KEYS.contains(&key.as_str()) || key.parse::<RefField>().is_ok() {
            warn!(label = %entity.label, key = %key, "cannot assign field from config, skipping");
            continue;
        }
        entity.params.insert(key.clone(), value.clone());
    }
}

/// Apply a configuration document onto the active workspace.
///
/// Labels with no matching workspace entity are logged and skipped.
pub fn apply(lib: &mut ChannelLibrary, config: &StartupConfig) -> LibResult<()> {
    for (label, settings) in &config.channels {
        let Some(mut entity) = lib.find_by_label(label)? else {
            warn!(label = %label, "config names an unknown channel, skipping");
            continue;
        };
        apply_settings(&mut entity, settings);
        lib.update(&entity)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{new_qubit, new_source};

    #[test]
    fn test_parse_config() {
        let config = StartupConfig::from_str(
            r#"
            db_file: /tmp/channels.sqlite
            channels:
              q1:
                frequency: 5.1e9
            "#,
        )
        .unwrap();
        assert_eq!(
            config.db_file.as_deref(),
            Some(Path::new("/tmp/channels.sqlite"))
        );
        assert_eq!(config.channels["q1"]["frequency"], 5.1e9);

        assert!(StartupConfig::from_str("db_file: [not a path").is_err());
    }

    #[test]
    fn test_apply_is_best_effort() {
        let mut lib = ChannelLibrary::in_memory().unwrap();
        new_qubit(&mut lib, "q1").unwrap();
        new_source(&mut lib, "src1", "Labbrick", "1690", -30.0).unwrap();

        let config = StartupConfig::from_str(
            r#"
            channels:
              q1:
                frequency: 5.1e9
                label: hijack
                phys_chan: 7
              src1:
                power: -20.0
              no_such_channel:
                anything: 1
            "#,
        )
        .unwrap();

        // Unknown labels and unassignable keys are skipped, the rest
        // still applies.
        apply(&mut lib, &config).unwrap();

        let q1 = lib.find_by_label("q1").unwrap().unwrap();
        assert_eq!(q1.params["frequency"], 5.1e9);
        assert_eq!(q1.label, "q1");
        assert!(!q1.params.contains_key("label"));
        assert!(q1.refs.is_empty());

        let src1 = lib.find_by_label("src1").unwrap().unwrap();
        assert_eq!(src1.params["power"], -20.0);
    }

    #[test]
    fn test_open_library_defaults_to_memory() {
        let config = StartupConfig::default();
        let lib = config.open_library().unwrap();
        assert!(lib.get_current_channels().unwrap().is_empty());
    }
}

//! Config resolution for mcp-conformance.
//!
//! Resolves [`HarnessConfig`] from multiple sources with the following priority
//! (highest to lowest):
//!
//! 1. CLI flags (applied by the caller after [`resolve_config`] returns)
//! 2. Environment variables (`MCP_CONFORMANCE_*`)
//! 3. The TOML file given with `--config`, or `.mcp-conformance.toml` in the
//!    current directory when present
//! 4. Compiled-in defaults (via [`HarnessConfig::default`])

use std::path::Path;

use anyhow::Context;

use super::types::HarnessConfig;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".mcp-conformance.toml";

/// Resolve the harness configuration.
///
/// # Errors
///
/// Returns an error if an explicit `config_path` cannot be read or parsed, if
/// an implicit config file exists but is invalid, or if the current directory
/// cannot be determined.
pub fn resolve_config(config_path: Option<&Path>) -> anyhow::Result<HarnessConfig> {
    let current_dir = std::env::current_dir()?;
    resolve_config_in(config_path, &current_dir)
}

fn resolve_config_in(
    config_path: Option<&Path>,
    search_dir: &Path,
) -> anyhow::Result<HarnessConfig> {
    let mut cfg = match config_path {
        Some(path) => load_file(path)?,
        None => {
            let implicit = search_dir.join(DEFAULT_CONFIG_FILE);
            if implicit.is_file() {
                load_file(&implicit)?
            } else {
                HarnessConfig::default()
            }
        }
    };

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

fn load_file(path: &Path) -> anyhow::Result<HarnessConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(cfg)
}

/// Apply `MCP_CONFORMANCE_*` environment variable overrides to `cfg`.
///
/// Empty string values are treated as "not set" and do not override existing
/// configuration.
fn apply_env_overrides(cfg: &mut HarnessConfig) {
    if let Ok(v) = std::env::var("MCP_CONFORMANCE_SERVER_BIN") {
        if !v.is_empty() {
            cfg.server_bin = v;
        }
    }
    if let Ok(v) = std::env::var("MCP_CONFORMANCE_PROTOCOL_VERSION") {
        if !v.is_empty() {
            cfg.protocol_version = v;
        }
    }
    if let Ok(v) = std::env::var("MCP_CONFORMANCE_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(secs) => cfg.request_timeout_secs = secs,
            Err(_) if v.is_empty() => {}
            Err(e) => tracing::warn!("ignoring MCP_CONFORMANCE_TIMEOUT_SECS={v:?}: {e}"),
        }
    }
    if let Ok(v) = std::env::var("MCP_CONFORMANCE_CATALOGUE") {
        if !v.is_empty() {
            cfg.catalogue = Some(v.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::path::PathBuf;

    const ENV_VARS: &[&str] = &[
        "MCP_CONFORMANCE_SERVER_BIN",
        "MCP_CONFORMANCE_PROTOCOL_VERSION",
        "MCP_CONFORMANCE_TIMEOUT_SECS",
        "MCP_CONFORMANCE_CATALOGUE",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            // SAFETY: env-mutating tests are serialized with #[serial].
            unsafe { env::remove_var(var) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: env-mutating tests are serialized with #[serial].
        unsafe { env::set_var(key, value) };
    }

    // ─── Default value tests ────────────────────────────────────────────────

    #[test]
    fn test_default_server_bin() {
        let cfg = HarnessConfig::default();
        assert_eq!(cfg.server_bin, "./target/release/ethcli-mcp");
        assert!(cfg.server_args.is_empty());
    }

    #[test]
    fn test_default_handshake_identity() {
        let identity = HarnessConfig::default().client_identity();
        assert_eq!(identity.protocol_version, "2024-11-05");
        assert_eq!(identity.name, "ethcli-mcp-test");
        assert_eq!(identity.version, "1.0.0");
    }

    #[test]
    fn test_default_timeout() {
        let cfg = HarnessConfig::default();
        assert_eq!(cfg.request_timeout_secs, 120);
        assert_eq!(cfg.read_timeout(), Some(std::time::Duration::from_secs(120)));
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let cfg = HarnessConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(cfg.read_timeout(), None);
    }

    // ─── File loading tests ─────────────────────────────────────────────────

    #[test]
    #[serial]
    fn test_no_file_yields_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let cfg = resolve_config_in(None, dir.path()).unwrap();
        assert_eq!(cfg, HarnessConfig::default());
    }

    #[test]
    #[serial]
    fn test_implicit_file_is_loaded() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "server_bin = \"/opt/tool-server\"\nserver_args = [\"--stdio\"]\n",
        )
        .unwrap();
        let cfg = resolve_config_in(None, dir.path()).unwrap();
        assert_eq!(cfg.server_bin, "/opt/tool-server");
        assert_eq!(cfg.server_args, vec!["--stdio".to_string()]);
        // Unspecified fields keep their defaults.
        assert_eq!(cfg.request_timeout_secs, 120);
    }

    #[test]
    #[serial]
    fn test_explicit_file_wins_over_implicit() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "server_bin = \"implicit\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "server_bin = \"explicit\"\nrequest_timeout_secs = 5\n").unwrap();
        let cfg = resolve_config_in(Some(&explicit), dir.path()).unwrap();
        assert_eq!(cfg.server_bin, "explicit");
        assert_eq!(cfg.request_timeout_secs, 5);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = resolve_config_in(Some(&missing), dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    #[serial]
    fn test_invalid_file_is_error() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "request_timeout_secs = \"soon\"\n").unwrap();
        let err = resolve_config_in(Some(&path), dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    // ─── Environment override tests ─────────────────────────────────────────

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "server_bin = \"from-file\"\nrequest_timeout_secs = 5\n",
        )
        .unwrap();
        set_env("MCP_CONFORMANCE_SERVER_BIN", "from-env");
        set_env("MCP_CONFORMANCE_TIMEOUT_SECS", "9");
        set_env("MCP_CONFORMANCE_CATALOGUE", "cases.toml");
        set_env("MCP_CONFORMANCE_PROTOCOL_VERSION", "2025-03-26");
        let cfg = resolve_config_in(None, dir.path()).unwrap();
        clear_env();

        assert_eq!(cfg.server_bin, "from-env");
        assert_eq!(cfg.request_timeout_secs, 9);
        assert_eq!(cfg.catalogue, Some(PathBuf::from("cases.toml")));
        assert_eq!(cfg.protocol_version, "2025-03-26");
    }

    #[test]
    #[serial]
    fn test_empty_env_values_do_not_override() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        for var in ENV_VARS {
            set_env(var, "");
        }
        let cfg = resolve_config_in(None, dir.path()).unwrap();
        clear_env();
        assert_eq!(cfg, HarnessConfig::default());
    }

    #[test]
    #[serial]
    fn test_unparseable_timeout_env_is_ignored() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        set_env("MCP_CONFORMANCE_TIMEOUT_SECS", "forever");
        let cfg = resolve_config_in(None, dir.path()).unwrap();
        clear_env();
        assert_eq!(cfg.request_timeout_secs, 120);
    }
}

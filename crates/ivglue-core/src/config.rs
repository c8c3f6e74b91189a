use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use ivglue_contracts::IVGLUE_CONFIG_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Middleware-facing wrapper packages (`<fn>_wrappers`, `<fn>_async_ri_wrappers`).
    AdaWrappers,
    /// User-facing package skeleton (`<fn>.ads` / `<fn>.adb`).
    AdaSkeletons,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::AdaWrappers, BackendKind::AdaSkeletons];

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::AdaWrappers => "ada-wrappers",
            BackendKind::AdaSkeletons => "ada-skeletons",
        }
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "ada-wrappers" => Ok(BackendKind::AdaWrappers),
            "ada-skeletons" => Ok(BackendKind::AdaSkeletons),
            other => anyhow::bail!(
                "unknown backend {other:?} (expected \"ada-wrappers\" or \"ada-skeletons\")"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Only the concurrency view is being built: no functional glue at all.
    pub only_cv: bool,
    /// Target the C flavour of the middleware; the Ada wrappers are not used there.
    pub polyorb_hi_c: bool,
    pub backends: Vec<BackendKind>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            only_cv: false,
            polyorb_hi_c: false,
            backends: BackendKind::ALL.to_vec(),
        }
    }
}

impl GenerateOptions {
    pub fn enabled(&self, backend: BackendKind) -> bool {
        self.backends.contains(&backend)
    }
}

/// On-disk tool configuration (`ivglue.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    pub schema_version: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub only_cv: bool,
    #[serde(default)]
    pub polyorb_hi_c: bool,
    #[serde(default)]
    pub backends: Option<Vec<String>>,
}

impl ToolConfig {
    pub fn to_options(&self) -> Result<GenerateOptions> {
        let backends = match &self.backends {
            None => BackendKind::ALL.to_vec(),
            Some(names) => {
                let mut out = Vec::new();
                for name in names {
                    let kind: BackendKind = name.parse()?;
                    if !out.contains(&kind) {
                        out.push(kind);
                    }
                }
                out
            }
        };
        Ok(GenerateOptions {
            only_cv: self.only_cv,
            polyorb_hi_c: self.polyorb_hi_c,
            backends,
        })
    }

    /// Output directory, relative paths resolved against the config file's directory.
    pub fn output_dir(&self, config_path: &Path) -> Option<PathBuf> {
        let raw = self.output.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        Some(base.join(raw))
    }
}

pub fn load_config(path: &Path) -> Result<ToolConfig> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("[IVGCONFIG_READ] read config: {}", path.display()))?;
    parse_config_bytes(&bytes, path)
}

pub fn parse_config_bytes(bytes: &[u8], path: &Path) -> Result<ToolConfig> {
    let cfg: ToolConfig = serde_json::from_slice(bytes)
        .with_context(|| format!("[IVGCONFIG_PARSE] parse config JSON: {}", path.display()))?;
    if cfg.schema_version.trim() != IVGLUE_CONFIG_SCHEMA_VERSION {
        anyhow::bail!(
            "config schema_version mismatch: expected {IVGLUE_CONFIG_SCHEMA_VERSION} got {:?}",
            cfg.schema_version
        );
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{parse_config_bytes, BackendKind, GenerateOptions};

    #[test]
    fn config_selects_backends_and_resolves_output() {
        let cfg = parse_config_bytes(
            br#"{
              "schema_version": "ivglue.config@0.1.0",
              "output": "build",
              "polyorb_hi_c": true,
              "backends": ["ada-skeletons", "ada-skeletons"]
            }"#,
            Path::new("proj/ivglue.json"),
        )
        .expect("parse config");
        let opts = cfg.to_options().expect("options");
        assert!(opts.polyorb_hi_c);
        assert!(!opts.only_cv);
        assert_eq!(opts.backends, vec![BackendKind::AdaSkeletons]);
        assert_eq!(
            cfg.output_dir(Path::new("proj/ivglue.json")),
            Some(PathBuf::from("proj/build"))
        );
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let cfg = parse_config_bytes(
            br#"{"schema_version": "ivglue.config@0.1.0", "backends": ["vhdl"]}"#,
            Path::new("ivglue.json"),
        )
        .expect("parse config");
        let err = cfg.to_options().unwrap_err();
        assert!(err.to_string().contains("unknown backend"));
    }

    #[test]
    fn defaults_enable_every_backend() {
        let opts = GenerateOptions::default();
        assert!(opts.enabled(BackendKind::AdaWrappers));
        assert!(opts.enabled(BackendKind::AdaSkeletons));
    }
}

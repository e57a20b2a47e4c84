use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::StatError;
use crate::flow::FlowPolicy;

/// Project config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "jirastat.toml";

/// Environment variable overriding `flow.policy`.
pub const POLICY_ENV: &str = "JIRASTAT_FLOW_POLICY";

/// Default transition matrix file name.
pub const DEFAULT_MATRIX_FILE: &str = "in-out_config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub policy: FlowPolicy,
    #[serde(default = "default_matrix")]
    pub matrix: PathBuf,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            policy: FlowPolicy::default(),
            matrix: default_matrix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl ProjectConfig {
    /// Matrix path, relative paths resolved against `root`.
    #[must_use]
    pub fn matrix_path(&self, root: &Path) -> PathBuf {
        root.join(&self.flow.matrix)
    }

    /// Output directory, relative paths resolved against `root`.
    #[must_use]
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.output.dir)
    }
}

/// Load `jirastat.toml` from `root`; defaults when it does not exist.
///
/// # Errors
///
/// Returns [`StatError::Read`] or [`StatError::Config`] when the file exists
/// but cannot be read or parsed.
pub fn load_project_config(root: &Path) -> Result<ProjectConfig, StatError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|source| StatError::Read {
        path: path.clone(),
        source,
    })?;

    toml::from_str::<ProjectConfig>(&content).map_err(|source| StatError::Config { path, source })
}

/// Project config with environment overrides applied.
///
/// # Errors
///
/// Propagates [`load_project_config`] errors and rejects an unknown policy
/// in [`POLICY_ENV`].
pub fn resolve_config(root: &Path) -> Result<ProjectConfig, StatError> {
    let project = load_project_config(root)?;
    apply_policy_override(project, env::var(POLICY_ENV).ok().as_deref())
}

fn apply_policy_override(
    mut config: ProjectConfig,
    env_policy: Option<&str>,
) -> Result<ProjectConfig, StatError> {
    if let Some(raw) = env_policy.filter(|raw| !raw.trim().is_empty()) {
        config.flow.policy = raw.parse()?;
    }
    Ok(config)
}

fn default_matrix() -> PathBuf {
    PathBuf::from(DEFAULT_MATRIX_FILE)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

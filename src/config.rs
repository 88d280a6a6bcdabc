use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// FAS account whose packages the dashboard tracks.
    pub username: String,
    pub pkgdb_url: String,
    pub anitya_url: String,

    /// Yum configuration handed to repoquery for the rawhide pass.
    pub yum_conf: String,

    /// Lines kept in the on-screen log pane.
    pub logsize: usize,

    /// Per-request timeout for the registry APIs, in seconds.
    pub http_timeout_secs: u64,

    pub build: BuildConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Dist-git clone URL with a `{package}` placeholder.
    pub dist_git_url: String,

    /// "Name <email>" recorded in bumped changelog entries.
    pub git_userstring: String,

    /// Koji build target for scratch builds.
    pub koji_target: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: whoami(),
            pkgdb_url: "https://admin.fedoraproject.org/pkgdb".to_string(),
            anitya_url: "https://release-monitoring.org".to_string(),
            yum_conf: "/etc/yum.repos.d/fedora-rawhide.repo".to_string(),
            logsize: 20,
            http_timeout_secs: 30,
            build: BuildConfig::default(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dist_git_url: "ssh://pkgs.fedoraproject.org/rpms/{package}.git".to_string(),
            git_userstring: String::new(),
            koji_target: "rawhide".to_string(),
        }
    }
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_default()
}

impl Config {
    /// Candidate config files, most specific first: the working
    /// directory, then the user config directory.
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("pkgdash.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("pkgdash").join("config.toml"));
        }
        paths
    }

    /// Load the first config file that exists, falling back to defaults.
    pub fn load() -> Result<Self> {
        for path in Self::candidate_paths() {
            if path.is_file() {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let config: Config = toml::from_str(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?;
                info!(target: "config", "loaded config from {}", path.display());
                return Ok(config);
            }
        }
        info!(target: "config", "no config file found, using defaults");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_fall_back_to_defaults_per_field() {
        let config: Config = toml::from_str(
            r#"
            username = "ralph"

            [build]
            koji_target = "f41-candidate"
            "#,
        )
        .unwrap();
        assert_eq!(config.username, "ralph");
        assert_eq!(config.build.koji_target, "f41-candidate");
        assert_eq!(config.anitya_url, "https://release-monitoring.org");
        assert_eq!(config.logsize, 20);
    }
}

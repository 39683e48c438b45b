//! Configuration scaffolding for `llmprobe init`.
//!
//! Writes the config template without overwriting an existing file.

use anyhow::Result;
use std::path::{Path, PathBuf};

const CONFIG_TEMPLATE: &str = include_str!("../../config-templates/config.toml");

#[derive(Debug, Clone)]
pub struct InitReport {
    pub path: PathBuf,
    pub created: bool,
}

pub async fn initialize(path: Option<PathBuf>) -> Result<InitReport> {
    let path = match path {
        Some(p) => p,
        None => crate::config::default_config_path(),
    };
    initialize_at(&path).await
}

pub async fn initialize_at(path: &Path) -> Result<InitReport> {
    match tokio::fs::metadata(path).await {
        Ok(_) => Ok(InitReport {
            path: path.to_path_buf(),
            created: false,
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| anyhow::anyhow!("create config dir {}: {e}", parent.display()))?;
            }
            tokio::fs::write(path, CONFIG_TEMPLATE)
                .await
                .map_err(|e| anyhow::anyhow!("write config template {}: {e}", path.display()))?;
            Ok(InitReport {
                path: path.to_path_buf(),
                created: true,
            })
        }
        Err(err) => Err(anyhow::anyhow!(
            "inspect config path {}: {err}",
            path.display()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_TEMPLATE, initialize_at};
    use crate::config::ProbeConfig;

    #[test]
    fn template_parses_as_config() {
        let cfg = ProbeConfig::parse(CONFIG_TEMPLATE).expect("template is valid toml");
        assert_eq!(cfg.general.pause_ms, 1000);
    }

    #[tokio::test]
    async fn init_creates_template_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("nested").join("config.toml");
        let report = initialize_at(&target).await.expect("init succeeds");

        assert!(report.created);
        let written = std::fs::read_to_string(&target).expect("template written");
        assert_eq!(written, CONFIG_TEMPLATE);
    }

    #[tokio::test]
    async fn init_never_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("config.toml");
        std::fs::write(&target, "[general]\npause_ms = 5\n").expect("seed file");

        let report = initialize_at(&target).await.expect("init succeeds");
        assert!(!report.created);
        let kept = std::fs::read_to_string(&target).expect("file still there");
        assert!(kept.contains("pause_ms = 5"));
    }
}

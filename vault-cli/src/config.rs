//! Site configuration for vaultic.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Site configuration stored locally as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site name shown in headings.
    pub site_name: String,
    /// Creator name shown on the site.
    pub creator: String,
    /// Optional tagline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    /// When the site was initialized (milliseconds since the epoch).
    pub created_at: u64,
}

impl SiteConfig {
    /// Create a new site configuration.
    pub fn new(site_name: &str, creator: &str, tagline: Option<&str>) -> Self {
        Self {
            site_name: site_name.to_string(),
            creator: creator.to_string(),
            tagline: tagline.map(str::to_string),
            created_at: vault_types::Timestamp::now().as_millis(),
        }
    }

    /// Load the site configuration from a directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("vaultic.toml");
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Site not initialized. Run 'vaultic init' first.")?;
        toml::from_str(&contents).context("Invalid site configuration")
    }

    /// Save the site configuration to a directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join("vaultic.toml");
        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save site configuration")?;
        Ok(())
    }

    /// Check if the site is initialized.
    pub fn exists(data_dir: &Path) -> bool {
        data_dir.join("vaultic.toml").exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn config_round_trip() {
        let dir = tempdir().unwrap();
        let config = SiteConfig::new("Universe & Beyond", "A. Creator", Some("Space, explained"));
        config.save(dir.path()).await.unwrap();

        assert!(SiteConfig::exists(dir.path()));
        let loaded = SiteConfig::load(dir.path()).await.unwrap();
        assert_eq!(loaded.site_name, "Universe & Beyond");
        assert_eq!(loaded.creator, "A. Creator");
        assert_eq!(loaded.tagline.as_deref(), Some("Space, explained"));
        assert!(loaded.created_at > 0);
    }

    #[tokio::test]
    async fn load_without_init_fails() {
        let dir = tempdir().unwrap();
        let result = SiteConfig::load(dir.path()).await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Site not initialized"));
    }

    #[tokio::test]
    async fn tagline_is_optional() {
        let dir = tempdir().unwrap();
        SiteConfig::new("Site", "Creator", None)
            .save(dir.path())
            .await
            .unwrap();
        let loaded = SiteConfig::load(dir.path()).await.unwrap();
        assert!(loaded.tagline.is_none());
    }
}

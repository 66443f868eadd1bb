//! Initialize the site configuration.

use anyhow::Result;
use std::path::Path;

use crate::config::SiteConfig;

/// Run the init command.
pub async fn run(data_dir: &Path, name: &str, creator: &str, tagline: Option<&str>) -> Result<()> {
    if SiteConfig::exists(data_dir) {
        anyhow::bail!(
            "Site already initialized. Delete {} to reinitialize.",
            data_dir.join("vaultic.toml").display()
        );
    }

    let config = SiteConfig::new(name, creator, tagline);
    config.save(data_dir).await?;

    println!("Site initialized successfully!");
    println!();
    println!("  Name:     {}", config.site_name);
    println!("  Creator:  {}", config.creator);
    if let Some(tagline) = &config.tagline {
        println!("  Tagline:  {}", tagline);
    }
    println!("  Data dir: {}", data_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Unlock editing: vaultic login");
    println!("  2. Record your numbers: vaultic stats set --followers <n>");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn init_creates_site_config() {
        let dir = tempdir().unwrap();
        run(dir.path(), "Universe & Beyond", "A. Creator", None)
            .await
            .unwrap();

        assert!(dir.path().join("vaultic.toml").exists());

        let config = SiteConfig::load(dir.path()).await.unwrap();
        assert_eq!(config.site_name, "Universe & Beyond");
        assert_eq!(config.creator, "A. Creator");
        assert!(config.tagline.is_none());
    }

    #[tokio::test]
    async fn init_keeps_the_tagline() {
        let dir = tempdir().unwrap();
        run(dir.path(), "Site", "Creator", Some("Space, explained"))
            .await
            .unwrap();

        let config = SiteConfig::load(dir.path()).await.unwrap();
        assert_eq!(config.tagline.as_deref(), Some("Space, explained"));
    }

    #[tokio::test]
    async fn init_fails_if_already_initialized() {
        let dir = tempdir().unwrap();

        run(dir.path(), "First", "Creator", None).await.unwrap();

        let result = run(dir.path(), "Second", "Creator", None).await;
        assert!(result.is_err());

        // The original configuration is untouched
        let config = SiteConfig::load(dir.path()).await.unwrap();
        assert_eq!(config.site_name, "First");
    }
}

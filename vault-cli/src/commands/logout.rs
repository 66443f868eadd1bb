//! Lock the editing commands.

use anyhow::Result;
use std::path::Path;

use crate::admin;

/// Run the logout command.
pub async fn run(data_dir: &Path) -> Result<()> {
    if admin::end_session(data_dir).await? {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn logout_ends_the_session() {
        let dir = tempdir().unwrap();
        admin::start_session(dir.path()).await.unwrap();

        run(dir.path()).await.unwrap();
        assert!(!admin::session_active(dir.path()));
    }

    #[tokio::test]
    async fn logout_without_a_session_is_fine() {
        let dir = tempdir().unwrap();
        run(dir.path()).await.unwrap();
    }
}

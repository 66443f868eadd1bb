//! Admin session handling.
//!
//! Editing commands require an active admin session. The session is a
//! marker file in the data directory, created by `login` after the
//! shared passcode checks out and removed by `logout`.

use anyhow::{bail, Result};
use std::path::Path;

/// Shared admin passcode.
const PASSCODE: &str = "cosmos-admin";

/// Name of the session marker file.
const SESSION_FILE: &str = "session";

/// Check a candidate passcode against the shared admin passcode.
pub fn verify(candidate: &str) -> bool {
    candidate == PASSCODE
}

/// Start an admin session in the given data directory.
pub async fn start_session(data_dir: &Path) -> Result<()> {
    let stamp = vault_types::Timestamp::now().as_millis().to_string();
    tokio::fs::write(data_dir.join(SESSION_FILE), stamp).await?;
    Ok(())
}

/// End the admin session, if one is active.
pub async fn end_session(data_dir: &Path) -> Result<bool> {
    let path = data_dir.join(SESSION_FILE);
    if path.exists() {
        tokio::fs::remove_file(&path).await?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Check whether an admin session is active.
pub fn session_active(data_dir: &Path) -> bool {
    data_dir.join(SESSION_FILE).exists()
}

/// Fail unless an admin session is active.
pub fn require_session(data_dir: &Path) -> Result<()> {
    if !session_active(data_dir) {
        bail!("Not logged in. Run 'vaultic login' first.");
    }
    Ok(())
}

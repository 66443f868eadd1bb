//! Unlock the editing commands.

use anyhow::Result;
use std::path::Path;

use crate::admin;

/// Run the login command.
pub async fn run(data_dir: &Path, passcode: Option<&str>) -> Result<()> {
    if admin::session_active(data_dir) {
        println!("Already logged in.");
        return Ok(());
    }

    let candidate = match passcode {
        Some(passcode) => passcode.to_string(),
        None => rpassword::prompt_password("Passcode: ")?,
    };

    if !admin::verify(&candidate) {
        anyhow::bail!("Incorrect passcode.");
    }

    admin::start_session(data_dir).await?;
    println!("Logged in. Editing commands are unlocked.");

    Ok(())
}

//! CLI command implementations.

pub mod corrections;
pub mod init;
pub mod login;
pub mod logout;
pub mod research;
pub mod stats;
pub mod status;
pub mod sync;

/// Collection holding research entries.
pub const RESEARCH_COLLECTION: &str = "research-entries";

/// Collection holding corrections.
pub const CORRECTIONS_COLLECTION: &str = "corrections";

/// Collection holding the statistics document.
pub const STATS_COLLECTION: &str = "stats";

/// Document id of the social statistics.
pub const STATS_DOC: &str = "social-stats";

/// Print where a mutation landed after a flush attempt.
pub fn report_queue(pending: usize) {
    if pending == 0 {
        println!("Synced with the remote store.");
    } else {
        println!(
            "{} write(s) queued locally. Run 'vaultic sync' once a backend is reachable.",
            pending
        );
    }
}

/// Format an epoch-milliseconds timestamp as a relative time.
pub fn format_millis(ms: u64) -> String {
    let now = vault_types::Timestamp::now().as_millis();
    let diff = now.saturating_sub(ms) / 1000;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_millis_works() {
        let now = vault_types::Timestamp::now().as_millis();

        assert_eq!(format_millis(now), "just now");
        assert!(format_millis(now - 120_000).contains("minutes"));
        assert!(format_millis(now - 7_200_000).contains("hours"));
        assert!(format_millis(now - 172_800_000).contains("days"));
    }
}

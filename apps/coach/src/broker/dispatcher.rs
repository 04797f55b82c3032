//! Command dispatcher — the broker subscription loop.
//!
//! Subscribes to all command channels and listens forever. A bad message is
//! logged and skipped; the loop only ends if the broker connection drops.

use anyhow::Result;
use futures::StreamExt;
use tracing::{error, info};

use crate::broker::commands::{Command, COMMAND_CHANNELS};
use crate::broker::supervisor;
use crate::state::AppState;

/// Long-running subscription loop. Run as a background task from `main`.
pub async fn run(state: AppState, client: redis::Client) -> Result<()> {
    let mut pubsub = client.get_async_pubsub().await?;
    for channel in COMMAND_CHANNELS {
        pubsub.subscribe(channel).await?;
    }
    info!("Subscribed to command channels: {COMMAND_CHANNELS:?}");

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let channel = msg.get_channel_name().to_string();
        let payload: String = match msg.get_payload() {
            Ok(p) => p,
            Err(e) => {
                error!("Undecodable payload on {channel}: {e}");
                continue;
            }
        };

        info!("Received [{channel}]: {}", truncate(&payload, 200));

        match Command::decode(&channel, &payload) {
            Ok(command) => supervisor::spawn(state.clone(), command),
            Err(e) => {
                // Never let one bad producer stop the loop.
                error!("Dropping command on {channel}: {e}");
                continue;
            }
        }
    }

    error!("Broker subscription stream ended");
    Ok(())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A malformed payload must not poison handling of the next valid one:
    /// decode is a pure per-message step, so a failure carries no state into
    /// the following iteration.
    #[test]
    fn test_bad_message_then_good_message() {
        assert!(Command::decode("CMD_PARSE_CV", "{broken").is_err());

        let good = r#"{"userId": "7c9e6679-7425-40de-944b-e07fc1f90ae7", "cvUrl": "/uploads/a.pdf"}"#;
        assert!(Command::decode("CMD_PARSE_CV", good).is_ok());
    }

    /// A command missing a required field is dropped before any task spawns.
    #[test]
    fn test_incomplete_command_is_dropped() {
        let missing = r#"{"userId": "7c9e6679-7425-40de-944b-e07fc1f90ae7"}"#;
        assert!(Command::decode("CMD_PARSE_CV", missing).is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}

//! Typed inbound commands.
//!
//! Each Redis channel carries one command shape. Payloads are decoded with
//! `deny_unknown_fields` so a malformed producer fails loudly at the
//! dispatcher instead of deep inside a pipeline.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

pub const CMD_ANALYZE_JOB: &str = "CMD_ANALYZE_JOB";
pub const CMD_PARSE_CV: &str = "CMD_PARSE_CV";

/// All channels the dispatcher subscribes to.
pub const COMMAND_CHANNELS: [&str; 2] = [CMD_ANALYZE_JOB, CMD_PARSE_CV];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct AnalyzeJobCommand {
    pub application_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub job_feed_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ParseCvCommand {
    pub user_id: Uuid,
    pub cv_url: String,
}

#[derive(Debug, Clone)]
pub enum Command {
    AnalyzeJob(AnalyzeJobCommand),
    ParseCv(ParseCvCommand),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command channel '{0}'")]
    UnknownChannel(String),

    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing or empty field: {0}")]
    Validation(&'static str),
}

impl Command {
    /// Decodes and validates one inbound message. Rejects unknown channels,
    /// unknown/missing fields and empty required values.
    pub fn decode(channel: &str, payload: &str) -> Result<Command, CommandError> {
        match channel {
            CMD_ANALYZE_JOB => {
                let cmd: AnalyzeJobCommand = serde_json::from_str(payload)?;
                Ok(Command::AnalyzeJob(cmd))
            }
            CMD_PARSE_CV => {
                let cmd: ParseCvCommand = serde_json::from_str(payload)?;
                if cmd.cv_url.trim().is_empty() {
                    return Err(CommandError::Validation("cvUrl"));
                }
                Ok(Command::ParseCv(cmd))
            }
            other => Err(CommandError::UnknownChannel(other.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Command::AnalyzeJob(_) => CMD_ANALYZE_JOB,
            Command::ParseCv(_) => CMD_PARSE_CV,
        }
    }
}

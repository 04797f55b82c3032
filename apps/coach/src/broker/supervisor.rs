//! Task supervisor — wraps one pipeline run with a deadline and a total
//! failure barrier.
//!
//! Guarantee: every accepted command yields exactly one terminal event,
//! except the analysis not-found case, which aborts silently (the command
//! referenced a row that does not exist — an invalid command, not a system
//! failure).

use std::time::Duration;

use tracing::{error, info, warn};

use crate::analysis;
use crate::broker::commands::Command;
use crate::broker::events::{self, Event};
use crate::cv;
use crate::errors::AppError;
use crate::state::AppState;

/// Hands one accepted command to its own supervised task and returns
/// immediately. The dispatcher never blocks on pipeline execution.
pub fn spawn(state: AppState, command: Command) {
    tokio::spawn(async move {
        supervise(state, command).await;
    });
}

/// Runs the pipeline for one command under the per-kind deadline, bounded by
/// the in-flight limiter.
pub async fn supervise(state: AppState, command: Command) {
    // Backpressure: under a command burst, queued tasks wait here instead of
    // all hitting the store and the generation API at once.
    let _permit = match state.limiter.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return, // semaphore closed, process is shutting down
    };

    let deadline = deadline_for(&state, &command);
    let kind = command.kind();

    let outcome = tokio::time::timeout(deadline, run_pipeline(&state, &command)).await;

    let mut publisher = state.publisher.clone();
    match outcome {
        Ok(Ok(event)) => {
            events::publish(&mut publisher, &event).await;
        }
        Ok(Err(AppError::NotFound(reason))) => {
            if let Command::AnalyzeJob(cmd) = &command {
                // Invalid command, not a system failure: no terminal event.
                error!(
                    "Application {} not found for user {} — aborting: {reason}",
                    cmd.application_id, cmd.user_id
                );
            } else {
                let event = failure_event(&command, reason);
                events::publish(&mut publisher, &event).await;
            }
        }
        Ok(Err(err)) => {
            error!("{kind} pipeline failed: {err}");
            let event = failure_event(&command, public_reason(&command, &err));
            events::publish(&mut publisher, &event).await;
        }
        Err(_elapsed) => {
            warn!("{kind} pipeline exceeded {}s deadline", deadline.as_secs());
            let event = timeout_event(&command);
            events::publish(&mut publisher, &event).await;
        }
    }

    info!("{kind} task finished");
}

async fn run_pipeline(state: &AppState, command: &Command) -> Result<Event, AppError> {
    match command {
        Command::AnalyzeJob(cmd) => analysis::analyze(state, cmd).await,
        Command::ParseCv(cmd) => cv::parse(state, cmd).await,
    }
}

/// Deadlines are configured per command kind and applied uniformly.
fn deadline_for(state: &AppState, command: &Command) -> Duration {
    let secs = match command {
        Command::AnalyzeJob(_) => state.config.analysis_timeout_secs,
        Command::ParseCv(_) => state.config.cv_parse_timeout_secs,
    };
    Duration::from_secs(secs)
}

/// Reason string carried in the failure event. Pipeline-level failures keep
/// their message; infrastructure errors (database, broker, internal) stay in
/// the logs and the event carries a generic reason.
fn public_reason(command: &Command, err: &AppError) -> String {
    match err {
        AppError::Content(msg) | AppError::Upstream(msg) | AppError::Validation(msg) => {
            msg.clone()
        }
        _ => match command {
            Command::AnalyzeJob(_) => "Analysis failed".to_string(),
            Command::ParseCv(_) => "CV parsing failed".to_string(),
        },
    }
}

fn failure_event(command: &Command, reason: String) -> Event {
    match command {
        Command::AnalyzeJob(cmd) => Event::AnalysisDone {
            application_id: cmd.application_id,
            user_id: cmd.user_id,
            match_score: None,
            has_cover_letter: false,
            analyzed_at: None,
            status: Some("error".to_string()),
            error: Some(reason),
        },
        Command::ParseCv(cmd) => Event::CvParsed {
            user_id: cmd.user_id,
            fields_updated: None,
            error: Some(reason),
        },
    }
}

fn timeout_event(command: &Command) -> Event {
    match command {
        Command::AnalyzeJob(cmd) => Event::AnalysisDone {
            application_id: cmd.application_id,
            user_id: cmd.user_id,
            match_score: None,
            has_cover_letter: false,
            analyzed_at: None,
            status: Some("timeout".to_string()),
            error: Some("Analysis exceeded max duration".to_string()),
        },
        Command::ParseCv(cmd) => Event::CvParsed {
            user_id: cmd.user_id,
            fields_updated: None,
            error: Some("CV parsing exceeded max duration".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::commands::AnalyzeJobCommand;
    use uuid::Uuid;

    fn analyze_command() -> Command {
        Command::AnalyzeJob(AnalyzeJobCommand {
            application_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            job_feed_id: None,
        })
    }

    #[test]
    fn test_infrastructure_errors_masked_in_event() {
        let err = AppError::Internal(anyhow::anyhow!("connection reset by peer"));
        assert_eq!(public_reason(&analyze_command(), &err), "Analysis failed");

        let db_err = AppError::Database(sqlx::Error::PoolClosed);
        assert_eq!(public_reason(&analyze_command(), &db_err), "Analysis failed");
    }

    #[test]
    fn test_pipeline_error_reason_preserved() {
        let err = AppError::Content("CV file not found on disk".to_string());
        let command = Command::ParseCv(crate::broker::commands::ParseCvCommand {
            user_id: Uuid::new_v4(),
            cv_url: "/uploads/cv.pdf".to_string(),
        });
        assert_eq!(public_reason(&command, &err), "CV file not found on disk");
    }

    #[test]
    fn test_timeout_event_carries_timeout_status() {
        let event = timeout_event(&analyze_command());
        match event {
            Event::AnalysisDone {
                status,
                match_score,
                has_cover_letter,
                ..
            } => {
                assert_eq!(status.as_deref(), Some("timeout"));
                assert_eq!(match_score, None);
                assert!(!has_cover_letter);
            }
            _ => panic!("wrong event kind"),
        }
    }

    #[test]
    fn test_failure_event_carries_reason() {
        let event = failure_event(&analyze_command(), "boom".to_string());
        match event {
            Event::AnalysisDone { status, error, .. } => {
                assert_eq!(status.as_deref(), Some("error"));
                assert_eq!(error.as_deref(), Some("boom"));
            }
            _ => panic!("wrong event kind"),
        }
    }

    /// A pipeline that never returns must produce exactly one timeout event
    /// once the deadline fires.
    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_yields_timeout() {
        let command = analyze_command();
        let deadline = Duration::from_secs(120);
        let pipeline = std::future::pending::<Result<Event, AppError>>();

        let event = match tokio::time::timeout(deadline, pipeline).await {
            Ok(_) => panic!("pending pipeline cannot complete"),
            Err(_elapsed) => timeout_event(&command),
        };

        match event {
            Event::AnalysisDone { status, .. } => {
                assert_eq!(status.as_deref(), Some("timeout"));
            }
            _ => panic!("wrong event kind"),
        }
    }
}

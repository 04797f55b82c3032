//! Typed outbound events.
//!
//! One terminal event concludes each accepted command; discovery publishes
//! one notification per newly created job_feed row. Events carry their own
//! `type` field in the body (the gateway SSE stream relies on it) and are
//! published on the channel of the same name.

use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

pub const EVENT_ANALYSIS_DONE: &str = "EVENT_ANALYSIS_DONE";
pub const EVENT_CV_PARSED: &str = "EVENT_CV_PARSED";
pub const EVENT_JOB_DISCOVERED: &str = "EVENT_JOB_DISCOVERED";

/// Per-field counts of what a CV parse wrote to the profile.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldCounts {
    pub skills: usize,
    pub experience: usize,
    pub education: usize,
    pub certifications: usize,
    pub projects: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "EVENT_ANALYSIS_DONE", rename_all = "camelCase")]
    AnalysisDone {
        application_id: Uuid,
        user_id: Uuid,
        match_score: Option<i64>,
        has_cover_letter: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        analyzed_at: Option<DateTime<Utc>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename = "EVENT_CV_PARSED", rename_all = "camelCase")]
    CvParsed {
        user_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        fields_updated: Option<FieldCounts>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename = "EVENT_JOB_DISCOVERED", rename_all = "camelCase")]
    JobDiscovered {
        job_feed_id: Uuid,
        user_id: Uuid,
        /// Empty string when the job was not tied to a search config.
        search_config_id: String,
    },
}

impl Event {
    pub fn channel(&self) -> &'static str {
        match self {
            Event::AnalysisDone { .. } => EVENT_ANALYSIS_DONE,
            Event::CvParsed { .. } => EVENT_CV_PARSED,
            Event::JobDiscovered { .. } => EVENT_JOB_DISCOVERED,
        }
    }
}

/// Publishes one event on its channel. Failures are logged, not propagated:
/// by the time we publish, pipeline work is already committed and retrying
/// through the supervisor would risk a second terminal event.
pub async fn publish(publisher: &mut MultiplexedConnection, event: &Event) {
    let channel = event.channel();
    let payload = match serde_json::to_string(event) {
        Ok(p) => p,
        Err(e) => {
            warn!("Failed to serialize {channel} event: {e}");
            return;
        }
    };

    match publisher.publish::<_, _, ()>(channel, &payload).await {
        Ok(()) => info!("{channel} published"),
        Err(e) => warn!("Failed to publish {channel}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> Uuid {
        Uuid::parse_str(s).unwrap()
    }

    #[test]
    fn test_analysis_done_success_shape() {
        let event = Event::AnalysisDone {
            application_id: uid("2f1a3cf2-3f62-4d6c-9d8f-f35c10a0a5b1"),
            user_id: uid("7c9e6679-7425-40de-944b-e07fc1f90ae7"),
            match_score: Some(73),
            has_cover_letter: true,
            analyzed_at: Some(Utc::now()),
            status: None,
            error: None,
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();

        assert_eq!(json["type"], "EVENT_ANALYSIS_DONE");
        assert_eq!(json["matchScore"], 73);
        assert_eq!(json["hasCoverLetter"], true);
        assert!(json.get("status").is_none());
        assert!(json.get("error").is_none());
        assert!(json.get("analyzedAt").is_some());
    }

    #[test]
    fn test_analysis_done_timeout_shape() {
        let event = Event::AnalysisDone {
            application_id: uid("2f1a3cf2-3f62-4d6c-9d8f-f35c10a0a5b1"),
            user_id: uid("7c9e6679-7425-40de-944b-e07fc1f90ae7"),
            match_score: None,
            has_cover_letter: false,
            analyzed_at: None,
            status: Some("timeout".to_string()),
            error: Some("Analysis exceeded max duration".to_string()),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();

        assert_eq!(json["status"], "timeout");
        assert_eq!(json["matchScore"], serde_json::Value::Null);
        assert!(json.get("analyzedAt").is_none());
    }

    #[test]
    fn test_cv_parsed_error_shape() {
        let event = Event::CvParsed {
            user_id: uid("7c9e6679-7425-40de-944b-e07fc1f90ae7"),
            fields_updated: None,
            error: Some("CV file not found on disk".to_string()),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();

        assert_eq!(json["type"], "EVENT_CV_PARSED");
        assert_eq!(json["error"], "CV file not found on disk");
        assert!(json.get("fieldsUpdated").is_none());
    }

    #[test]
    fn test_job_discovered_shape() {
        let event = Event::JobDiscovered {
            job_feed_id: uid("9b2a2cf1-07a1-4f2d-a3e2-1f1d7c3f4a01"),
            user_id: uid("7c9e6679-7425-40de-944b-e07fc1f90ae7"),
            search_config_id: String::new(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();

        assert_eq!(json["type"], "EVENT_JOB_DISCOVERED");
        assert_eq!(json["searchConfigId"], "");
        assert!(json.get("jobFeedId").is_some());
    }

    #[test]
    fn test_channel_matches_type_tag() {
        let event = Event::CvParsed {
            user_id: uid("7c9e6679-7425-40de-944b-e07fc1f90ae7"),
            fields_updated: Some(FieldCounts {
                skills: 3,
                experience: 2,
                education: 1,
                certifications: 0,
                projects: 1,
            }),
            error: None,
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(json["type"], event.channel());
        assert_eq!(json["fieldsUpdated"]["skills"], 3);
    }
}

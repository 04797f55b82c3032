//! Idempotent ingestion of discovered jobs.
//!
//! Identity is `(user_id, source_url)`. The existence check and the insert
//! run as one atomic statement, so concurrent calls with the same identity
//! converge on a single row — the production schema carries no usable UNIQUE
//! constraint on source_url, so `ON CONFLICT` is not an option here.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::discovery::JobPosting;

/// Result of one ingest call. `created` is true only for the call that
/// actually inserted the row; only that call triggers a discovery
/// notification downstream.
#[derive(Debug, Clone, Copy)]
pub struct Ingested {
    pub id: Uuid,
    pub created: bool,
}

pub async fn ingest_job(
    pool: &PgPool,
    user_id: Uuid,
    search_config_id: Option<Uuid>,
    posting: &JobPosting,
    is_manual: bool,
) -> Result<Ingested, sqlx::Error> {
    let row = sqlx::query(
        r#"
        WITH existing AS (
            SELECT id
            FROM job_feed
            WHERE user_id = $1 AND source_url = $2
            LIMIT 1
        ),
        inserted AS (
            INSERT INTO job_feed
                (user_id, search_config_id, source_url, status, raw_data, is_manual,
                 title, description, company_name, location, salary_min, salary_max)
            SELECT $1, $3, $2, 'PENDING', $4, $5, $6, $7, $8, $9, $10, $11
            WHERE NOT EXISTS (SELECT 1 FROM existing)
            RETURNING id
        )
        SELECT id, TRUE AS created FROM inserted
        UNION ALL
        SELECT id, FALSE AS created FROM existing
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(&posting.source_url)
    .bind(search_config_id)
    .bind(&posting.raw_data)
    .bind(is_manual)
    .bind(non_empty(&posting.title))
    .bind(non_empty(&posting.description))
    .bind(non_empty(&posting.company_name))
    .bind(non_empty(&posting.location))
    .bind(posting.salary_min)
    .bind(posting.salary_max)
    .fetch_one(pool)
    .await?;

    Ok(Ingested {
        id: row.try_get("id")?,
        created: row.try_get("created")?,
    })
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_maps_empty_to_null() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("Acme"), Some("Acme"));
    }
}

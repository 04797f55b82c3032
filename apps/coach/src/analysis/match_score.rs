//! MatchScore — keyword-based fit score between a candidate profile and a
//! job posting.
//!
//! Pure and deterministic: same inputs always produce the same score. The
//! final scaling uses integer arithmetic only, so results cannot drift
//! across platforms. A 30% keyword overlap saturates at 100.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Common English/French stop words ignored during keyword extraction.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "to", "in", "for", "with", "on", "at", "by", "from",
    "is", "are", "be", "as", "this", "that", "it", "we", "you", "our", "your", "have", "has",
    "will", "would", "can", "could", "should", "may", "must", "not", "more", "than", "also",
    "but", "if",
    // French
    "le", "la", "les", "de", "du", "des", "un", "une", "et", "ou", "en", "au", "aux", "par",
    "sur", "avec", "pour", "dans", "est", "sont", "nous", "vous", "ils", "qui", "que", "mais",
    "si", "plus", "très", "votre", "notre", "ses", "mon", "ton",
];

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-zA-ZÀ-ÿ][a-zA-ZÀ-ÿ0-9+#\-.]{1,}\b").unwrap())
}

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Lowercase, extract word-like tokens, drop stop words and short tokens.
fn tokenize(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    token_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .filter(|t| t.chars().count() > 2 && !stop_words().contains(t.as_str()))
        .collect()
}

/// Flatten profile skills + experience titles/descriptions into a keyword set.
fn extract_profile_keywords(skills: &[Value], experience: &[Value]) -> HashSet<String> {
    let mut parts: Vec<String> = Vec::new();

    for skill in skills {
        match skill {
            Value::String(s) => parts.push(s.clone()),
            Value::Object(map) => {
                let name = map.get("name").and_then(Value::as_str).unwrap_or("");
                let level = map.get("level").and_then(Value::as_str).unwrap_or("");
                parts.push(format!("{name} {level}"));
            }
            _ => {}
        }
    }

    for exp in experience {
        if let Value::Object(map) = exp {
            let mut line = String::new();
            for field in ["role", "title", "description"] {
                if let Some(text) = map.get(field).and_then(Value::as_str) {
                    line.push_str(text);
                    line.push(' ');
                }
            }
            parts.push(line);
        }
    }

    tokenize(&parts.join(" "))
}

/// Extract keywords from a job posting's raw payload (title, description,
/// company, contract type).
fn extract_job_keywords(raw_data: &Value) -> HashSet<String> {
    let parts = ["title", "description", "company", "contractType"]
        .iter()
        .map(|field| value_to_text(raw_data.get(*field).unwrap_or(&Value::Null)))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();

    tokenize(&parts.join(" "))
}

/// Coerce a loosely shaped JSON value into free text. Listing APIs nest
/// display values, e.g. `{"display_name": "..."}`.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            if let Some(Value::String(display)) = map.get("display_name") {
                return display.clone();
            }
            map.values()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        }
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

/// Compute a MatchScore in [0, 100] between the profile and the job posting.
///
/// An empty job keyword set means there is nothing to compare against and
/// returns the neutral value 50.
pub fn compute(skills: &[Value], experience: &[Value], raw_data: &Value) -> i64 {
    let profile_kw = extract_profile_keywords(skills, experience);
    let job_kw = extract_job_keywords(raw_data);

    if job_kw.is_empty() {
        return 50; // no data to compare — neutral, not a failure
    }

    let overlap = profile_kw.intersection(&job_kw).count() as i64;
    let total = job_kw.len() as i64;

    // raw = overlap / total * 100, then scaled by 100/30 so a 30% overlap
    // maps to the maximum. Integer arithmetic throughout.
    let scaled = overlap * 100 * 100 / (total * 30);
    scaled.clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn skills(names: &[&str]) -> Vec<Value> {
        names.iter().map(|n| json!(n)).collect()
    }

    #[test]
    fn test_empty_job_keywords_returns_neutral_50() {
        let score = compute(&skills(&["Python", "Docker"]), &[], &json!({}));
        assert_eq!(score, 50);
    }

    #[test]
    fn test_empty_profile_scores_zero() {
        let raw = json!({
            "title": "Backend Developer",
            "description": "Kubernetes Terraform Golang microservices experience required"
        });
        assert_eq!(compute(&[], &[], &raw), 0);
    }

    #[test]
    fn test_superset_profile_saturates_at_100() {
        let raw = json!({"title": "Python Docker", "description": "Python Docker"});
        let profile = skills(&[
            "Python",
            "Docker",
            "Kubernetes",
            "Terraform",
            "PostgreSQL",
        ]);
        assert_eq!(compute(&profile, &[], &raw), 100);
    }

    #[test]
    fn test_partial_overlap_lands_between_bounds() {
        let raw = json!({
            "description": "Seeking Python FastAPI Docker PostgreSQL developer \
                            with Kubernetes Terraform Ansible Jenkins experience"
        });
        let score = compute(&skills(&["Python", "Docker"]), &[], &raw);
        assert!(score > 0 && score < 100, "got {score}");
    }

    #[test]
    fn test_structured_skills_and_experience_contribute() {
        let profile_skills = vec![json!({"name": "Rust", "level": "expert"})];
        let experience = vec![json!({
            "title": "Backend engineer",
            "company": "Acme",
            "description": "Built gRPC services in Kubernetes"
        })];
        let raw = json!({"description": "Rust Kubernetes gRPC"});
        let score = compute(&profile_skills, &experience, &raw);
        assert_eq!(score, 100);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let raw = json!({"description": "Python Docker PostgreSQL Redis Kafka Spark Airflow"});
        let profile = skills(&["python", "redis"]);
        let first = compute(&profile, &[], &raw);
        for _ in 0..10 {
            assert_eq!(compute(&profile, &[], &raw), first);
        }
    }

    #[test]
    fn test_stop_words_and_short_tokens_ignored() {
        // Only stop words and len<3 tokens: job keyword set is empty.
        let raw = json!({"description": "the and of to in is a we"});
        assert_eq!(compute(&skills(&["python"]), &[], &raw), 50);
    }

    #[test]
    fn test_tokenizer_keeps_tech_punctuation() {
        let tokens = tokenize("Rust node.js front-end C++17 work");
        assert!(tokens.contains("node.js"));
        assert!(tokens.contains("front-end"));
        // Tokens must end on a word character, so "c++" alone is dropped
        // while "c++17" survives.
        assert!(tokens.contains("c++17"));
        assert!(!tokens.contains("c++"));
    }

    #[test]
    fn test_score_bounded_for_arbitrary_keyword_sets() {
        // Pseudo-random keyword sets from a fixed seed: bounds must hold for
        // every combination.
        let vocabulary = [
            "python", "rust", "docker", "kafka", "redis", "react", "terraform", "sql",
            "golang", "spark", "linux", "aws", "gcp", "ansible", "jenkins", "graphql",
        ];
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..200 {
            let mut profile = Vec::new();
            let mut job_words = Vec::new();
            for word in vocabulary {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                if seed & 1 == 1 {
                    profile.push(json!(word));
                }
                if seed & 2 == 2 {
                    job_words.push(word);
                }
            }
            let raw = json!({"description": job_words.join(" ")});
            let score = compute(&profile, &[], &raw);
            assert!((0..=100).contains(&score), "score {score} out of bounds");
        }
    }

    #[test]
    fn test_display_name_objects_flattened() {
        let raw = json!({
            "title": "Data Engineer",
            "company": {"display_name": "Acme Analytics"},
            "description": "Spark pipelines"
        });
        let score = compute(&skills(&["spark", "acme"]), &[], &raw);
        assert!(score > 0);
    }
}

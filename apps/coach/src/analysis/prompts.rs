//! Prompt templates for the analysis pipeline. Each function returns
//! `(system_prompt, user_prompt)` ready for the LLM client.

use serde_json::Value;

pub fn pros_cons_prompt(
    job_title: &str,
    job_description: &str,
    company: &str,
    profile_skills: &[String],
    profile_experience: &[Value],
    match_score: i64,
) -> (String, String) {
    let system = "You are an expert career coach. Analyse the fit between a candidate profile \
        and a job offer. You MUST respond with valid JSON only — no markdown, no explanation. \
        The JSON MUST follow this exact schema:\n\
        {\"pros\": [\"string\", ...], \"cons\": [\"string\", ...]}\n\
        Each pro/con should be a concrete, actionable sentence (max 20 words)."
        .to_string();

    let user = format!(
        "Job title: {job_title}\n\
         Company: {company}\n\
         Match score: {match_score}/100\n\n\
         Job description (truncated to 1500 chars):\n{}\n\n\
         Candidate skills: {}\n\n\
         Recent experience:\n{}\n\n\
         Give 3-5 pros and 2-4 cons. Be specific and honest.\n\
         Respond with JSON only.",
        truncate_chars(job_description, 1500),
        join_skills(profile_skills),
        format_experience(profile_experience),
    );

    (system, user)
}

pub fn cover_letter_prompt(
    job_title: &str,
    company: &str,
    job_description: &str,
    full_name: &str,
    profile_skills: &[String],
    profile_experience: &[Value],
) -> (String, String) {
    let system = "You are a professional cover letter writer. Write a concise, compelling cover \
        letter tailored to the job and the candidate's background. \
        The letter should be in the same language as the job description. \
        Keep it under 300 words. Use a professional but human tone."
        .to_string();

    let candidate = if full_name.is_empty() {
        "the candidate"
    } else {
        full_name
    };

    let user = format!(
        "Write a cover letter for:\n\n\
         Position: {job_title} at {company}\n\
         Candidate name: {candidate}\n\
         Skills: {}\n\n\
         Experience:\n{}\n\n\
         Job description (truncated):\n{}\n\n\
         Output ONLY the cover letter text (no subject line, no JSON wrapper).",
        join_skills(profile_skills),
        format_experience(profile_experience),
        truncate_chars(job_description, 1200),
    );

    (system, user)
}

pub fn cv_suggestions_prompt(
    job_title: &str,
    job_description: &str,
    profile_skills: &[String],
) -> (String, String) {
    let system = "You are an ATS (Applicant Tracking System) expert. Analyse the job description \
        and suggest concrete improvements to make the candidate's CV rank higher. \
        You MUST respond with valid JSON only.\n\
        Schema: {\"suggestions\": [\"string\", ...]}\n\
        Give 3-5 actionable bullet points. Focus on keywords to add, skills to highlight, \
        and formatting best practices."
        .to_string();

    let listed = if profile_skills.is_empty() {
        "None".to_string()
    } else {
        profile_skills.join(", ")
    };

    let user = format!(
        "Target role: {job_title}\n\
         Current skills listed: {listed}\n\
         Job description keywords (first 1000 chars): {}\n\n\
         What specific changes should the candidate make to their CV?\n\
         Respond with JSON only.",
        truncate_chars(job_description, 1000),
    );

    (system, user)
}

fn join_skills(skills: &[String]) -> String {
    if skills.is_empty() {
        "Not specified".to_string()
    } else {
        skills.join(", ")
    }
}

/// Formats the three most recent experience entries as prompt bullet lines.
fn format_experience(experience: &[Value]) -> String {
    if experience.is_empty() {
        return "No experience provided.".to_string();
    }
    experience
        .iter()
        .take(3)
        .map(|item| {
            let role = item
                .get("role")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .or_else(|| item.get("title").and_then(Value::as_str))
                .unwrap_or("Unknown role");
            let company = item.get("company").and_then(Value::as_str).unwrap_or("");
            let description = item
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("");
            format!("- {role} at {company}: {}", truncate_chars(description, 150))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pros_cons_prompt_includes_score_and_skills() {
        let (system, user) = pros_cons_prompt(
            "Backend Developer",
            "Build APIs",
            "Acme",
            &["Python".to_string(), "Docker".to_string()],
            &[],
            73,
        );
        assert!(system.contains("valid JSON only"));
        assert!(user.contains("73/100"));
        assert!(user.contains("Python, Docker"));
        assert!(user.contains("No experience provided."));
    }

    #[test]
    fn test_cover_letter_prompt_falls_back_to_generic_candidate() {
        let (_, user) = cover_letter_prompt("Dev", "Acme", "desc", "", &[], &[]);
        assert!(user.contains("Candidate name: the candidate"));
    }

    #[test]
    fn test_format_experience_prefers_role_over_title() {
        let experience = vec![json!({
            "role": "Lead Engineer",
            "title": "ignored",
            "company": "Acme",
            "description": "Owned the platform"
        })];
        let formatted = format_experience(&experience);
        assert!(formatted.contains("Lead Engineer at Acme"));
        assert!(!formatted.contains("ignored"));
    }

    #[test]
    fn test_experience_capped_at_three_entries() {
        let experience: Vec<Value> = (0..5)
            .map(|i| json!({"title": format!("Role {i}"), "company": "X", "description": ""}))
            .collect();
        let formatted = format_experience(&experience);
        assert_eq!(formatted.lines().count(), 3);
    }

    #[test]
    fn test_description_truncation() {
        let long = "x".repeat(5000);
        let (_, user) = cv_suggestions_prompt("Dev", &long, &[]);
        assert!(user.len() < 2000);
    }
}

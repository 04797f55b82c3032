//! Prompt template for structured CV extraction.

pub fn cv_extract_prompt(cv_text: &str) -> (String, String) {
    let system = "You are an expert HR data extractor. Parse the following CV/résumé text and \
        return ONLY a valid JSON object with these exact keys:\n\
        {\n\
        \"skills\": [{\"name\": \"string\", \"level\": \"beginner|intermediate|expert\"}],\n\
        \"experience\": [{\"title\": \"string\", \"company\": \"string\", \"start\": \"YYYY-MM\", \
        \"end\": \"YYYY-MM or present\", \"description\": \"string\"}],\n\
        \"education\": [{\"degree\": \"string\", \"school\": \"string\", \"year\": 2024}],\n\
        \"certifications\": [{\"name\": \"string\", \"issuer\": \"string\", \"year\": 2024}],\n\
        \"projects\": [{\"name\": \"string\", \"description\": \"string\", \"technologies\": [\"string\"]}]\n\
        }\n\
        Rules:\n\
        - Infer skill levels from context (years, job titles, project complexity).\n\
        - Use empty arrays [] for sections absent from the CV.\n\
        - Do NOT include any text outside the JSON object.\n\
        - Dates: use YYYY-MM format; use 'present' for current roles."
        .to_string();

    let user = format!("CV text:\n\n{cv_text}");
    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_cv_text_and_schema() {
        let (system, user) = cv_extract_prompt("Jane Doe — Rust engineer");
        assert!(system.contains("certifications"));
        assert!(user.contains("Jane Doe"));
    }
}

//! Red-flag keyword filter. Case-insensitive substring match against the
//! configured disqualifying keywords.

pub fn has_red_flag(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|kw| lower.contains(kw.as_str()))
}

//! Personalization scoring.
//!
//! Weighted presence check of recipient profile attributes in generated
//! text. Pure and deterministic: case-sensitive substring matches against
//! the literal fields supplied, no fuzzy matching.

use scribe_types::content::RecipientProfile;

/// Weight for the recipient's name appearing in the text.
const NAME_WEIGHT: f64 = 0.30;
/// Weight for the recipient's company appearing in the text.
const COMPANY_WEIGHT: f64 = 0.25;
/// Weight for the recipient's industry appearing in the text.
const INDUSTRY_WEIGHT: f64 = 0.20;
/// Weight for any of the recipient's interest terms appearing in the text.
const INTEREST_WEIGHT: f64 = 0.25;

/// Score how much of a recipient profile was woven into the text, in [0, 1].
pub fn personalization_score(text: &str, profile: &RecipientProfile) -> f64 {
    let mut score = 0.0;

    if field_present(text, profile.name.as_deref()) {
        score += NAME_WEIGHT;
    }
    if field_present(text, profile.company.as_deref()) {
        score += COMPANY_WEIGHT;
    }
    if field_present(text, profile.industry.as_deref()) {
        score += INDUSTRY_WEIGHT;
    }
    if profile
        .interests
        .iter()
        .any(|interest| !interest.is_empty() && text.contains(interest.as_str()))
    {
        score += INTEREST_WEIGHT;
    }

    score.min(1.0)
}

fn field_present(text: &str, field: Option<&str>) -> bool {
    match field {
        Some(value) => !value.is_empty() && text.contains(value),
        None => false,
    }
}

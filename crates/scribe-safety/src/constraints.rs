//! Domain constraint validation for generated text.
//!
//! Case-insensitive substring containment checks against caller-supplied
//! required and forbidden terms. Fails closed: the first missing required
//! term or present forbidden term raises immediately, naming the term.

use scribe_types::errors::GenerationError;

/// Check generated text against required and forbidden terms.
pub fn validate_constraints(
    text: &str,
    must_include: &[String],
    must_avoid: &[String],
) -> Result<(), GenerationError> {
    let haystack = text.to_lowercase();

    for term in must_include {
        if !haystack.contains(&term.to_lowercase()) {
            return Err(GenerationError::ConstraintViolation(format!(
                "missing required content: \"{term}\""
            )));
        }
    }

    for term in must_avoid {
        if haystack.contains(&term.to_lowercase()) {
            return Err(GenerationError::ConstraintViolation(format!(
                "prohibited content: \"{term}\""
            )));
        }
    }

    Ok(())
}

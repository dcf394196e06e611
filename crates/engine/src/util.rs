//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every write path enforces the same rules.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, MAX_TRANSACTION_CENTS, MoneyCents, ResultEngine, ValidationErrors};

pub(crate) const DESCRIPTION_MIN_CHARS: usize = 3;
pub(crate) const DESCRIPTION_MAX_CHARS: usize = 500;
pub(crate) const ACCOUNT_NAME_MAX_CHARS: usize = 50;

/// Trim a description and record a length error on `errors`.
pub(crate) fn validate_description(value: &str, errors: &mut ValidationErrors) -> String {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < DESCRIPTION_MIN_CHARS {
        errors.add(
            "description",
            format!("is too short (minimum is {DESCRIPTION_MIN_CHARS} characters)"),
        );
    } else if len > DESCRIPTION_MAX_CHARS {
        errors.add(
            "description",
            format!("is too long (maximum is {DESCRIPTION_MAX_CHARS} characters)"),
        );
    }
    trimmed.to_string()
}

/// Transaction amounts are strictly positive and bounded.
pub(crate) fn validate_amount(amount: MoneyCents, errors: &mut ValidationErrors) {
    if !amount.is_positive() {
        errors.add("amount_cents", "must be greater than 0");
    } else if amount.cents() > MAX_TRANSACTION_CENTS {
        errors.add(
            "amount_cents",
            format!("must be less than or equal to {MAX_TRANSACTION_CENTS}"),
        );
    }
}

/// Trim a required name, rejecting blanks and names over `max_chars`.
pub(crate) fn normalize_required_name(
    value: &str,
    field: &'static str,
    max_chars: usize,
) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::invalid(field, "can't be blank"));
    }
    if trimmed.chars().count() > max_chars {
        return Err(EngineError::invalid(
            field,
            format!("is too long (maximum is {max_chars} characters)"),
        ));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Case and accent insensitive key used for category uniqueness.
///
/// "Alimentação", " alimentacao " and "ALIMENTAÇÃO" share the same key.
pub(crate) fn normalize_category_key(input: &str) -> ResultEngine<String> {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let normalized = out.trim();
    if normalized.is_empty() {
        return Err(EngineError::invalid("name", "can't be blank"));
    }
    Ok(normalized.to_string())
}

/// Lowercased, trimmed email. Only a minimal shape check is done.
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(EngineError::invalid("email", "is invalid")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_length_is_counted_in_chars() {
        let mut errors = ValidationErrors::new();
        assert_eq!(validate_description("  Pão ", &mut errors), "Pão");
        assert!(errors.is_empty());

        validate_description("ab", &mut errors);
        assert!(errors.has("description"));

        let mut errors = ValidationErrors::new();
        validate_description(&"x".repeat(501), &mut errors);
        assert!(errors.has("description"));
    }

    #[test]
    fn amount_bounds() {
        let mut errors = ValidationErrors::new();
        validate_amount(MoneyCents::new(1), &mut errors);
        validate_amount(MoneyCents::new(MAX_TRANSACTION_CENTS), &mut errors);
        assert!(errors.is_empty());

        validate_amount(MoneyCents::ZERO, &mut errors);
        assert!(errors.has("amount_cents"));

        let mut errors = ValidationErrors::new();
        validate_amount(MoneyCents::new(MAX_TRANSACTION_CENTS + 1), &mut errors);
        assert!(errors.has("amount_cents"));
    }

    #[test]
    fn category_key_ignores_case_and_accents() {
        assert_eq!(normalize_category_key("Alimentação").unwrap(), "alimentacao");
        assert_eq!(
            normalize_category_key("  Casa &  Contas ").unwrap(),
            "casa contas"
        );
        assert!(normalize_category_key(" -- ").is_err());
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(normalize_email(" Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(normalize_email("ana").is_err());
        assert!(normalize_email("@example.com").is_err());
    }
}

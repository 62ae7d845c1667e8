//! Input validation helpers
//!
//! Text length constants and the checks shared by the menu form,
//! the waitlist form and the login form.

use crate::error::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Menu names, customer names
pub const MAX_NAME_LEN: usize = 100;

/// Menu descriptions
pub const MAX_NOTE_LEN: usize = 1000;

/// Origin line, single tag / allergen token
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Tags / allergens per item
pub const MAX_TOKENS: usize = 20;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Media URLs
pub const MAX_URL_LEN: usize = 2048;

/// Separator used when tags / allergens are edited as one text field
pub const TOKEN_DELIMITER: char = ',';

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        )
        .with_detail("field", field));
    }
    validate_len(value, field, max_len)
}

/// 长度按字符计，韩文一个音节算一个
pub fn validate_len(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({len} chars, max {max_len})"
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate an ordered token list (tags / allergens).
pub fn validate_tokens(tokens: &[String], field: &str) -> Result<(), AppError> {
    if tokens.len() > MAX_TOKENS {
        return Err(AppError::validation(format!(
            "{field} has too many entries ({}, max {MAX_TOKENS})",
            tokens.len()
        ))
        .with_detail("field", field));
    }
    for token in tokens {
        validate_required_text(token, field, MAX_SHORT_TEXT_LEN)?;
        // 编辑表单用逗号拼接，单个标签里不能再带逗号
        if token.contains(TOKEN_DELIMITER) {
            return Err(AppError::validation(format!(
                "{field} entries must not contain '{TOKEN_DELIMITER}'"
            ))
            .with_detail("field", field));
        }
    }
    Ok(())
}

/// 登录表单：两项都不能超长，空值由调用方处理
pub fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    validate_len(email, "email", MAX_EMAIL_LEN)?;
    validate_len(password, "password", MAX_PASSWORD_LEN)
}

/// 媒体地址只接受 http / https
pub fn validate_media_url(value: &Option<String>) -> Result<(), AppError> {
    let Some(url) = value else {
        return Ok(());
    };
    validate_len(url, "media_url", MAX_URL_LEN)?;
    let lower = url.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(
            AppError::validation("media_url must be an http(s) URL").with_detail("field", "media_url")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_rejects_blank() {
        let err = validate_required_text("   ", "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
    }

    #[test]
    fn test_length_counts_chars() {
        // 3 syllables, 9 bytes
        assert!(validate_len("김치찌", "name", 3).is_ok());
        assert!(validate_len("김치찌개", "name", 3).is_err());
    }

    #[test]
    fn test_media_url_scheme() {
        assert!(validate_media_url(&None).is_ok());
        assert!(validate_media_url(&Some("https://cdn.example.com/a.jpg".into())).is_ok());
        assert!(validate_media_url(&Some("ftp://x/a.jpg".into())).is_err());
    }

    #[test]
    fn test_tokens_reject_blank_entry() {
        assert!(validate_tokens(&["추천".into()], "tags").is_ok());
        assert!(validate_tokens(&["".into()], "tags").is_err());
    }

    #[test]
    fn test_tokens_reject_delimiter() {
        let err = validate_tokens(&["매운맛, 중간".into()], "tags").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(validate_tokens(&["매운맛".into(), "중간".into()], "tags").is_ok());
    }

    #[test]
    fn test_credentials_length() {
        assert!(validate_credentials("admin@menu.kr", "pw-123456").is_ok());
        let long_email = format!("{}@menu.kr", "a".repeat(MAX_EMAIL_LEN));
        assert!(validate_credentials(&long_email, "pw").is_err());
        assert!(validate_credentials("a@b.c", &"p".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }
}

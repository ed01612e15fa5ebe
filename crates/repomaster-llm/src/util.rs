//! Error text helpers shared by the chat client and the probes

use crate::error::ApiErrorKind;
use repomaster_core::mask_api_key;

/// Longest error message passed on to the user
const MAX_ERROR_LEN: usize = 300;

/// Business error code Z.ai returns when the account balance is exhausted
pub const ZAI_INSUFFICIENT_BALANCE_CODE: &str = "1113";

/// Classify a raw provider error message
///
/// Balance is checked before auth since Z.ai balance errors can also
/// mention the key.
#[must_use]
pub fn classify_api_error(raw: &str) -> ApiErrorKind {
    let lower = raw.to_lowercase();

    if raw.contains(ZAI_INSUFFICIENT_BALANCE_CODE) || lower.contains("balance") || raw.contains("余额") {
        return ApiErrorKind::InsufficientBalance;
    }

    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("invalid")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
        || lower.contains("api key")
        || lower.contains("apikey")
    {
        return ApiErrorKind::Auth;
    }

    if lower.contains("429") || lower.contains("rate limit") {
        return ApiErrorKind::RateLimit;
    }

    ApiErrorKind::Other
}

/// Sanitize a provider error for display
///
/// Any occurrence of `secret` is masked and overly long messages are cut.
#[must_use]
pub fn sanitize_api_error(error: &str, secret: Option<&str>) -> String {
    let mut text = error.to_string();
    if let Some(secret) = secret.filter(|s| !s.is_empty()) {
        text = text.replace(secret, &mask_api_key(secret));
    }

    if text.chars().count() > MAX_ERROR_LEN {
        let cut: String = text.chars().take(MAX_ERROR_LEN).collect();
        format!("{cut}...(truncated)")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_balance() {
        assert_eq!(
            classify_api_error(r#"{"error":{"code":"1113","message":"Insufficient balance"}}"#),
            ApiErrorKind::InsufficientBalance
        );
        assert_eq!(
            classify_api_error("Your account balance is too low"),
            ApiErrorKind::InsufficientBalance
        );
    }

    #[test]
    fn test_classify_auth() {
        assert_eq!(
            classify_api_error("invalid_api_key: Incorrect API key provided"),
            ApiErrorKind::Auth
        );
        assert_eq!(classify_api_error("HTTP status 401 Unauthorized"), ApiErrorKind::Auth);
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(classify_api_error("Too many requests: rate limit"), ApiErrorKind::RateLimit);
        assert_eq!(classify_api_error("connection refused"), ApiErrorKind::Other);
    }

    #[test]
    fn test_sanitize_masks_secret() {
        let key = "abcd1234efgh5678";
        let out = sanitize_api_error(&format!("bad key {key} rejected"), Some(key));
        assert_eq!(out, "bad key abcd...5678 rejected");
        assert!(!out.contains(key));
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(400);
        let out = sanitize_api_error(&long, None);
        assert!(out.ends_with("...(truncated)"));
        assert_eq!(out.chars().count(), 300 + "...(truncated)".len());
    }
}

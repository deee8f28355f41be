//! Logging utilities with sensitive data redaction.
//!
//! File download URLs carry signed query parameters that authorize the
//! fetch; anything logged goes through [`redact_url`] first.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber for the CLI.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Redact a token, preserving the type prefix for debugging
pub fn redact_token(token: &str) -> String {
    if token.len() <= 8 {
        "[REDACTED]".to_string()
    } else {
        format!("{}...[REDACTED]", &token[..8])
    }
}

/// Redact a URL, hiding credentials in query parameters
pub fn redact_url(url: &str) -> String {
    if let Some(query_start) = url.find('?') {
        let (base, query) = url.split_at(query_start);
        format!("{}{}", base, redact_query_params(query))
    } else {
        url.to_string()
    }
}

fn redact_query_params(query: &str) -> String {
    let sensitive_params = ["token", "t", "key", "secret", "signature", "api_key"];

    let mut result = String::from("?");
    let params = query.trim_start_matches('?');

    for (i, pair) in params.split('&').enumerate() {
        if i > 0 {
            result.push('&');
        }

        if let Some(eq_pos) = pair.find('=') {
            let (key, _value) = pair.split_at(eq_pos);
            if sensitive_params.iter().any(|&s| key.eq_ignore_ascii_case(s)) {
                result.push_str(key);
                result.push_str("=[REDACTED]");
            } else {
                result.push_str(pair);
            }
        } else {
            result.push_str(pair);
        }
    }

    result
}

//! Provider-specific authentication headers.

use crate::core::builtin_providers::find_builtin_provider;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic wants `x-api-key` plus a version header; everything else,
/// including unknown providers and the audio API, takes a bearer token.
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    provider_id: &str,
    api_key: &str,
) -> reqwest::RequestBuilder {
    if find_builtin_provider(provider_id).is_some_and(|p| p.is_anthropic_mode()) {
        return request
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
    }

    request.header("Authorization", format!("Bearer {api_key}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(provider: &str) -> reqwest::Request {
        let client = reqwest::Client::new();
        add_auth_headers(client.get("https://example.com"), provider, "test-key")
            .build()
            .expect("request should build")
    }

    #[test]
    fn test_anthropic_auth_headers() {
        let request = build("anthropic");
        let headers = request.headers();
        assert_eq!(headers["x-api-key"], "test-key");
        assert_eq!(headers["anthropic-version"], ANTHROPIC_VERSION);
        assert!(headers.get("authorization").is_none());
    }

    #[test]
    fn test_bearer_auth_headers() {
        for provider in ["openai", "groq", "custom-provider"] {
            let request = build(provider);
            assert_eq!(request.headers()["authorization"], "Bearer test-key");
        }
    }
}

//! Endpoint URL construction.

/// Strip trailing slashes so endpoint joins never produce `//`.
///
/// ```
/// use lingo::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:3001/"), "http://localhost:3001");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path.
///
/// ```
/// use lingo::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.groq.com/openai/v1/", "/chat/completions"),
///     "https://api.groq.com/openai/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}

//! URL helpers for the generation endpoint.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use codecorrect::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.example.com/v1beta/"), "https://api.example.com/v1beta");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash between them.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Streaming endpoint for `model`, asking for server-sent events.
///
/// A `models/` prefix on the model name is tolerated so that identifiers
/// copied from the API's model listing work unchanged.
///
/// ```
/// use codecorrect::utils::url::stream_generate_url;
///
/// assert_eq!(
///     stream_generate_url("https://generativelanguage.googleapis.com/v1beta", "gemini-1.5-flash"),
///     "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
/// );
/// ```
pub fn stream_generate_url(base_url: &str, model: &str) -> String {
    let model = model.trim().trim_start_matches("models/");
    construct_api_url(
        base_url,
        &format!("models/{model}:streamGenerateContent?alt=sse"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("http://127.0.0.1:8080///", "/models/x"),
            "http://127.0.0.1:8080/models/x"
        );
    }

    #[test]
    fn model_prefix_is_not_doubled() {
        assert_eq!(
            stream_generate_url("http://localhost/v1beta/", "models/gemini-1.5-pro"),
            "http://localhost/v1beta/models/gemini-1.5-pro:streamGenerateContent?alt=sse"
        );
    }
}

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

/// Connection settings for one OpenAI-compatible service (embeddings or
/// chat). Passed explicitly into client constructors; nothing is read from
/// the process environment inside the core.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
    /// Extra headers sent with every request, e.g. the `HTTP-Referer`
    /// header some API gateways require.
    pub extra_headers: Vec<(String, String)>,
}

impl ServiceConfig {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model_name: model_name.into(),
            extra_headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub(crate) fn header_map(&self) -> Result<HeaderMap, String> {
        if self.api_key.trim().is_empty() {
            return Err("missing api key".to_string());
        }
        if self.model_name.trim().is_empty() {
            return Err("missing model name".to_string());
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|error| format!("invalid api key: {error}"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in &self.extra_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|error| format!("invalid header name {name:?}: {error}"))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|error| format!("invalid header value for {name:?}: {error}"))?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceConfig;

    #[test]
    fn header_map_includes_extra_headers() {
        let config = ServiceConfig::new("key", "https://example.test/v1", "model")
            .with_header("HTTP-Referer", "http://localhost:8501");
        let headers = config.header_map().expect("headers should build");

        assert_eq!(
            headers
                .get("http-referer")
                .and_then(|value| value.to_str().ok()),
            Some("http://localhost:8501")
        );
        assert!(headers.contains_key("authorization"));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let config = ServiceConfig::new("  ", "https://example.test/v1", "model");
        assert!(config.header_map().is_err());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ServiceConfig::new("key", "https://example.test/v1/", "model");
        assert_eq!(config.endpoint("embeddings"), "https://example.test/v1/embeddings");
    }
}

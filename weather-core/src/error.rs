use thiserror::Error;

/// Failure talking to a weather or geocoding backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the upstream text when the body carried
    /// one, otherwise the HTTP reason phrase or a generic fallback.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid API response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Text suitable for showing to a user, preferring the upstream message.
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Failure reading or writing the durable preference store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode storage file: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("Failed to encode storage file: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Could not determine platform data directory")]
    NoDataDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_user_message_is_upstream_text() {
        let err = ProviderError::Api { status: 404, message: "city not found".into() };
        assert_eq!(err.user_message(), "city not found");
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn other_errors_fall_back_to_display() {
        let err = ProviderError::Unavailable("no api key".into());
        assert_eq!(err.user_message(), "Provider unavailable: no api key");
    }
}

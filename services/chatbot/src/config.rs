//! Application Configuration Module
//!
//! Loads the chatbot settings once at startup from the process environment
//! (and a `.env` file when present). The resulting struct is read-only and
//! handed to the adapters at construction.

use chatbot_native_utils::capture::ListenSettings;
use cloud_speech::Credential;
use gemini_client::GenerationConfig;
use secrecy::SecretString;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api.duckduckgo.com";
pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";
pub const DEFAULT_UPLOAD_SAMPLE_RATE: u32 = 16000;
pub const DEFAULT_LISTEN_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 3;
/// Snippets in formatted search results are cut to this many characters.
pub const SEARCH_SNIPPET_CHARS: usize = 100;

#[derive(Debug)]
pub struct GeminiSettings {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    pub generation: GenerationConfig,
}

#[derive(Debug)]
pub struct SpeechSettings {
    pub credential: Credential,
    pub base_url: String,
    pub language_code: String,
    /// Sample rate assumed for uploaded audio, which is passed through as-is.
    pub upload_sample_rate: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub base_url: String,
    pub max_results: usize,
    pub snippet_chars: usize,
}

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub gemini: GeminiSettings,
    pub speech: SpeechSettings,
    pub listen: ListenSettings,
    pub search: SearchSettings,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `GEMINI_API_KEY`: Required. Key for the generative-language API.
    // *   `GEMINI_MODEL`, `GEMINI_BASE_URL`: (Optional) Model and endpoint root.
    // *   `SPEECH_API_KEY`: (Optional) Speech key. Defaults to `GEMINI_API_KEY`.
    // *   `GOOGLE_CLOUD_ACCESS_TOKEN`: (Optional) Service-account token, switches speech to bearer auth.
    // *   `SPEECH_BASE_URL`, `SPEECH_LANGUAGE`, `UPLOAD_SAMPLE_RATE`: (Optional) Speech settings.
    // *   `LISTEN_TIMEOUT_SECS`: (Optional) Microphone listening window. Defaults to 5.
    // *   `SEARCH_BASE_URL`, `SEARCH_MAX_RESULTS`: (Optional) Web search settings.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup. Empty
    /// values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let gemini_key = get("GEMINI_API_KEY")
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY must be set".to_string()))?;

        let credential = match get("GOOGLE_CLOUD_ACCESS_TOKEN") {
            Some(token) => Credential::AccessToken(SecretString::from(token)),
            None => {
                let speech_key = get("SPEECH_API_KEY").unwrap_or_else(|| gemini_key.clone());
                Credential::ApiKey(SecretString::from(speech_key))
            }
        };

        let gemini = GeminiSettings {
            api_key: SecretString::from(gemini_key),
            model: get("GEMINI_MODEL").unwrap_or_else(|| gemini_client::DEFAULT_MODEL.to_string()),
            base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| gemini_client::DEFAULT_BASE_URL.to_string()),
            generation: GenerationConfig::default(),
        };

        let speech = SpeechSettings {
            credential,
            base_url: get("SPEECH_BASE_URL")
                .unwrap_or_else(|| cloud_speech::DEFAULT_BASE_URL.to_string()),
            language_code: get("SPEECH_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string()),
            upload_sample_rate: parse_or(&get, "UPLOAD_SAMPLE_RATE", DEFAULT_UPLOAD_SAMPLE_RATE)?,
        };
        if speech.upload_sample_rate == 0 {
            return Err(ConfigError::InvalidValue(
                "UPLOAD_SAMPLE_RATE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let listen = ListenSettings {
            timeout: Duration::from_secs(parse_or(
                &get,
                "LISTEN_TIMEOUT_SECS",
                DEFAULT_LISTEN_TIMEOUT_SECS,
            )?),
            ..ListenSettings::default()
        };

        let search = SearchSettings {
            base_url: get("SEARCH_BASE_URL").unwrap_or_else(|| DEFAULT_SEARCH_BASE_URL.to_string()),
            max_results: parse_or(&get, "SEARCH_MAX_RESULTS", DEFAULT_SEARCH_MAX_RESULTS)?,
            snippet_chars: SEARCH_SNIPPET_CHARS,
        };

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = get("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue("RUST_LOG".to_string(), log_level_str.clone())
        })?;

        Ok(Self {
            gemini,
            speech,
            listen,
            search,
            log_level,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), format!("{raw:?}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_the_required_key() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g-key")])).unwrap();

        assert_eq!(config.gemini.api_key.expose_secret(), "g-key");
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.gemini.generation, GenerationConfig::default());
        match &config.speech.credential {
            Credential::ApiKey(key) => assert_eq!(key.expose_secret(), "g-key"),
            other => panic!("expected the gemini key to be reused, got {other:?}"),
        }
        assert_eq!(config.speech.language_code, "en-US");
        assert_eq!(config.speech.upload_sample_rate, 16000);
        assert_eq!(config.listen.timeout, Duration::from_secs(5));
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.search.snippet_chars, 100);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup(&[("GEMINI_MODEL", "gemini-pro")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn test_empty_api_key_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn test_access_token_switches_speech_to_bearer_auth() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g-key"),
            ("SPEECH_API_KEY", "s-key"),
            ("GOOGLE_CLOUD_ACCESS_TOKEN", "ya29.token"),
        ]))
        .unwrap();
        match &config.speech.credential {
            Credential::AccessToken(token) => assert_eq!(token.expose_secret(), "ya29.token"),
            other => panic!("expected an access token, got {other:?}"),
        }
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g-key"),
            ("SPEECH_API_KEY", "s-key"),
            ("LISTEN_TIMEOUT_SECS", "8"),
            ("SEARCH_MAX_RESULTS", "5"),
            ("UPLOAD_SAMPLE_RATE", "44100"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        match &config.speech.credential {
            Credential::ApiKey(key) => assert_eq!(key.expose_secret(), "s-key"),
            other => panic!("expected the speech key, got {other:?}"),
        }
        assert_eq!(config.listen.timeout, Duration::from_secs(8));
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.speech.upload_sample_rate, 44100);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g-key"),
            ("SEARCH_MAX_RESULTS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "SEARCH_MAX_RESULTS"));

        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g-key"),
            ("UPLOAD_SAMPLE_RATE", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "UPLOAD_SAMPLE_RATE"));
    }

    #[test]
    fn test_invalid_log_level() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g-key"), ("RUST_LOG", "loud")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "RUST_LOG"));
    }
}

use crate::config::GeminiSettings;
use async_trait::async_trait;
use chatbot_core::{AdapterError, Outcome, TextGeneration};
use gemini_client::{GeminiClient, GeminiError, GenerationConfig};

/// An adapter that implements `TextGeneration` on top of `gemini_client::GeminiClient`.
pub struct GeminiAdapter {
    client: GeminiClient,
    generation: GenerationConfig,
}

impl GeminiAdapter {
    pub fn new(settings: GeminiSettings) -> Self {
        let client =
            GeminiClient::with_endpoint(settings.api_key, &settings.base_url, &settings.model);
        Self {
            client,
            generation: settings.generation,
        }
    }
}

fn to_adapter_error(err: GeminiError) -> AdapterError {
    if err.is_malformed() {
        AdapterError::Malformed(err.to_string())
    } else {
        AdapterError::Upstream(err.to_string())
    }
}

#[async_trait]
impl TextGeneration for GeminiAdapter {
    async fn generate(&self, prompt: &str) -> Outcome {
        tracing::debug!("Generating a response with {}", self.client.model());
        self.client
            .generate_text(prompt, self.generation.clone())
            .await
            .map_err(|e| {
                tracing::warn!("Gemini request failed: {}", e);
                to_adapter_error(e)
            })
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbot_core::ErrorKind;
    use mockito::Matcher;
    use secrecy::SecretString;

    fn adapter_for(server: &mockito::ServerGuard) -> GeminiAdapter {
        GeminiAdapter::new(GeminiSettings {
            api_key: SecretString::from("test-key".to_string()),
            model: "gemini-2.0-flash".to_string(),
            base_url: server.url(),
            generation: GenerationConfig::default(),
        })
    }

    #[tokio::test]
    async fn test_generate_returns_model_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "generationConfig": {
                    "temperature": 1.0,
                    "topK": 40,
                    "topP": 0.95,
                    "maxOutputTokens": 8192,
                    "responseMimeType": "text/plain"
                }
            })))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"4"}]}}]}"#)
            .create_async()
            .await;

        let outcome = adapter_for(&server).generate("What is 2+2?").await;

        assert_eq!(outcome, Outcome::ok("4"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_2xx_is_an_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body(r#"{"error":{"code":500,"message":"Internal error encountered."}}"#)
            .create_async()
            .await;

        let outcome = adapter_for(&server).generate("hi").await;

        assert_eq!(outcome.kind(), Some(ErrorKind::UpstreamError));
        let text = outcome.display_text();
        assert!(text.starts_with("Error: "), "{text}");
        assert!(text.contains("Internal error encountered."), "{text}");
    }

    #[tokio::test]
    async fn test_refused_connection_is_upstream_without_key() {
        let adapter = GeminiAdapter::new(GeminiSettings {
            api_key: SecretString::from("SUPER-SECRET-KEY".to_string()),
            model: "gemini-2.0-flash".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
            generation: GenerationConfig::default(),
        });

        let outcome = adapter.generate("hi").await;

        assert_eq!(outcome.kind(), Some(ErrorKind::UpstreamError));
        let text = outcome.display_text();
        assert!(text.starts_with("Error: "), "{text}");
        assert!(!text.contains("SUPER-SECRET-KEY"), "{text}");
        assert!(!text.contains("key="), "{text}");
    }

    #[tokio::test]
    async fn test_missing_text_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let outcome = adapter_for(&server).generate("hi").await;
        assert_eq!(outcome.kind(), Some(ErrorKind::MalformedResponse));
    }
}

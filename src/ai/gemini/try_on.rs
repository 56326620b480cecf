use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use crate::ai::TryOnService;
use crate::config::Config;
use crate::encoder::EncodedImage;
use crate::{prompts, Error, Result};
use async_trait::async_trait;

const EMPTY_RESPONSE_MESSAGE: &str =
    "The model did not return an image. It may have been blocked by safety filters";

pub struct GeminiTryOnClient {
    http: GeminiHttpClient,
}

impl GeminiTryOnClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: GeminiHttpClient::from_config(config, reqwest::Client::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn new(api_key: String, model: String) -> Self {
        Self {
            http: GeminiHttpClient::new(api_key, model),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    fn build_request(person: &EncodedImage, clothing: &EncodedImage) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::image(&person.media_type, &person.payload),
                    Part::image(&clothing.media_type, &clothing.payload),
                    Part::Text {
                        text: prompts::TRY_ON_INSTRUCTION.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[async_trait]
impl TryOnService for GeminiTryOnClient {
    async fn generate(&self, person: &EncodedImage, clothing: &EncodedImage) -> Result<String> {
        if !self.http.has_api_key() {
            return Err(Error::Configuration(
                "Gemini API key is missing. Set GEMINI_API_KEY".to_string(),
            ));
        }

        tracing::info!(
            "Requesting try-on from Gemini (model: {}, person: {}, clothing: {})",
            self.http.model(),
            person.media_type,
            clothing.media_type
        );

        let request = Self::build_request(person, clothing);
        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        match response.first_image_payload() {
            Some(payload) => {
                tracing::debug!("Gemini returned image payload ({} chars)", payload.len());
                Ok(payload.to_string())
            }
            None => {
                let message = match response.refusal_reason() {
                    Some(reason) => format!("{}: {}", EMPTY_RESPONSE_MESSAGE, reason),
                    None => EMPTY_RESPONSE_MESSAGE.to_string(),
                };
                tracing::warn!("{}", message);
                Err(Error::EmptyResponse(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use wiremock::matchers::{body_string_contains, header};
    use wiremock::{MockServer, ResponseTemplate};

    const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

    fn make_client(server: &MockServer, api_key: &str) -> GeminiTryOnClient {
        GeminiTryOnClient::new(api_key.to_string(), DEFAULT_MODEL.to_string())
            .with_base_url(server.uri())
    }

    fn person() -> EncodedImage {
        EncodedImage::new("cGVyc29u", "image/jpeg")
    }

    fn clothing() -> EncodedImage {
        EncodedImage::new("c2hpcnQ=", "image/png")
    }

    fn image_response(payload: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": { "mimeType": "image/png", "data": payload }
                    }]
                },
                "finishReason": "STOP"
            }]
        }))
    }

    #[tokio::test]
    async fn test_generate_returns_inline_image_payload() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(image_response("Zm9v"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "key");
        let payload = client.generate(&person(), &clothing()).await.unwrap();
        assert_eq!(payload, "Zm9v");
    }

    #[tokio::test]
    async fn test_request_carries_both_images_instruction_and_image_modality() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains(
                r#""inlineData":{"mimeType":"image/jpeg","data":"cGVyc29u"}"#,
            ))
            .and(body_string_contains(
                r#""inlineData":{"mimeType":"image/png","data":"c2hpcnQ="}"#,
            ))
            .and(body_string_contains(r#""responseModalities":["IMAGE"]"#))
            .respond_with(image_response("Zm9v"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        client.generate(&person(), &clothing()).await.unwrap();
    }

    #[tokio::test]
    async fn test_model_is_part_of_the_path() {
        let server = MockServer::start().await;

        test_support::post_path_regex(r"/v1beta/models/gemini-custom:generateContent")
            .respond_with(image_response("Zm9v"))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiTryOnClient::new("key".to_string(), "models/gemini-custom".to_string())
            .with_base_url(server.uri());
        client.generate(&person(), &clothing()).await.unwrap();
    }

    #[tokio::test]
    async fn test_text_only_response_is_empty_response_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "I cannot help with that" }] }
                }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "key");
        let err = client.generate(&person(), &clothing()).await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse(_)));
        assert!(!err.to_string().contains("I cannot help"));
    }

    #[tokio::test]
    async fn test_blocked_prompt_reports_block_reason() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "key");
        let err = client.generate(&person(), &clothing()).await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse(_)));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_api_error_is_transport_error_with_generic_message() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(503).set_body_string("backend overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "key");
        let err = client.generate(&person(), &clothing()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(!err.to_string().contains("backend overloaded"));
        assert!(err.detail().contains("backend overloaded"));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_transport_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = make_client(&server, "key");
        let err = client.generate(&person(), &clothing()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let client = GeminiTryOnClient::new("key".to_string(), DEFAULT_MODEL.to_string())
            .with_base_url(uri);
        let err = client.generate(&person(), &clothing()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error_without_request() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(image_response("Zm9v"))
            .expect(0)
            .mount(&server)
            .await;

        let client = make_client(&server, "");
        let err = client.generate(&person(), &clothing()).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_from_config_uses_configured_model() {
        let config = Config::new("key".to_string())
            .unwrap()
            .with_model("gemini-other".to_string());
        let client = GeminiTryOnClient::from_config(&config);
        assert_eq!(client.model(), "gemini-other");
    }

    #[test]
    fn test_request_parts_are_person_clothing_instruction() {
        let request = GeminiTryOnClient::build_request(&person(), &clothing());
        let parts = &request.contents[0].parts;

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].image_payload(), Some("cGVyc29u"));
        assert_eq!(parts[1].image_payload(), Some("c2hpcnQ="));
        assert!(matches!(&parts[2], Part::Text { text } if text == prompts::TRY_ON_INSTRUCTION));
    }
}

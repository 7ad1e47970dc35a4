use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DeeplConfig;
use crate::error::{Result, SrtError};
use super::handler::TranslationHandler;

const FREE_API_ENDPOINT: &str = "https://api-free.deepl.com";
const PRO_API_ENDPOINT: &str = "https://api.deepl.com";

/// DeepL answers 456 when the character quota is used up.
const QUOTA_EXCEEDED: u16 = 456;

#[derive(Debug, Clone, Serialize)]
struct TranslateRequest<'a> {
    text: Vec<&'a str>,
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Clone, Deserialize)]
struct Translation {
    #[serde(default)]
    detected_source_language: Option<String>,
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub character_count: usize,
    pub character_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`TranslationHandler`] backed by the DeepL REST API.
pub struct DeeplHandler {
    client: Client,
    endpoint: String,
    api_key: String,
    chars: usize,
    limit: usize,
}

impl DeeplHandler {
    /// Build the client and seed the quota figures from `/v2/usage`.
    pub async fn connect(config: &DeeplConfig, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = if config.endpoint.is_empty() {
            endpoint_for_key(api_key).to_string()
        } else {
            config.endpoint.trim_end_matches('/').to_string()
        };

        let mut handler = Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            chars: 0,
            limit: 0,
        };
        handler.refresh_usage().await?;

        info!(
            "Connected to DeepL at {} ({} of {} characters used)",
            handler.endpoint, handler.chars, handler.limit
        );
        Ok(handler)
    }

    /// Re-read the period usage from the API.
    pub async fn refresh_usage(&mut self) -> Result<Usage> {
        let url = format!("{}/v2/usage", self.endpoint);
        debug!("Fetching DeepL usage from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| SrtError::Provider(format!("HTTP request failed: {}", e)))?;

        let body = check_status(response).await?.text().await?;
        let usage: Usage = serde_json::from_str(&body)?;

        self.chars = usage.character_count;
        self.limit = usage.character_limit;
        Ok(usage)
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }
}

#[async_trait]
impl TranslationHandler for DeeplHandler {
    async fn translate(
        &mut self,
        source_language: &str,
        target_language: &str,
        text: &str,
    ) -> Result<String> {
        let request = TranslateRequest {
            text: vec![text],
            target_lang: target_language_code(target_language),
            source_lang: source_language_code(source_language),
        };

        let url = format!("{}/v2/translate", self.endpoint);
        debug!(
            "Sending translation request to: {} ({:?} -> {})",
            url, request.source_lang, request.target_lang
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| SrtError::Provider(format!("HTTP request failed: {}", e)))?;

        let body = check_status(response).await?.text().await?;
        let body: TranslateResponse = serde_json::from_str(&body)?;

        let translation = body
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| SrtError::Provider("Empty translation received".to_string()))?;

        if let Some(detected) = &translation.detected_source_language {
            debug!("DeepL detected source language: {}", detected);
        }

        self.chars += text.chars().count();
        Ok(translation.text)
    }

    fn check_quota(&self, additional_chars: usize) -> bool {
        self.chars + additional_chars <= self.limit
    }

    fn chars(&self) -> usize {
        self.chars
    }

    fn limit(&self) -> usize {
        self.limit
    }
}

/// Free-tier keys carry a `:fx` suffix and must use the free endpoint.
pub fn endpoint_for_key(api_key: &str) -> &'static str {
    if api_key.trim().ends_with(":fx") {
        FREE_API_ENDPOINT
    } else {
        PRO_API_ENDPOINT
    }
}

/// DeepL source languages have no regional variants (`PT-BR` is sent as `PT`);
/// empty means auto-detect.
fn source_language_code(language: &str) -> Option<String> {
    let code = language.trim().to_uppercase();
    code.split(['-', '_'])
        .next()
        .filter(|primary| !primary.is_empty())
        .map(str::to_string)
}

/// Plain `EN` is no longer accepted as a target, default it to British English.
fn target_language_code(language: &str) -> String {
    let code = language.trim().to_uppercase();
    if code == "EN" {
        "EN-GB".to_string()
    } else {
        code
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&error_text)
        .map(|body| body.message)
        .unwrap_or(error_text);

    if status.as_u16() == QUOTA_EXCEEDED {
        return Err(SrtError::Provider(format!(
            "DeepL quota exceeded: {}",
            detail
        )));
    }

    Err(SrtError::Provider(format!(
        "DeepL API error {}: {}",
        status, detail
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    const USAGE_BODY: &str = r#"{"character_count":180118,"character_limit":500000}"#;

    /// Local HTTP server answering one connection per canned `(status, body)`.
    /// Resolves to the raw requests it received.
    async fn stub_server(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);

                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });

        (endpoint, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn stub_config(endpoint: String) -> DeeplConfig {
        DeeplConfig {
            endpoint,
            timeout_secs: 5,
            ..DeeplConfig::default()
        }
    }

    #[test]
    fn test_endpoint_for_key() {
        assert_eq!(endpoint_for_key("abc-123:fx"), FREE_API_ENDPOINT);
        assert_eq!(endpoint_for_key("abc-123"), PRO_API_ENDPOINT);
    }

    #[test]
    fn test_source_language_code() {
        assert_eq!(source_language_code(""), None);
        assert_eq!(source_language_code("EN-GB"), Some("EN".to_string()));
        assert_eq!(source_language_code("en-us"), Some("EN".to_string()));
        assert_eq!(source_language_code("de"), Some("DE".to_string()));
        assert_eq!(source_language_code("PT-BR"), Some("PT".to_string()));
        assert_eq!(source_language_code("zh_hans"), Some("ZH".to_string()));
    }

    #[test]
    fn test_target_language_code() {
        assert_eq!(target_language_code("EN"), "EN-GB");
        assert_eq!(target_language_code("en-us"), "EN-US");
        assert_eq!(target_language_code("fr"), "FR");
    }

    #[test]
    fn test_request_omits_empty_source_language() {
        let request = TranslateRequest {
            text: vec!["Hello"],
            target_lang: target_language_code("de"),
            source_lang: source_language_code(""),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"text": ["Hello"], "target_lang": "DE"}));
    }

    #[test]
    fn test_parse_translate_response() {
        let body: TranslateResponse = serde_json::from_str(
            r#"{"translations":[{"detected_source_language":"EN","text":"Hallo"}]}"#,
        )
        .unwrap();
        assert_eq!(body.translations[0].text, "Hallo");
        assert_eq!(body.translations[0].detected_source_language.as_deref(), Some("EN"));
    }

    #[test]
    fn test_parse_usage() {
        let usage: Usage =
            serde_json::from_str(r#"{"character_count":180118,"character_limit":500000}"#).unwrap();
        assert_eq!(usage.character_count, 180_118);
        assert_eq!(usage.character_limit, 500_000);
    }

    #[tokio::test]
    async fn test_connect_seeds_usage() {
        let (endpoint, server) = stub_server(vec![(200, USAGE_BODY)]).await;

        let handler = DeeplHandler::connect(&stub_config(endpoint), "secret-key").await.unwrap();
        assert_eq!(handler.chars(), 180_118);
        assert_eq!(handler.limit(), 500_000);
        assert!(handler.check_quota(319_882));
        assert!(!handler.check_quota(319_883));

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /v2/usage "));
        assert!(requests[0]
            .to_lowercase()
            .contains("authorization: deepl-auth-key secret-key"));
    }

    #[tokio::test]
    async fn test_translate_sends_request_and_counts_chars() {
        let (endpoint, server) = stub_server(vec![
            (200, USAGE_BODY),
            (200, r#"{"translations":[{"detected_source_language":"PT","text":"Hallo\nWelt"}]}"#),
        ])
        .await;

        let mut handler = DeeplHandler::connect(&stub_config(endpoint), "secret-key").await.unwrap();
        let translated = handler.translate("pt-br", "de", "Olá\nMundo").await.unwrap();

        assert_eq!(translated, "Hallo\nWelt");
        assert_eq!(handler.chars(), 180_118 + 9);

        let requests = server.await.unwrap();
        assert!(requests[1].starts_with("POST /v2/translate "));
        assert!(requests[1].contains(r#""target_lang":"DE""#));
        assert!(requests[1].contains(r#""source_lang":"PT""#));
    }

    #[tokio::test]
    async fn test_quota_exceeded_status_is_provider_error() {
        let (endpoint, server) = stub_server(vec![
            (200, USAGE_BODY),
            (456, r#"{"message":"Quota Exceeded"}"#),
        ])
        .await;

        let mut handler = DeeplHandler::connect(&stub_config(endpoint), "secret-key").await.unwrap();
        let err = handler.translate("", "FR", "Hello").await.unwrap_err();

        match err {
            SrtError::Provider(message) => {
                assert!(message.contains("quota exceeded"));
                assert!(message.contains("Quota Exceeded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(handler.chars(), 180_118);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_and_bad_body() {
        let (endpoint, server) = stub_server(vec![(403, "Forbidden")]).await;
        let err = DeeplHandler::connect(&stub_config(endpoint), "bad-key").await.err().unwrap();
        assert!(matches!(&err, SrtError::Provider(message) if message.contains("403")));
        server.await.unwrap();

        let (endpoint, server) = stub_server(vec![(200, "not json")]).await;
        let err = DeeplHandler::connect(&stub_config(endpoint), "secret-key").await.err().unwrap();
        assert!(matches!(err, SrtError::Json(_)));
        server.await.unwrap();
    }
}

use std::{future::Future, pin::Pin, time::Duration};

use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::REQUEST_TIMEOUT_SECS;

use super::{SearchModel, WebSearch};

pub const MAX_TOKENS: usize = 500;
const BASE_URL: &str = "https://api.perplexity.ai";

/// Perplexity's OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone)]
pub struct Perplexity {
    client: Client,
    api_key: String,
    base_url: String,
    model: SearchModel,
    timeout: Duration,
}

impl Perplexity {
    pub fn new(api_key: String, model: SearchModel) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: BASE_URL.into(),
            model,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl WebSearch for Perplexity {
    fn query<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>> {
        Box::pin(async move {
            let body = ChatRequest {
                model: self.model.to_string(),
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                max_tokens: MAX_TOKENS,
            };

            let res = self
                .client
                .post(format!(
                    "{}/chat/completions",
                    self.base_url.trim_end_matches('/')
                ))
                .timeout(self.timeout)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .context("sending search request")?;

            if !res.status().is_success() {
                let status = res.status();
                let body = res.text().await.unwrap_or_default();
                return Err(eyre!("Perplexity error {status}: {body}"));
            }

            let completion: ChatResponse = res.json().await.context("parsing search response")?;
            debug!(
                "Search used {:?} tokens",
                completion.usage.as_ref().map(|u| u.total_tokens)
            );
            Ok(first_choice(completion))
        })
    }
}

fn first_choice(completion: ChatResponse) -> Option<String> {
    completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
}

//
// ===== OpenAI wire types =====
//

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: String,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: usize,
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    use super::*;

    fn search_for(server: &MockServer, api_key: &str, model: SearchModel) -> reqwest::Result<Perplexity> {
        Ok(Perplexity::new(api_key.into(), model)
            .with_client(Client::builder().no_proxy().build()?)
            .with_base_url(server.uri()))
    }

    #[test]
    fn request_serialization() {
        let body = ChatRequest {
            model: SearchModel::SonarPro.to_string(),
            messages: vec![ChatMessage {
                role: "user",
                content: "Sony WH-1000XM4 price",
            }],
            max_tokens: MAX_TOKENS,
        };

        let expect = expect![[r#"{"model":"sonar-pro","messages":[{"role":"user","content":"Sony WH-1000XM4 price"}],"max_tokens":500}"#]];
        expect.assert_eq(&serde_json::to_string(&body).unwrap());
    }

    #[test]
    fn empty_choices() {
        let completion: ChatResponse = serde_json::from_str(r#"{"id":"x","choices":[]}"#).unwrap();
        assert_eq!(first_choice(completion), None);
    }

    #[tokio::test]
    async fn query_returns_first_choice() -> color_eyre::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer perp-key"))
            .and(body_partial_json(json!({
                "model": "sonar-pro",
                "messages": [{"role": "user", "content": "price?"}],
                "max_tokens": 500,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"id":"1","model":"sonar-pro","choices":[{"index":0,"message":{"role":"assistant","content":"About $278."}},{"index":1,"message":{"role":"assistant","content":"ignored"}}],"usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let search = search_for(&server, "perp-key", SearchModel::SonarPro)?;
        assert_eq!(search.query("price?").await?, Some("About $278.".into()));
        Ok(())
    }

    #[tokio::test]
    async fn every_model_is_sent_by_its_api_name() -> color_eyre::Result<()> {
        for (model, name) in [
            (SearchModel::Sonar, "sonar"),
            (SearchModel::SonarPro, "sonar-pro"),
            (SearchModel::SonarReasoning, "sonar-reasoning"),
        ] {
            let server = MockServer::start().await;
            Mock::given(body_partial_json(json!({ "model": name })))
                .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"choices":[]}"#, "application/json"))
                .expect(1)
                .mount(&server)
                .await;

            let search = search_for(&server, "k", model)?;
            assert_eq!(search.query("price?").await?, None);
        }
        Ok(())
    }

    #[tokio::test]
    async fn query_reports_status() -> color_eyre::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":{"message":"Invalid API key"}}"#))
            .mount(&server)
            .await;

        let search = search_for(&server, "nope", SearchModel::Sonar)?;
        let err = search.query("price?").await.unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("Invalid API key"));
        Ok(())
    }
}

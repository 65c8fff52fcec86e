use std::time::Duration;

use base64::Engine as _;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::vision::{NO_DESCRIPTION, VisionError};

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 250;
pub const TOP_P: f32 = 0.8;
pub const TOP_K: u32 = 40;

#[derive(Debug)]
pub struct Request {
    pub api_key: String,
    pub url: String,
    pub data: RequestBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    pub contents: Vec<Content>,
    pub safety_settings: Vec<SafetySetting>,
    pub generation_config: GenerationConfig,
}

impl RequestBody {
    /// Inline image followed by the instruction, with the fixed sampling and safety setup.
    pub fn identify(jpeg: &[u8], prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::InlineData(Blob {
                        mime_type: "image/jpeg",
                        data: base64::engine::general_purpose::STANDARD.encode(jpeg),
                    }),
                    Part::Text(prompt.into()),
                ],
            }],
            safety_settings: vec![
                SafetySetting {
                    category: HarmCategory::Harassment,
                    threshold: HarmBlockThreshold::BlockMediumAndAbove,
                },
                SafetySetting {
                    category: HarmCategory::HateSpeech,
                    threshold: HarmBlockThreshold::BlockMediumAndAbove,
                },
            ],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                top_p: TOP_P,
                top_k: TOP_K,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(Blob),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: &'static str,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

pub async fn send_request(
    req: Request,
    client: &reqwest::Client,
    timeout: Duration,
) -> Result<GenerateContentResponse, VisionError> {
    let res = client
        .post(&req.url)
        .timeout(timeout)
        .header("x-goog-api-key", &req.api_key)
        .json(&req.data)
        .send()
        .await?;

    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        return Err(VisionError::Api { status, body });
    }

    debug!("Gemini response: {body}");
    if body.trim().is_empty() {
        return Err(VisionError::EmptyResponse);
    }

    Ok(serde_json::from_str(&body)?)
}

/// Extracts the text of the first candidate. A candidate without text yields
/// [`NO_DESCRIPTION`]; no candidate at all is an error.
pub fn response_text(response: GenerateContentResponse) -> Result<String, VisionError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(
            match response.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => VisionError::Blocked { reason },
                None => VisionError::EmptyResponse,
            },
        );
    };

    if let Some(reason) = &candidate.finish_reason {
        debug!("Finish reason: {reason}");
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        Ok(NO_DESCRIPTION.into())
    } else {
        Ok(text.into())
    }
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    fn parse(src: &str) -> GenerateContentResponse {
        serde_json::from_str(src).unwrap()
    }

    #[test]
    fn request_serialization() {
        let body = RequestBody::identify(b"jpg", "What is this?");

        let expect = expect![[r#"{"contents":[{"role":"user","parts":[{"inlineData":{"mimeType":"image/jpeg","data":"anBn"}},{"text":"What is this?"}]}],"safetySettings":[{"category":"HARM_CATEGORY_HARASSMENT","threshold":"BLOCK_MEDIUM_AND_ABOVE"},{"category":"HARM_CATEGORY_HATE_SPEECH","threshold":"BLOCK_MEDIUM_AND_ABOVE"}],"generationConfig":{"temperature":0.7,"maxOutputTokens":250,"topP":0.8,"topK":40}}"#]];
        expect.assert_eq(&serde_json::to_string(&body).unwrap());
    }

    #[test]
    fn text_parts_are_joined() {
        let resp = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"Nikon "},{"text":"D3500"}],"role":"model"},"finishReason":"STOP","index":0}],"usageMetadata":{"totalTokenCount":12}}"#,
        );
        assert_eq!(response_text(resp).unwrap(), "Nikon D3500");
    }

    #[test]
    fn empty_text_falls_back() {
        let resp = parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#);
        assert_eq!(response_text(resp).unwrap(), NO_DESCRIPTION);

        let resp = parse(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#);
        assert_eq!(response_text(resp).unwrap(), NO_DESCRIPTION);
    }

    #[test]
    fn missing_candidates() {
        let err = response_text(parse("{}")).unwrap_err();
        assert!(matches!(err, VisionError::EmptyResponse));

        let err =
            response_text(parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)).unwrap_err();
        assert!(matches!(err, VisionError::Blocked { reason } if reason == "SAFETY"));
    }
}

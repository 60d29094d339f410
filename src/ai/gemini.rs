use serde::{Deserialize, Serialize};

use super::parser::parse_analysis_response;
use super::types::{DocumentAnalysis, DocumentAnalyzer};
use super::AiError;
use crate::config;

/// Gemini HTTP client for document image analysis.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Create a client against the given endpoint.
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config::GEMINI_MODEL.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Client configured from the environment (`GEMINI_API_KEY`).
    pub fn from_env() -> Result<Self, AiError> {
        let api_key = std::env::var(config::GEMINI_API_KEY_VAR)
            .map_err(|_| AiError::MissingApiKey(config::GEMINI_API_KEY_VAR))?;
        Ok(Self::new(
            &api_key,
            config::GEMINI_BASE_URL,
            config::AI_TIMEOUT_SECS,
        ))
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn call_generate(&self, prompt: &str, images: &[String]) -> Result<String, AiError> {
        let mut parts = vec![Part::Text { text: prompt }];
        for image in images {
            parts.push(Part::Image {
                inline_data: InlineData {
                    mime_type: "image/jpeg",
                    data: strip_data_url(image),
                },
            });
        }

        let body = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                top_k: 32,
                top_p: 1,
                max_output_tokens: 2048,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                AiError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                AiError::Timeout(self.timeout_secs)
            } else {
                AiError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AiError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| AiError::MalformedResponse("no candidates in response".into()))
    }
}

impl DocumentAnalyzer for GeminiClient {
    fn analyze(&self, images: &[String], type_hint: &str) -> Result<DocumentAnalysis, AiError> {
        let prompt = build_analysis_prompt(type_hint);
        let text = self.call_generate(&prompt, images)?;
        parse_analysis_response(&text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Minimal instruction asking for the JSON shape the parser expects.
fn build_analysis_prompt(type_hint: &str) -> String {
    format!(
        "Analyze this government document image (expected type: {type_hint}). \
         Extract all identity fields you can read, including document_type, \
         full_name, document_number, date_of_birth, issue_date and expiry_date. \
         Respond with a single JSON object: \
         {{\"extracted_data\": {{...}}, \"confidence\": 0.0-1.0, \
         \"quality_score\": 0.0-1.0, \"fraud_risk\": 0.0-1.0, \
         \"recommendations\": [], \"issues\": []}}"
    )
}

/// Strip a `data:<mime>;base64,` prefix so only the payload is sent.
fn strip_data_url(payload: &str) -> &str {
    if payload.starts_with("data:") {
        payload
            .split_once(',')
            .map(|(_, data)| data)
            .unwrap_or(payload)
    } else {
        payload
    }
}

// Request body for Gemini generateContent
#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'static str,
    data: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: u32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

// Response body from Gemini generateContent
#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Mock analyzer for testing — returns a configurable analysis or fails.
pub struct MockAnalyzer {
    analysis: DocumentAnalysis,
    fail: bool,
}

impl MockAnalyzer {
    /// A healthy analyzer with a plausible national-id reading.
    pub fn healthy() -> Self {
        let mut analysis = DocumentAnalysis {
            confidence: 0.92,
            quality_score: 0.88,
            fraud_risk: 0.15,
            recommendations: vec!["Verify against registry".into()],
            ..DocumentAnalysis::default()
        };
        analysis
            .extracted_fields
            .insert("full_name".into(), "John Doe".into());
        analysis
            .extracted_fields
            .insert("document_number".into(), "1234567890".into());
        Self {
            analysis,
            fail: false,
        }
    }

    /// An analyzer returning exactly the given analysis.
    pub fn returning(analysis: DocumentAnalysis) -> Self {
        Self {
            analysis,
            fail: false,
        }
    }

    /// An analyzer whose every call fails (endpoint down).
    pub fn failing() -> Self {
        Self {
            analysis: DocumentAnalysis::default(),
            fail: true,
        }
    }

    /// Add an extracted field to the canned analysis.
    pub fn with_field(mut self, key: &str, value: &str) -> Self {
        self.analysis
            .extracted_fields
            .insert(key.into(), value.into());
        self
    }
}

impl DocumentAnalyzer for MockAnalyzer {
    fn analyze(&self, _images: &[String], _type_hint: &str) -> Result<DocumentAnalysis, AiError> {
        if self.fail {
            return Err(AiError::Connection("mock endpoint".into()));
        }
        Ok(self.analysis.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

use serde::Deserialize;
use serde_json::Value;

use super::types::DocumentAnalysis;
use super::AiError;

/// Score defaults applied when the model omits a field. Chosen so a
/// sparse but well-formed response still yields a usable block.
const DEFAULT_CONFIDENCE: f32 = 0.8;
const DEFAULT_QUALITY: f32 = 0.8;
const DEFAULT_FRAUD_RISK: f32 = 0.2;

/// Parse the model's text reply into a `DocumentAnalysis`.
///
/// Accepts a bare JSON object or one wrapped in Markdown code fences.
/// Field values are coerced leniently: numbers and booleans become
/// strings, nulls are dropped.
pub fn parse_analysis_response(response: &str) -> Result<DocumentAnalysis, AiError> {
    let json_str = extract_json(response);

    let raw: RawAnalysis = serde_json::from_str(json_str)
        .map_err(|e| AiError::MalformedResponse(e.to_string()))?;

    let extracted_fields = raw
        .extracted_data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| value_to_string(&v).map(|s| (k, s)))
        .collect();

    Ok(DocumentAnalysis {
        extracted_fields,
        confidence: clamp_score(raw.confidence, DEFAULT_CONFIDENCE),
        quality_score: clamp_score(raw.quality_score, DEFAULT_QUALITY),
        fraud_risk: clamp_score(raw.fraud_risk, DEFAULT_FRAUD_RISK),
        recommendations: strings_lenient(raw.recommendations),
        issues: strings_lenient(raw.issues),
    })
}

#[derive(Deserialize)]
struct RawAnalysis {
    extracted_data: Option<serde_json::Map<String, Value>>,
    confidence: Option<f64>,
    quality_score: Option<f64>,
    fraud_risk: Option<f64>,
    recommendations: Option<Vec<Value>>,
    issues: Option<Vec<Value>>,
}

/// Slice the JSON body out of a possibly fenced response.
fn extract_json(response: &str) -> &str {
    if let Some(start) = response.find("```json") {
        let body = &response[start + 7..];
        match body.find("```") {
            Some(end) => body[..end].trim(),
            None => body.trim(),
        }
    } else if let Some(start) = response.find("```") {
        let body = &response[start + 3..];
        match body.find("```") {
            Some(end) => body[..end].trim(),
            None => body.trim(),
        }
    } else {
        response.trim()
    }
}

fn clamp_score(value: Option<f64>, default: f32) -> f32 {
    match value {
        Some(v) => (v as f32).clamp(0.0, 1.0),
        None => default,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn strings_lenient(values: Option<Vec<Value>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .iter()
        .filter_map(value_to_string)
        .collect()
}

use serde::Deserialize;
use std::collections::HashMap;

use super::{ClassificationResult, ClassifyError};
use crate::emotion::Emotion;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Body of the `/predict` response as sent over the wire.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    emotion: Option<String>,
    confidence: Option<f64>,
    probabilities: Option<HashMap<String, f64>>,
}

/// Decode a `/predict` response body.
pub fn parse_predict_body(body: &[u8]) -> Result<ClassificationResult, ClassifyError> {
    let response: PredictResponse = serde_json::from_slice(body)
        .map_err(|err| ClassifyError::Malformed(format!("invalid JSON body: {err}")))?;

    let Some(probabilities) = response.probabilities else {
        return Err(ClassifyError::Incomplete);
    };

    let label = response
        .emotion
        .ok_or_else(|| ClassifyError::Malformed("missing `emotion`".into()))?
        .parse::<Emotion>()
        .map_err(|err| ClassifyError::Malformed(err.to_string()))?;

    let confidence = response
        .confidence
        .ok_or_else(|| ClassifyError::Malformed("missing `confidence`".into()))?;
    ensure_unit_interval("confidence", confidence)?;

    let mut distribution = HashMap::with_capacity(Emotion::ALL.len());
    for (name, value) in probabilities {
        let Ok(emotion) = name.parse::<Emotion>() else {
            log_debug!("ignoring probability for unknown category {:?}", name);
            continue;
        };
        ensure_unit_interval(emotion.as_str(), value)?;
        distribution.insert(emotion, value);
    }

    Ok(ClassificationResult {
        label,
        confidence,
        distribution,
    })
}

fn ensure_unit_interval(field: &str, value: f64) -> Result<(), ClassifyError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ClassifyError::Malformed(format!(
            "`{field}` = {value} is outside [0, 1]"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_response_becomes_result() {
        let body = br#"{
            "emotion": "Happy",
            "confidence": 0.8,
            "probabilities": {"Happy": 0.8, "Sad": 0.1, "Neutral": 0.1}
        }"#;
        let result = parse_predict_body(body).unwrap();
        assert_eq!(result.label, Emotion::Happy);
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.distribution.len(), 3);
        assert_eq!(result.probability(Emotion::Sad), 0.1);
        assert_eq!(result.probability(Emotion::Fear), 0.0);
    }

    #[test]
    fn label_is_not_rederived_from_distribution() {
        let body = br#"{"emotion": "Sad", "confidence": 0.2, "probabilities": {"Happy": 0.9}}"#;
        let result = parse_predict_body(body).unwrap();
        assert_eq!(result.label, Emotion::Sad);
        assert_eq!(result.confidence, 0.2);
    }

    #[test]
    fn missing_probabilities_is_incomplete() {
        let body = br#"{"emotion": "Happy", "confidence": 0.8}"#;
        assert!(parse_predict_body(body).unwrap_err().is_incomplete());

        let body = br#"{"emotion": "Happy", "confidence": 0.8, "probabilities": null}"#;
        assert!(parse_predict_body(body).unwrap_err().is_incomplete());
    }

    #[test]
    fn missing_label_or_confidence_is_malformed() {
        let body = br#"{"confidence": 0.8, "probabilities": {}}"#;
        assert!(matches!(
            parse_predict_body(body),
            Err(ClassifyError::Malformed(_))
        ));

        let body = br#"{"emotion": "Happy", "probabilities": {}}"#;
        assert!(matches!(
            parse_predict_body(body),
            Err(ClassifyError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_label_is_malformed() {
        let body = br#"{"emotion": "Bored", "confidence": 0.5, "probabilities": {}}"#;
        assert!(matches!(
            parse_predict_body(body),
            Err(ClassifyError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_probability_keys_are_ignored() {
        let body = br#"{"emotion": "Fear", "confidence": 0.5, "probabilities": {"Fear": 0.5, "Bored": 0.5}}"#;
        let result = parse_predict_body(body).unwrap();
        assert_eq!(result.distribution.len(), 1);
    }

    #[test]
    fn out_of_range_values_are_malformed() {
        let body = br#"{"emotion": "Fear", "confidence": 1.5, "probabilities": {}}"#;
        assert!(matches!(
            parse_predict_body(body),
            Err(ClassifyError::Malformed(_))
        ));

        let body = br#"{"emotion": "Fear", "confidence": 0.5, "probabilities": {"Sad": -0.1}}"#;
        assert!(matches!(
            parse_predict_body(body),
            Err(ClassifyError::Malformed(_))
        ));
    }

    #[test]
    fn non_json_body_is_malformed() {
        assert!(matches!(
            parse_predict_body(b"<html>bad gateway</html>"),
            Err(ClassifyError::Malformed(_))
        ));
    }
}

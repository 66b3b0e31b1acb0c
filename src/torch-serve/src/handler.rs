//! Invocation event and response, as exchanged with the function host.

use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::classifier::ImageClassifier;
use crate::error::{Result, ServeError};
use crate::ranking::Prediction;
use crate::timer::Timer;

#[derive(Debug, Default, Deserialize)]
pub struct InvocationEvent {
    /// `"<meta>;<meta>,<base64 image>"`
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseHeaders {
    #[serde(rename = "Content-Type")]
    pub content_type: &'static str,

    #[serde(rename = "Access-Control-Allow-Origin")]
    pub allow_origin: &'static str,

    #[serde(rename = "Access-Control-Allow-Credentials")]
    pub allow_credentials: bool,
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        ResponseHeaders {
            content_type: "application/json",
            allow_origin: "*",
            allow_credentials: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub headers: ResponseHeaders,

    /// JSON document, serialized to a string
    pub body: String,
}

impl InvocationResponse {
    pub fn success(predictions: &[Prediction]) -> Result<Self> {
        Ok(InvocationResponse {
            status_code: 200,
            headers: ResponseHeaders::default(),
            body: serde_json::to_string(predictions)?,
        })
    }

    pub fn failure(err: &ServeError) -> Self {
        InvocationResponse {
            status_code: 500,
            headers: ResponseHeaders::default(),
            body: json!({ "message": format!("Failed to process image: {}", err) }).to_string(),
        }
    }
}

fn process(event: &InvocationEvent, classifier: &ImageClassifier) -> Result<Vec<Prediction>> {
    let body = event
        .body
        .as_deref()
        .ok_or_else(|| ServeError::payload("event has no body"))?;

    classifier.classify_from_data_uri(body)
}

/// Answer one invocation. Every failure becomes a 500 response carrying the
/// error text; nothing partial is ever returned.
pub fn handle(event: &InvocationEvent, classifier: &ImageClassifier) -> InvocationResponse {
    let mut t = Timer::new_start("Handling request");

    let response = process(event, classifier).and_then(|predictions| {
        debug!("Predictions: {:?}", predictions);
        InvocationResponse::success(&predictions)
    });

    t.stop();

    response.unwrap_or_else(|err| {
        error!("{}", err);
        InvocationResponse::failure(&err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::{classifier, test_png};
    use crate::payload::tests::data_uri;
    use serde_json::Value;

    fn event(body: &str) -> InvocationEvent {
        InvocationEvent {
            body: Some(body.to_owned()),
        }
    }

    #[test]
    fn success_matches_precomputed_softmax() {
        let classifier = classifier((0..8).map(|i| i as f32).collect(), 6);
        let response = handle(&event(&data_uri(&test_png())), &classifier);

        assert_eq!(response.status_code, 200);

        let body: Value = serde_json::from_str(&response.body).unwrap();
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);

        let row = rows[0].as_object().unwrap();
        let expected = [
            ("class-7", 0.632_332_682_812_042_5),
            ("class-6", 0.232_622_193_987_333_08),
            ("class-5", 0.085_576_922_724_934_94),
            ("class-4", 0.031_481_990_510_397_98),
            ("class-3", 0.011_581_577_075_929_86),
            ("class-2", 0.004_260_624_102_577_064),
        ];
        assert_eq!(row.len(), expected.len());
        for (label, probability) in expected {
            let actual = row[label].as_f64().unwrap();
            assert!(
                (actual - probability).abs() < 1e-6,
                "{}: {} != {}",
                label,
                actual,
                probability
            );
        }

        // The body keeps the ranking order of the labels.
        let positions: Vec<usize> = expected
            .iter()
            .map(|(label, _)| response.body.find(&format!("\"{}\"", label)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn malformed_base64_is_a_server_error() {
        let classifier = classifier(vec![0.0, 1.0], 6);
        let response = handle(&event("data:image/png;base64,@@@not-base64@@@"), &classifier);

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("Failed to process image:"));

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to process image: "));
    }

    #[test]
    fn missing_body_and_bad_images_are_server_errors() {
        let classifier = classifier(vec![0.0, 1.0], 6);

        let response = handle(&InvocationEvent::default(), &classifier);
        assert_eq!(response.status_code, 500);

        let response = handle(&event(&data_uri(b"GIF89a but not really")), &classifier);
        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("Failed to process image:"));
    }

    #[test]
    fn wire_format_has_the_lambda_proxy_shape() {
        let response = InvocationResponse::failure(&ServeError::payload("boom"));
        let wire = serde_json::to_value(&response).unwrap();

        assert_eq!(wire["statusCode"], 500);
        assert_eq!(wire["headers"]["Content-Type"], "application/json");
        assert_eq!(wire["headers"]["Access-Control-Allow-Origin"], "*");
        assert_eq!(wire["headers"]["Access-Control-Allow-Credentials"], true);
        assert_eq!(
            wire["body"],
            r#"{"message":"Failed to process image: Malformed image payload: boom"}"#
        );
    }

    #[test]
    fn event_ignores_other_fields() {
        let event: InvocationEvent = serde_json::from_str(
            r#"{"body": "a;b,c", "headers": {"x": "y"}, "isBase64Encoded": false}"#,
        )
        .unwrap();
        assert_eq!(event.body.as_deref(), Some("a;b,c"));
    }
}

use serde::{Deserialize, Serialize};

pub const IMAGE_MODALITY: &str = "IMAGE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// Replies may omit it; the data alone identifies an image part.
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

/// A request part: the source image or the instruction text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Image first, then the instruction, asking for an image-only reply.
    pub fn image_edit(image: InlineData, prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    RequestPart::InlineData { inline_data: image },
                    RequestPart::Text {
                        text: prompt.into(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec![IMAGE_MODALITY.to_string()],
            },
        }
    }
}

/// A part of the model's reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ResponsePart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
    Other(serde_json::Value),
}

impl ResponsePart {
    pub fn as_image(&self) -> Option<&InlineData> {
        match self {
            ResponsePart::InlineData { inline_data } => Some(inline_data),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate, in order. Empty when there is none.
    pub fn parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or(&[])
    }

    /// The first part carrying inline image bytes, if any.
    pub fn first_inline_image(&self) -> Option<&InlineData> {
        self.parts().iter().find_map(ResponsePart::as_image)
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_gemini_shape() {
        let request = GenerateContentRequest::image_edit(
            InlineData {
                mime_type: "image/png".into(),
                data: "iVBORw0KGgo=".into(),
            },
            "Make it snow",
        );
        let json = serde_json::to_value(&request).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "iVBORw0KGgo=");
        assert_eq!(parts[1]["text"], "Make it snow");
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE"])
        );
    }

    #[test]
    fn first_inline_image_skips_text_parts() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your image"},
                        {"thought": true},
                        {"inlineData": {"mimeType": "image/png", "data": "Zmlyc3Q="}},
                        {"inlineData": {"mimeType": "image/png", "data": "c2Vjb25k"}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.parts().len(), 4);
        assert!(matches!(response.parts()[0], ResponsePart::Text { .. }));
        assert!(matches!(response.parts()[1], ResponsePart::Other(_)));
        assert_eq!(response.first_inline_image().unwrap().data, "Zmlyc3Q=");
        assert_eq!(response.finish_reason(), Some("STOP"));
    }

    #[test]
    fn inline_data_without_mime_type_is_still_an_image() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "x"}, {"inlineData": {"data": "QUJD"}}]}
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let image = response.first_inline_image().unwrap();
        assert_eq!(image.data, "QUJD");
        assert!(image.mime_type.is_empty());
    }

    #[test]
    fn missing_candidates_yield_no_image() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.parts().is_empty());
        assert!(response.first_inline_image().is_none());

        let json = r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(response.first_inline_image().is_none());
        assert_eq!(response.finish_reason(), Some("IMAGE_SAFETY"));
    }
}

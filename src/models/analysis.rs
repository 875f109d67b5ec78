//! 图片分析结果（描述 + 文字识别）
//!
//! 字段名与 Azure AI Vision Image Analysis 4.0 的 JSON 响应一致

use serde::{Deserialize, Serialize};

/// 图片描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub text: String,
    /// 置信度，范围 [0, 1]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Word {
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TextLine {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReadResult {
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
}

/// OCR 服务的返回
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageAnalysis {
    #[serde(rename = "captionResult", default)]
    pub caption: Option<Caption>,
    #[serde(rename = "readResult", default)]
    pub read: Option<ReadResult>,
}

impl ImageAnalysis {
    /// 由若干行构造（每行是一组单词），测试和桩服务使用
    pub fn from_lines<L, W>(caption: Option<Caption>, lines: L) -> Self
    where
        L: IntoIterator<Item = W>,
        W: IntoIterator,
        W::Item: Into<String>,
    {
        let lines = lines
            .into_iter()
            .map(|words| {
                let words: Vec<Word> = words
                    .into_iter()
                    .map(|w| Word {
                        text: w.into(),
                        confidence: None,
                    })
                    .collect();
                let text = words
                    .iter()
                    .map(|w| w.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                TextLine { text, words }
            })
            .collect();

        Self {
            caption,
            read: Some(ReadResult {
                blocks: vec![TextBlock { lines }],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_azure_response() {
        let body = r#"{
            "modelVersion": "2023-10-01",
            "captionResult": { "text": "a newspaper page", "confidence": 0.83 },
            "metadata": { "width": 1024, "height": 2048 },
            "readResult": {
                "blocks": [{
                    "lines": [{
                        "text": "Local news",
                        "boundingPolygon": [{"x": 1, "y": 2}],
                        "words": [
                            {"text": "Local", "boundingPolygon": [], "confidence": 0.99},
                            {"text": "news", "boundingPolygon": [], "confidence": 0.98}
                        ]
                    }]
                }]
            }
        }"#;

        let analysis: ImageAnalysis = serde_json::from_str(body).unwrap();
        let caption = analysis.caption.unwrap();
        assert_eq!(caption.text, "a newspaper page");
        let read = analysis.read.unwrap();
        assert_eq!(read.blocks[0].lines[0].words.len(), 2);
        assert_eq!(read.blocks[0].lines[0].words[1].text, "news");
    }

    #[test]
    fn test_deserialize_caption_only() {
        let body = r#"{ "captionResult": { "text": "A photo", "confidence": 0.9 } }"#;
        let analysis: ImageAnalysis = serde_json::from_str(body).unwrap();
        assert!(analysis.read.is_none());
        assert!(analysis.caption.is_some());
    }
}

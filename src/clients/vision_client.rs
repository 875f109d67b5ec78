/// Azure AI Vision 客户端
///
/// 调用 Image Analysis 4.0 REST 接口，一次请求同时拿到图片描述和文字识别结果
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::OcrError;
use crate::models::ImageAnalysis;
use crate::services::OcrService;

const ANALYZE_PATH: &str = "computervision/imageanalysis:analyze";
const FEATURES: &str = "caption,read";

/// Vision 客户端
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl VisionClient {
    /// 创建新的 Vision 客户端
    pub fn new(settings: &Settings) -> Result<Self, OcrError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|source| OcrError::RequestFailed {
                endpoint: settings.vision_endpoint.clone(),
                source,
            })?;

        Ok(Self {
            http,
            endpoint: settings.vision_endpoint.clone(),
            api_key: settings.vision_key.clone(),
            api_version: settings.vision_api_version.clone(),
        })
    }

    fn analyze_url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), ANALYZE_PATH)
    }
}

#[async_trait]
impl OcrService for VisionClient {
    async fn analyze(&self, image: &[u8]) -> Result<ImageAnalysis, OcrError> {
        let url = self.analyze_url();
        debug!("正在调用 Vision API，图片大小: {} 字节", image.len());

        let response = self
            .http
            .post(&url)
            .query(&[
                ("api-version", self.api_version.as_str()),
                ("features", FEATURES),
                ("gender-neutral-caption", "true"),
            ])
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|source| OcrError::RequestFailed {
                endpoint: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| OcrError::RequestFailed {
                endpoint: url.clone(),
                source,
            })?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!("Vision API 调用失败 (HTTP {}): {}", status.as_u16(), message);
            return Err(OcrError::BadResponse {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Vision API 调用成功");

        serde_json::from_str(&body).map_err(|e| OcrError::InvalidResponse(e.to_string()))
    }
}

/// 从错误响应中提取消息：`{"error": {"code": "...", "message": "..."}}`
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    match error {
        Some(e) => {
            let code = e.get("code").and_then(|c| c.as_str()).unwrap_or("Unknown");
            let message = e.get("message").and_then(|m| m.as_str()).unwrap_or_default();
            format!("{}: {}", code, message)
        }
        None if body.trim().is_empty() => "空响应".to_string(),
        None => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::extract_raw_text;

    fn test_settings() -> Settings {
        let vars = [
            ("DATABASE_URL", "postgres://localhost/news"),
            ("OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("OPENAI_KEY", "k"),
            ("VISION_ENDPOINT", "https://example.cognitiveservices.azure.com/"),
            ("VISION_KEY", "k"),
        ];
        Settings::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[test]
    fn test_analyze_url_trims_trailing_slash() {
        let client = VisionClient::new(&test_settings()).unwrap();
        assert_eq!(
            client.analyze_url(),
            "https://example.cognitiveservices.azure.com/computervision/imageanalysis:analyze"
        );
    }

    #[test]
    fn test_error_message_from_azure_body() {
        let body = r#"{"error":{"code":"InvalidImageFormat","message":"Input data is not a valid image."}}"#;
        assert_eq!(
            error_message(body),
            "InvalidImageFormat: Input data is not a valid image."
        );
        assert_eq!(error_message(""), "空响应");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    /// 测试真实的 Vision API
    ///
    /// 运行方式：
    /// ```bash
    /// VISION_ENDPOINT=... VISION_KEY=... OCR_SAMPLE=./artifacts/input/tiff/2.tiff \
    ///     cargo test test_vision_api_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_vision_api_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let settings = Settings::from_env().expect("缺少环境变量");
        let client = VisionClient::new(&settings).unwrap();
        let sample = std::env::var("OCR_SAMPLE").expect("OCR_SAMPLE 未设置");
        let image = std::fs::read(sample).expect("读取图片失败");

        let analysis = client.analyze(&image).await.expect("Vision API 调用失败");
        if let Some(caption) = &analysis.caption {
            println!("描述: '{}', 置信度 {:.4}", caption.text, caption.confidence);
        }
        println!("内容: {}", extract_raw_text(&analysis));
    }
}

//! 文本纠错客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 调用 Azure OpenAI 的 chat completions
//! - 部署名、API 版本均来自配置
//! - 限流（429）和 5xx 由 async-openai 按指数退避重试，总时长受 `RETRY_MAX_ELAPSED_SECS` 限制

use async_openai::{
    config::AzureConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::CompletionError;
use crate::models::{Completion, TokenUsage};
use crate::services::CorrectionService;

const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 1.0;
const TOP_P: f32 = 1.0;

/// 纠错客户端
///
/// 职责：
/// - 发送单轮 chat 请求（系统指令 + 用户文本）
/// - 返回模型输出和 token 用量
/// - 只在限流和服务端错误时重试，重试总时长有上限，超过后本篇文章失败
pub struct CompletionClient {
    client: Client<AzureConfig>,
    deployment: String,
}

impl CompletionClient {
    /// 创建新的纠错客户端
    pub fn new(settings: &Settings) -> Result<Self, CompletionError> {
        let azure_config = AzureConfig::new()
            .with_api_base(&settings.openai_endpoint)
            .with_api_key(&settings.openai_key)
            .with_deployment_id(&settings.openai_deployment)
            .with_api_version(&settings.openai_api_version);

        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| CompletionError::InvalidRequest(e.to_string()))?;

        let client = Client::with_config(azure_config)
            .with_http_client(http)
            .with_backoff(retry_policy(settings.retry_max_elapsed));

        Ok(Self {
            client,
            deployment: settings.openai_deployment.clone(),
        })
    }

    fn build_messages(
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Vec<ChatCompletionRequestMessage>, CompletionError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(|e| CompletionError::InvalidRequest(e.to_string()))?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_text)
            .build()
            .map_err(|e| CompletionError::InvalidRequest(e.to_string()))?;

        Ok(vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ])
    }
}

/// 指数退避，重试总时长不超过 `max_elapsed`；为 0 时不重试
fn retry_policy(max_elapsed: Duration) -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(max_elapsed))
        .build()
}

#[async_trait]
impl CorrectionService for CompletionClient {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<Completion, CompletionError> {
        debug!("调用纠错服务，部署: {}", self.deployment);
        debug!("用户消息长度: {} 字符", user_text.chars().count());

        let messages = Self::build_messages(system_prompt, user_text)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.deployment)
            .messages(messages)
            .max_tokens(MAX_TOKENS)
            .temperature(TEMPERATURE)
            .top_p(TOP_P)
            .stream(false)
            .build()
            .map_err(|e| CompletionError::InvalidRequest(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("纠错服务调用失败: {}", e);
            CompletionError::ApiCallFailed {
                deployment: self.deployment.clone(),
                message: e.to_string(),
            }
        })?;

        debug!("纠错服务调用成功");

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| CompletionError::EmptyContent {
                deployment: self.deployment.clone(),
            })?;

        let usage = match response.usage {
            Some(u) => TokenUsage {
                prompt_tokens: u64::from(u.prompt_tokens),
                completion_tokens: u64::from(u.completion_tokens),
                total_tokens: u64::from(u.total_tokens),
            },
            None => {
                warn!("纠错服务未返回 token 用量，按 0 计");
                TokenUsage::default()
            }
        };

        Ok(Completion { text, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SYSTEM_PROMPT;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const RATE_LIMIT_BODY: &str =
        r#"{"error":{"message":"Rate limit is exceeded","type":"requests","param":null,"code":"429"}}"#;

    /// 启动一个总是返回 429 的本地服务，返回地址和收到的请求数
    async fn spawn_rate_limited_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    let response = format!(
                        "HTTP/1.1 429 Too Many Requests\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        RATE_LIMIT_BODY.len(),
                        RATE_LIMIT_BODY
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (format!("http://{}", addr), hits)
    }

    /// 读完请求头和请求体
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            buf.extend_from_slice(&chunk[..n]);

            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let body_len = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= pos + 4 + body_len {
                    return;
                }
            }
        }
    }

    fn settings_for(endpoint: &str, retry_secs: &str) -> Settings {
        let vars = [
            ("DATABASE_URL", "postgres://localhost/news"),
            ("OPENAI_ENDPOINT", endpoint),
            ("OPENAI_KEY", "k"),
            ("VISION_ENDPOINT", "https://example.cognitiveservices.azure.com"),
            ("VISION_KEY", "k"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("RETRY_MAX_ELAPSED_SECS", retry_secs),
        ];
        Settings::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[test]
    fn test_retry_policy_is_bounded() {
        let policy = retry_policy(Duration::from_secs(30));
        assert_eq!(policy.max_elapsed_time, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_rate_limit_without_retry_fails_after_one_request() {
        let (endpoint, hits) = spawn_rate_limited_server().await;
        let client = CompletionClient::new(&settings_for(&endpoint, "0")).unwrap();

        let err = client.complete(SYSTEM_PROMPT, "Teh fox").await.unwrap_err();

        assert!(matches!(err, CompletionError::ApiCallFailed { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_retries_stop_within_window() {
        let (endpoint, hits) = spawn_rate_limited_server().await;
        let client = CompletionClient::new(&settings_for(&endpoint, "1")).unwrap();

        let started = Instant::now();
        let err = client.complete(SYSTEM_PROMPT, "Teh fox").await.unwrap_err();

        assert!(matches!(err, CompletionError::ApiCallFailed { .. }));
        assert!(hits.load(Ordering::SeqCst) >= 1);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_build_messages_is_single_turn() {
        let messages = CompletionClient::build_messages(SYSTEM_PROMPT, "Teh quick brwon fox").unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
    }

    /// 测试真实的纠错服务
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_completion_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_completion_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let settings = Settings::from_env().expect("缺少环境变量");
        let client = CompletionClient::new(&settings).unwrap();

        let completion = client
            .complete(SYSTEM_PROMPT, "Teh quick brwon fox jumsp over the lazy dog.")
            .await
            .expect("纠错服务调用失败");

        println!("纠错结果: {}", completion.text);
        println!("Token 用量: {}", completion.usage);
        assert!(!completion.text.is_empty());
        assert!(completion.usage.total_tokens > 0);
    }
}

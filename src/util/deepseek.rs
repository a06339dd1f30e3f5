use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::{DeepseekConfig, HttpClientConfig},
    error::SelectorError,
    model::{PolishedItem, PolishedReport},
    service::selector::{SelectionRequest, Selector},
};

pub struct DeepseekClient {
    http: Client,
    config: DeepseekConfig,
}

impl DeepseekClient {
    pub fn new(config: DeepseekConfig, http_client: &HttpClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let builder = http_client
            .apply(Client::builder())
            .context("failed to apply proxy settings for deepseek client")?;
        let http = builder
            .timeout(timeout)
            .build()
            .context("failed to build deepseek http client")?;

        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl Selector for DeepseekClient {
    async fn select(&self, request: &SelectionRequest) -> Result<PolishedReport, SelectorError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SelectorError::NotConfigured)?;

        let payload = serde_json::to_string(&request.candidates)
            .map_err(|err| SelectorError::MalformedResponse(err.to_string()))?;
        debug!(
            candidates = request.candidates.len(),
            payload_chars = payload.len(),
            "sending candidates to deepseek"
        );

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: build_system_prompt(request),
                },
                ChatMessage {
                    role: "user",
                    content: payload,
                },
            ],
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            stream: false,
        };

        let response = self
            .http
            .post(self.endpoint())
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(SelectorError::Status { status, body: text });
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| SelectorError::MalformedResponse(err.to_string()))?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                SelectorError::MalformedResponse("response missing message content".to_string())
            })?;

        parse_report(&content, request.expected_items())
    }

    fn name(&self) -> &'static str {
        "deepseek"
    }
}

fn build_system_prompt(request: &SelectionRequest) -> String {
    let cap = request.global_cap;
    let total = request.expected_items();
    format!(
        "{SYSTEM_PROMPT_HEAD}\n\n【历史排重参考】\n以下是过去发布过的新闻，请严格回避与这些内容重复或高度相似的事件：\n{history}\n\n\
从输入的新闻中选出 {cap} 条完全不同事件的新闻。\n\
输出一个包含 \"news\" 字段的 JSON 对象，\"news\" 必须恰好包含 {total} 条数据：\
rank 0 为总结标题（除 title 外其余字段留空），rank 1-{cap} 为精选新闻，\
每条包含 rank、title、content、source_platform、source_url、image，\
source_platform、source_url 和 image 必须原样保留。除该 JSON 外不要输出其他文字。",
        history = request.history_context,
    )
}

/// Validate the model output: a JSON object whose `news` field is an array.
/// A short array is accepted with a warning.
pub(crate) fn parse_report(content: &str, expected: usize) -> Result<PolishedReport, SelectorError> {
    let cleaned = content.trim();
    let json_str = cleaned
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let value: serde_json::Value = serde_json::from_str(json_str)
        .or_else(|_| serde_json::from_str(cleaned))
        .map_err(|err| SelectorError::MalformedResponse(format!("invalid json: {err}")))?;

    let news = value
        .get("news")
        .ok_or_else(|| SelectorError::MalformedResponse("missing `news` field".to_string()))?;
    let items = news.as_array().ok_or_else(|| {
        SelectorError::MalformedResponse("`news` field is not an array".to_string())
    })?;

    let news: Vec<PolishedItem> = items
        .iter()
        .cloned()
        .map(serde_json::from_value)
        .collect::<Result<_, _>>()
        .map_err(|err| SelectorError::MalformedResponse(format!("invalid news item: {err}")))?;

    if news.len() < expected {
        warn!(
            received = news.len(),
            expected, "selector returned fewer items than requested"
        );
    }

    let total = news.len();
    Ok(PolishedReport {
        news,
        timestamp: String::new(),
        total,
    })
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatCompletionMessage,
}

#[derive(Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

const SYSTEM_PROMPT_HEAD: &str = "你是一名专业中文新闻编辑，负责对多个平台抓取的新闻进行事件级去重、筛选、简化与整合。\
必须剔除涉及政治、军事的新闻。使用正式的新闻体：单条标题不超过 20 个汉字，正文不超过 50 个汉字，只保留“发生了什么 + 关键结果”。";

//! OpenAI兼容的对话接口，作为关键字未命中时的兜底应答者
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::runtime::Handle;

use crate::responder::Fallback;

// Custom Error
#[derive(Debug, Clone)]
pub struct Error(String);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for Error {}

// Chat请求返回结果
// 示例
// {
//     "id":"chatcmpl-6v7mkQj980V1yBec6ETrKPRqFjNw9",
//     "object":"chat.completion",
//     "created":1679072642,
//     "model":"gpt-35-turbo",
//     "usage":{
//        "prompt_tokens":58,
//        "completion_tokens":68,
//        "total_tokens":126
//     },
//     "choices":[
//        {
//           "message":{
//              "role":"assistant",
//              "content":"Yes, other Azure AI services also support customer managed keys."
//           },
//           "finish_reason":"stop",
//           "index":0
//        }
//     ]
// }
#[derive(Deserialize, Debug)]
pub struct Response {
    pub choices: Vec<Choice>,
}

impl Response {
    /// 第一条回复的内容
    pub fn content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[derive(Deserialize, Debug)]
pub struct Choice {
    pub message: Message,
}

// 消息角色枚举。来自OpenAI的定义
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

// 会话记录中的每一条消息
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

// 发送给AI的会话
//   "messages": [
//     {"role": "system",
//       "content": "You are a helpful assistant."},
//     {"role": "user",
//       "content": "Does Azure OpenAI support customer managed keys?"}
//   ]
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Conversation {
    pub messages: Vec<Message>, // 注意名字要与Json格式匹配
}

impl Conversation {
    /// 单轮会话：系统提示 + 用户消息
    pub fn single_turn(prompt: &str, content: &str) -> Self {
        Self {
            messages: vec![
                Message {
                    role: Role::System,
                    content: prompt.to_owned(),
                },
                Message {
                    role: Role::User,
                    content: content.to_owned(),
                },
            ],
        }
    }
}

// AI供应商服务所需要的参数
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub endpoint: String,
    pub api_key: String,
    pub prompt: String,
}

/// 对话AI。在阻塞线程中同步调用。
#[derive(Debug, Clone)]
pub struct ChatFallback {
    config: Config,
    client: reqwest::Client,
    runtime: Handle,
}

impl ChatFallback {
    pub fn new(config: &Config, runtime: Handle) -> Self {
        Self {
            config: config.clone(),
            client: reqwest::Client::new(),
            runtime,
        }
    }

    // 根据用户消息，返回AI的回复。
    pub async fn process(&self, content: &str) -> Result<Response, Error> {
        tracing::debug!("请求AI回复..");
        let header = {
            let mut headers = HeaderMap::new();
            headers.insert(
                HeaderName::from_static("api-key"),
                HeaderValue::from_str(&self.config.api_key)
                    .map_err(|e| Error(format!("API key不合法。{e}")))?,
            );
            headers
        };
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&Conversation::single_turn(&self.config.prompt, content))
            .headers(header)
            .send()
            .await
            .map_err(|e| Error(format!("发送AI请求失败。{e}")))?
            .json::<Response>()
            .await
            .map_err(|e| Error(format!("接收AI返回失败。{e}")))?;
        Ok(response)
    }
}

impl Fallback for ChatFallback {
    fn answer(&self, content: &str) -> Option<String> {
        match self.runtime.block_on(self.process(content)) {
            Ok(response) => response.content().map(str::to_owned),
            Err(e) => {
                tracing::error!("获取AI回复失败。{e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_format() {
        let conv = Conversation::single_turn("You are a helpful assistant.", "你好");
        assert_eq!(
            serde_json::to_value(&conv).unwrap(),
            serde_json::json!({
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant."},
                    {"role": "user", "content": "你好"}
                ]
            })
        );
    }

    #[test]
    fn test_response_content() {
        let response: Response = serde_json::from_str(
            r#"{
                "id": "chatcmpl-6v7mkQj980V1yBec6ETrKPRqFjNw9",
                "object": "chat.completion",
                "created": 1679072642,
                "model": "gpt-35-turbo",
                "usage": {"prompt_tokens": 58, "completion_tokens": 68, "total_tokens": 126},
                "choices": [
                    {"message": {"role": "assistant", "content": "Yes."}, "finish_reason": "stop", "index": 0}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(response.content(), Some("Yes."));

        let empty: Response = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(empty.content(), None);
    }

    #[test]
    fn test_unreachable_endpoint_yields_no_answer() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let fallback = ChatFallback::new(
            &Config {
                endpoint: "http://127.0.0.1:9/chat".to_string(),
                api_key: "key".to_string(),
                prompt: "prompt".to_string(),
            },
            runtime.handle().clone(),
        );
        assert_eq!(fallback.answer("hello"), None);
    }
}

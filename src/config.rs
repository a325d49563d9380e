//! 服务配置。全部来自以`WECHAT_`为前缀的环境变量。
use serde::Deserialize;

use crate::crypto::check_signature;
use crate::provider::openai::Config as ChatCfg;

pub const ENV_PREFIX: &str = "WECHAT_";

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8088";
pub const DEFAULT_WELCOME_TEXT: &str = "谢谢关注！可以开始跟我聊天啦😁";
pub const DEFAULT_DECLINE_TEXT: &str = "I'm only interested in text messages";
pub const DEFAULT_REJECTION_TEXT: &str = "你是谁？你想干嘛？";
pub const DEFAULT_PROCESSING_ERROR_TEXT: &str = "系统处理消息异常";
pub const DEFAULT_CHAT_PROMPT: &str = "You are a helpful assistant.";

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}
fn default_welcome_text() -> String {
    DEFAULT_WELCOME_TEXT.to_string()
}
fn default_decline_text() -> String {
    DEFAULT_DECLINE_TEXT.to_string()
}
fn default_rejection_text() -> String {
    DEFAULT_REJECTION_TEXT.to_string()
}
fn default_processing_error_text() -> String {
    DEFAULT_PROCESSING_ERROR_TEXT.to_string()
}
fn default_chat_prompt() -> String {
    DEFAULT_CHAT_PROMPT.to_string()
}

/// 进程配置
/// | 环境变量                         | 说明
/// | WECHAT_TOKEN                    | 公众号后台填写的Token，必填
/// | WECHAT_BIND_ADDRESS             | 监听地址
/// | WECHAT_KEYWORD_FILE             | 关键字回复表(JSON)
/// | WECHAT_LOG_DIR                  | 日志目录。未设置时输出到终端
/// | WECHAT_CHAT_ENDPOINT            | 对话AI地址
/// | WECHAT_CHAT_API_KEY             | 对话AI密钥
/// | WECHAT_CHAT_PROMPT              | 对话AI的系统提示
/// | WECHAT_*_TEXT                   | 各类固定回复
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub token: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    pub keyword_file: Option<String>,
    pub log_dir: Option<String>,
    pub chat_endpoint: Option<String>,
    pub chat_api_key: Option<String>,
    #[serde(default = "default_chat_prompt")]
    pub chat_prompt: String,
    #[serde(default = "default_welcome_text")]
    pub welcome_text: String,
    #[serde(default = "default_decline_text")]
    pub decline_text: String,
    #[serde(default = "default_rejection_text")]
    pub rejection_text: String,
    #[serde(default = "default_processing_error_text")]
    pub processing_error_text: String,
}

impl Config {
    /// 读取环境变量
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env::<Self>()
    }

    pub fn webhook(&self) -> WebhookConfig {
        WebhookConfig {
            token: self.token.clone(),
        }
    }

    pub fn reply_texts(&self) -> ReplyTexts {
        ReplyTexts {
            welcome: self.welcome_text.clone(),
            decline: self.decline_text.clone(),
            rejection: self.rejection_text.clone(),
            processing_error: self.processing_error_text.clone(),
        }
    }

    /// 对话AI的配置。地址与密钥均提供时才启用。
    pub fn chat(&self) -> Option<ChatCfg> {
        match (&self.chat_endpoint, &self.chat_api_key) {
            (Some(endpoint), Some(api_key)) if !endpoint.is_empty() && !api_key.is_empty() => {
                Some(ChatCfg {
                    endpoint: endpoint.clone(),
                    api_key: api_key.clone(),
                    prompt: self.chat_prompt.clone(),
                })
            }
            _ => None,
        }
    }
}

/// 签名校验所需的参数
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub token: String,
}

impl WebhookConfig {
    /// 校验服务器地址验证请求
    pub fn verify(&self, signature: &str, timestamp: &str, nonce: &str) -> bool {
        check_signature(signature, timestamp, nonce, &self.token)
    }
}

/// 固定回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTexts {
    pub welcome: String,
    pub decline: String,
    pub rejection: String,
    pub processing_error: String,
}

impl Default for ReplyTexts {
    fn default() -> Self {
        Self {
            welcome: default_welcome_text(),
            decline: default_decline_text(),
            rejection: default_rejection_text(),
            processing_error: default_processing_error_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_iter(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[("WECHAT_TOKEN", "secret")]).unwrap();
        assert_eq!(config.token, "secret");
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.keyword_file, None);
        assert_eq!(config.reply_texts(), ReplyTexts::default());
        assert!(config.chat().is_none());
    }

    #[test]
    fn test_token_required() {
        assert!(from_pairs(&[("WECHAT_BIND_ADDRESS", "127.0.0.1:80")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("WECHAT_TOKEN", "secret"),
            ("WECHAT_KEYWORD_FILE", "keyword.json"),
            ("WECHAT_WELCOME_TEXT", "hi"),
            ("WECHAT_CHAT_ENDPOINT", "http://localhost:8081/chat"),
            ("WECHAT_CHAT_API_KEY", "key"),
            ("OTHER_TOKEN", "ignored"),
        ])
        .unwrap();
        assert_eq!(config.keyword_file.as_deref(), Some("keyword.json"));
        assert_eq!(config.reply_texts().welcome, "hi");
        let chat = config.chat().unwrap();
        assert_eq!(chat.endpoint, "http://localhost:8081/chat");
        assert_eq!(chat.prompt, DEFAULT_CHAT_PROMPT);
    }

    #[test]
    fn test_chat_needs_key() {
        let config = from_pairs(&[
            ("WECHAT_TOKEN", "secret"),
            ("WECHAT_CHAT_ENDPOINT", "http://localhost:8081/chat"),
        ])
        .unwrap();
        assert!(config.chat().is_none());
    }

    #[test]
    fn test_webhook_verify() {
        let webhook = WebhookConfig {
            token: "wechat_token".to_string(),
        };
        assert!(webhook.verify(
            "4a886284153e2d4e0e9c72eabdc782fe2adc3e0f",
            "1409304348",
            "123456789"
        ));
        assert!(!webhook.verify("4a886284153e2d4e0e9c72eabdc782fe2adc3e0f", "1409304348", ""));
    }
}

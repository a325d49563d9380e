//! 微信服务器回调涉及到的数据结构
use serde::Deserialize;
use serde_xml_rs::Deserializer;
use xml::reader::{EventReader, ParserConfig};

/// 服务器地址验证请求涉及到的URL参数
/// | 参数       | 说明
/// | signature | 微信加密签名，结合了开发者填写的token、请求中的timestamp与nonce参数
/// | timestamp | 时间戳
/// | nonce     | 随机数
/// | echostr   | 随机字符串。验证通过时原样返回
///
/// 缺失的参数按空字符串处理，由签名校验拒绝。
#[derive(Debug, Default, Deserialize)]
pub struct UrlVerifyParams {
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub nonce: String,
    #[serde(default)]
    pub echostr: String,
}

/// 消息类型
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MsgType {
    Text,
    Image,
    Voice,
    Video,
    ShortVideo,
    Location,
    Link,
    Event,
    News,
    Other(String),
}

impl MsgType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Voice => "voice",
            Self::Video => "video",
            Self::ShortVideo => "shortvideo",
            Self::Location => "location",
            Self::Link => "link",
            Self::Event => "event",
            Self::News => "news",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for MsgType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => Self::Text,
            "image" => Self::Image,
            "voice" => Self::Voice,
            "video" => Self::Video,
            "shortvideo" => Self::ShortVideo,
            "location" => Self::Location,
            "link" => Self::Link,
            "event" => Self::Event,
            "news" => Self::News,
            _ => Self::Other(value),
        }
    }
}

/// 事件推送的事件类型
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum EventType {
    Subscribe,
    Unsubscribe,
    Other(String),
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "subscribe" => Self::Subscribe,
            "unsubscribe" => Self::Unsubscribe,
            _ => Self::Other(value),
        }
    }
}

/// 微信服务器推送的消息
/// | 参数          | 说明
/// | ToUserName   | 开发者微信号
/// | FromUserName | 发送方帐号（OpenID）
/// | CreateTime   | 消息创建时间（整型）
/// | MsgType      | 消息类型
/// | Event        | 事件类型，仅事件推送时存在
/// | Content      | 文本消息内容，仅文本消息时存在
/// | MsgId        | 消息id，64位整型。事件推送没有此项
///
/// 示例
// <xml>
//   <ToUserName><![CDATA[toUser]]></ToUserName>
//   <FromUserName><![CDATA[fromUser]]></FromUserName>
//   <CreateTime>1348831860</CreateTime>
//   <MsgType><![CDATA[text]]></MsgType>
//   <Content><![CDATA[this is a test]]></Content>
//   <MsgId>1234567890123456</MsgId>
// </xml>
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InboundMessage {
    #[serde(rename = "ToUserName")]
    pub to_user_name: String,
    #[serde(rename = "FromUserName")]
    pub from_user_name: String,
    #[serde(rename = "CreateTime")]
    pub create_time: i64,
    #[serde(rename = "MsgType")]
    pub msg_type: MsgType,
    #[serde(rename = "Event", default)]
    pub event: Option<EventType>,
    #[serde(rename = "Content", default)]
    pub content: Option<String>,
    #[serde(rename = "MsgId", default)]
    pub msg_id: i64,
}

impl InboundMessage {
    /// 解析xml文档
    ///
    /// 文本内容保持原样，不去除首尾空白。元素之间的空白仍被忽略。
    pub fn from_xml(body: &str) -> Result<Self, serde_xml_rs::Error> {
        let config = ParserConfig::new()
            .trim_whitespace(false)
            .whitespace_to_characters(false)
            .cdata_to_characters(true)
            .coalesce_characters(true)
            .ignore_comments(true);
        let reader = EventReader::new_with_config(body.as_bytes(), config);
        let mut deserializer = Deserializer::new(reader);
        Self::deserialize(&mut deserializer)
    }

    /// 文本内容。非文本消息视为空字符串。
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

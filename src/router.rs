//! 消息路由：依次尝试各回复策略，采用第一个给出的回复，并编码为xml。
use std::sync::Arc;

use crate::config::ReplyTexts;
use crate::keyword::KeywordTable;
use crate::reply::Reply;
use crate::responder::{
    DefaultResponder, EventResponder, Fallback, FallbackResponder, KeywordResponder, Responder,
};
use crate::wechat_api::InboundMessage;

pub struct ResponseRouter {
    responders: Vec<Box<dyn Responder>>,
}

impl ResponseRouter {
    /// 标准顺序：事件 -> 关键字 -> 外部应答者 -> 默认回复
    pub fn new(
        texts: &ReplyTexts,
        keywords: Arc<KeywordTable>,
        fallback: Option<Box<dyn Fallback>>,
    ) -> Self {
        let mut responders: Vec<Box<dyn Responder>> = vec![
            Box::new(EventResponder::new(&texts.welcome)),
            Box::new(KeywordResponder::new(keywords)),
        ];
        if let Some(f) = fallback {
            responders.push(Box::new(FallbackResponder::new(f)));
        }
        responders.push(Box::new(DefaultResponder::new(&texts.decline)));
        Self::with_responders(responders)
    }

    pub fn with_responders(responders: Vec<Box<dyn Responder>>) -> Self {
        Self { responders }
    }

    /// 选出回复。没有任何策略作答时返回None。
    pub fn respond(&self, msg: &InboundMessage) -> Option<Reply> {
        self.responders.iter().find_map(|r| r.try_respond(msg))
    }

    /// 回复的xml文本。无需回复或编码失败时为空字符串。
    pub fn reply_xml(&self, msg: &InboundMessage) -> String {
        let Some(reply) = self.respond(msg) else {
            return String::new();
        };
        match reply.to_xml() {
            Ok(xml) => xml,
            Err(e) => {
                tracing::error!("{e}");
                String::new()
            }
        }
    }
}

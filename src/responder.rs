//! 回复策略。每个策略只处理自己关心的消息，其余情况返回None交给下一个策略。
use std::sync::Arc;

use crate::keyword::KeywordTable;
use crate::reply::Reply;
use crate::wechat_api::{EventType, InboundMessage, MsgType};

/// 一个回复策略应当具备的行为
pub trait Responder: Send + Sync {
    /// 尝试回复一条消息
    fn try_respond(&self, msg: &InboundMessage) -> Option<Reply>;
}

/// 外部的兜底应答者，例如对话AI。
/// 返回None或空字符串表示无法作答。
pub trait Fallback: Send + Sync {
    fn answer(&self, content: &str) -> Option<String>;
}

impl<F> Fallback for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn answer(&self, content: &str) -> Option<String> {
        self(content)
    }
}

/// 关注与取消关注事件
pub struct EventResponder {
    welcome: String,
}

impl EventResponder {
    pub fn new(welcome: &str) -> Self {
        Self {
            welcome: welcome.to_owned(),
        }
    }
}

impl Responder for EventResponder {
    fn try_respond(&self, msg: &InboundMessage) -> Option<Reply> {
        if msg.msg_type != MsgType::Event {
            return None;
        }
        match msg.event.as_ref()? {
            EventType::Subscribe => Some(Reply::text(msg, &self.welcome)),
            EventType::Unsubscribe => {
                tracing::info!("用户[{}]取消了订阅", msg.from_user_name);
                None
            }
            EventType::Other(e) => {
                tracing::debug!("忽略用户[{}]的事件{e}", msg.from_user_name);
                None
            }
        }
    }
}

/// 关键字回复
pub struct KeywordResponder {
    table: Arc<KeywordTable>,
}

impl KeywordResponder {
    pub fn new(table: Arc<KeywordTable>) -> Self {
        Self { table }
    }
}

impl Responder for KeywordResponder {
    fn try_respond(&self, msg: &InboundMessage) -> Option<Reply> {
        if msg.msg_type != MsgType::Text {
            return None;
        }
        let template = self.table.lookup(msg.content())?;
        tracing::debug!("命中关键字：{}", msg.content());
        Some(template.render(msg))
    }
}

/// 交由外部应答者回复文本消息
pub struct FallbackResponder {
    fallback: Box<dyn Fallback>,
}

impl FallbackResponder {
    pub fn new(fallback: Box<dyn Fallback>) -> Self {
        Self { fallback }
    }
}

impl Responder for FallbackResponder {
    fn try_respond(&self, msg: &InboundMessage) -> Option<Reply> {
        if msg.msg_type != MsgType::Text {
            return None;
        }
        let answer = self.fallback.answer(msg.content())?;
        if answer.is_empty() {
            return None;
        }
        Some(Reply::text(msg, &answer))
    }
}

/// 最后的默认回复：文本消息原样回显，其它非事件消息婉拒。
pub struct DefaultResponder {
    decline: String,
}

impl DefaultResponder {
    pub fn new(decline: &str) -> Self {
        Self {
            decline: decline.to_owned(),
        }
    }
}

impl Responder for DefaultResponder {
    fn try_respond(&self, msg: &InboundMessage) -> Option<Reply> {
        match msg.msg_type {
            MsgType::Event => None,
            MsgType::Text => Some(Reply::text(msg, msg.content())),
            _ => Some(Reply::text(msg, &self.decline)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::ReplyTemplate;
    use crate::reply::TextReply;

    fn message(msg_type: MsgType, event: Option<EventType>, content: Option<&str>) -> InboundMessage {
        InboundMessage {
            to_user_name: "gh_official".to_string(),
            from_user_name: "o_user_openid".to_string(),
            create_time: 1348831860,
            msg_type,
            event,
            content: content.map(str::to_owned),
            msg_id: 0,
        }
    }

    fn text_of(reply: Option<Reply>) -> String {
        match reply {
            Some(Reply::Text(TextReply { content, .. })) => content.text,
            other => panic!("expected a text reply, got {other:?}"),
        }
    }

    #[test]
    fn test_event_responder() {
        let responder = EventResponder::new("welcome");
        let subscribe = message(MsgType::Event, Some(EventType::Subscribe), None);
        assert_eq!(text_of(responder.try_respond(&subscribe)), "welcome");

        let unsubscribe = message(MsgType::Event, Some(EventType::Unsubscribe), None);
        assert!(responder.try_respond(&unsubscribe).is_none());

        let click = message(MsgType::Event, Some(EventType::Other("CLICK".into())), None);
        assert!(responder.try_respond(&click).is_none());

        let no_event = message(MsgType::Event, None, None);
        assert!(responder.try_respond(&no_event).is_none());

        let text = message(MsgType::Text, None, Some("subscribe"));
        assert!(responder.try_respond(&text).is_none());
    }

    #[test]
    fn test_keyword_responder() {
        let table: KeywordTable = [(
            "hello".to_string(),
            ReplyTemplate::Text {
                content: "hi there".to_string(),
            },
        )]
        .into_iter()
        .collect();
        let responder = KeywordResponder::new(Arc::new(table));

        let hit = message(MsgType::Text, None, Some("hello"));
        assert_eq!(text_of(responder.try_respond(&hit)), "hi there");

        let miss = message(MsgType::Text, None, Some("bye"));
        assert!(responder.try_respond(&miss).is_none());

        let image = message(MsgType::Image, None, Some("hello"));
        assert!(responder.try_respond(&image).is_none());
    }

    #[test]
    fn test_fallback_responder() {
        let responder = FallbackResponder::new(Box::new(|content: &str| {
            (content != "silence").then(|| format!("AI: {content}"))
        }));
        let msg = message(MsgType::Text, None, Some("天气如何"));
        assert_eq!(text_of(responder.try_respond(&msg)), "AI: 天气如何");

        let silent = message(MsgType::Text, None, Some("silence"));
        assert!(responder.try_respond(&silent).is_none());

        let empty = FallbackResponder::new(Box::new(|_: &str| Some(String::new())));
        assert!(empty.try_respond(&msg).is_none());
    }

    #[test]
    fn test_default_responder() {
        let responder = DefaultResponder::new("text only");
        let text = message(MsgType::Text, None, Some("echo me"));
        assert_eq!(text_of(responder.try_respond(&text)), "echo me");

        for msg_type in [MsgType::Image, MsgType::Location, MsgType::Link, MsgType::Voice] {
            let msg = message(msg_type, None, None);
            assert_eq!(text_of(responder.try_respond(&msg)), "text only");
        }

        let event = message(MsgType::Event, Some(EventType::Unsubscribe), None);
        assert!(responder.try_respond(&event).is_none());
    }
}

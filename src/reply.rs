//! 被动回复消息，以及它们的xml编码
//!
//! 回复格式示例：
// <xml>
//   <ToUserName><![CDATA[toUser]]></ToUserName>
//   <FromUserName><![CDATA[fromUser]]></FromUserName>
//   <CreateTime>12345678</CreateTime>
//   <MsgType><![CDATA[text]]></MsgType>
//   <Content><![CDATA[你好]]></Content>
// </xml>
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt;

use crate::wechat_api::{InboundMessage, MsgType};

#[derive(Debug)]
pub enum Error {
    Xml(quick_xml::Error),
    Encoding(std::string::FromUtf8Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml(e) => write!(f, "XML编码出错。{e}"),
            Self::Encoding(e) => write!(f, "XML内容不是合法的UTF-8。{e}"),
        }
    }
}
impl std::error::Error for Error {}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Self {
        Self::Xml(value)
    }
}

/// 以CDATA形式编码的文本
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cdata {
    pub text: String,
}

impl From<&str> for Cdata {
    fn from(value: &str) -> Self {
        Self {
            text: value.to_owned(),
        }
    }
}

/// 各类回复共有的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub to_user_name: Cdata,
    pub from_user_name: Cdata,
    pub create_time: i64,
    pub msg_type: Cdata,
}

impl Envelope {
    /// 回复给消息的发送者。收发双方与收到的消息相反。
    fn answering(msg: &InboundMessage, msg_type: MsgType) -> Self {
        Self {
            to_user_name: Cdata::from(msg.from_user_name.as_str()),
            from_user_name: Cdata::from(msg.to_user_name.as_str()),
            create_time: chrono::Utc::now().timestamp(),
            msg_type: Cdata::from(msg_type.as_str()),
        }
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_cdata(writer, "ToUserName", &self.to_user_name)?;
        write_cdata(writer, "FromUserName", &self.from_user_name)?;
        write_text(writer, "CreateTime", &self.create_time.to_string())?;
        write_cdata(writer, "MsgType", &self.msg_type)
    }
}

/// 文本回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReply {
    pub envelope: Envelope,
    pub content: Cdata,
}

impl TextReply {
    pub fn new(msg: &InboundMessage, content: &str) -> Self {
        Self {
            envelope: Envelope::answering(msg, MsgType::Text),
            content: Cdata::from(content),
        }
    }
}

/// 图文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub pic_url: String,
    pub url: String,
}

/// 图文回复。ArticleCount由图文列表长度决定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsReply {
    pub envelope: Envelope,
    articles: Vec<Article>,
}

impl NewsReply {
    pub fn new(msg: &InboundMessage, articles: Vec<Article>) -> Self {
        Self {
            envelope: Envelope::answering(msg, MsgType::News),
            articles,
        }
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }
}

/// 一条被动回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(TextReply),
    News(NewsReply),
}

impl Reply {
    pub fn text(msg: &InboundMessage, content: &str) -> Self {
        Self::Text(TextReply::new(msg, content))
    }

    pub fn news(msg: &InboundMessage, articles: Vec<Article>) -> Self {
        Self::News(NewsReply::new(msg, articles))
    }

    pub fn envelope(&self) -> &Envelope {
        match self {
            Self::Text(r) => &r.envelope,
            Self::News(r) => &r.envelope,
        }
    }

    /// 编码为微信服务器要求的xml格式
    pub fn to_xml(&self) -> Result<String, Error> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Start(BytesStart::new("xml")))?;
        self.envelope().write(&mut writer)?;
        match self {
            Self::Text(r) => write_cdata(&mut writer, "Content", &r.content)?,
            Self::News(r) => {
                write_text(&mut writer, "ArticleCount", &r.article_count().to_string())?;
                writer.write_event(Event::Start(BytesStart::new("Articles")))?;
                for article in r.articles() {
                    writer.write_event(Event::Start(BytesStart::new("item")))?;
                    write_text(&mut writer, "Title", &article.title)?;
                    write_text(&mut writer, "Description", &article.description)?;
                    write_text(&mut writer, "PicUrl", &article.pic_url)?;
                    write_text(&mut writer, "Url", &article.url)?;
                    writer.write_event(Event::End(BytesEnd::new("item")))?;
                }
                writer.write_event(Event::End(BytesEnd::new("Articles")))?;
            }
        }
        writer.write_event(Event::End(BytesEnd::new("xml")))?;
        String::from_utf8(writer.into_inner()).map_err(Error::Encoding)
    }
}

// <name><![CDATA[text]]></name>
// 文本中的"]]>"会提前结束CDATA段，需拆分到相邻的两段中。
fn write_cdata<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Cdata,
) -> Result<(), Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    let mut rest = value.text.as_str();
    while let Some(pos) = rest.find("]]>") {
        writer.write_event(Event::CData(BytesCData::new(&rest[..pos + 2])))?;
        rest = &rest[pos + 2..];
    }
    writer.write_event(Event::CData(BytesCData::new(rest)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

// <name>escaped text</name>
fn write_text<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

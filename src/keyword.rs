//! 关键字回复表
//!
//! 启动时从JSON文件载入一次，之后只读。文件格式：
// {
//   "hello": { "type": "text", "Content": "hi there" },
//   "news": { "type": "news", "Articles": [
//     { "Title": "...", "Description": "...", "PicUrl": "...", "Url": "..." }
//   ] }
// }
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::reply::{Article, Reply};
use crate::wechat_api::InboundMessage;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Format(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "读取关键字文件失败。{e}"),
            Self::Format(e) => write!(f, "关键字文件格式错误。{e}"),
        }
    }
}
impl std::error::Error for Error {}

/// 关键字对应的回复模板
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplyTemplate {
    Text {
        #[serde(rename = "Content")]
        content: String,
    },
    News {
        #[serde(rename = "Articles")]
        articles: Vec<ArticleTemplate>,
    },
}

/// 图文模板。四个字段缺一不可。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArticleTemplate {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "PicUrl")]
    pub pic_url: String,
    #[serde(rename = "Url")]
    pub url: String,
}

impl From<&ArticleTemplate> for Article {
    fn from(value: &ArticleTemplate) -> Self {
        Self {
            title: value.title.clone(),
            description: value.description.clone(),
            pic_url: value.pic_url.clone(),
            url: value.url.clone(),
        }
    }
}

impl ReplyTemplate {
    /// 根据模板生成对某条消息的回复
    pub fn render(&self, msg: &InboundMessage) -> Reply {
        match self {
            Self::Text { content } => Reply::text(msg, content),
            Self::News { articles } => Reply::news(msg, articles.iter().map(Article::from).collect()),
        }
    }
}

/// 关键字 -> 回复模板
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    entries: HashMap<String, ReplyTemplate>,
}

impl KeywordTable {
    /// 从文件载入
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let json = fs::read_to_string(path.as_ref()).map_err(Error::Io)?;
        let table = Self::from_json(&json)?;
        tracing::info!(
            "已载入{}个关键字。{}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// 解析JSON对象。格式不正确的条目将被丢弃，查询时视同不存在。
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let raw: HashMap<String, Value> = serde_json::from_str(json).map_err(Error::Format)?;
        let mut entries = HashMap::with_capacity(raw.len());
        for (keyword, value) in raw {
            match serde_json::from_value::<ReplyTemplate>(value) {
                Ok(template) => {
                    entries.insert(keyword, template);
                }
                Err(e) => tracing::warn!("忽略格式错误的关键字[{keyword}]。{e}"),
            }
        }
        Ok(Self { entries })
    }

    /// 精确匹配
    pub fn lookup(&self, keyword: &str) -> Option<&ReplyTemplate> {
        self.entries.get(keyword)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ReplyTemplate)> for KeywordTable {
    fn from_iter<T: IntoIterator<Item = (String, ReplyTemplate)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

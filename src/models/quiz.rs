//! 题库服务的数据结构（与 REST 接口一一对应）

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// 列表中的测验摘要，只读，每次列表请求都重新获取
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub questions_count: usize,
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
}

/// 单道题目（服务端格式）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_option_id: usize,
}

/// 测验详情
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDetail {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionPayload>,
}

/// `PUT /quizzes/{id}` 请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizUpdate {
    pub title: String,
    pub questions: Vec<QuestionPayload>,
}

/// `POST /quizzes/{id}/split` 请求体，序列化为 `{"parts": n}` 或 `{"size": n}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPayload {
    Parts(usize),
    Size(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotStats {
    pub users: u64,
    pub quizzes: u64,
    pub questions: u64,
}

/// 未认证跳转页使用的 bot 信息
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotInfo {
    pub bot_username: String,
    pub bot_link: String,
    #[serde(default)]
    pub stats: Option<BotStats>,
}

impl BotInfo {
    /// bot-info 请求失败时的兜底信息
    pub fn fallback(bot_username: &str) -> Self {
        let username = bot_username.trim().trim_start_matches('@');
        Self {
            bot_username: username.to_string(),
            bot_link: format!("https://t.me/{}", username),
            stats: None,
        }
    }
}

/// 服务端返回的创建时间可能带时区，也可能不带（按 UTC 处理）
fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| D::Error::custom(format!("无法解析时间 '{}': {}", raw, e)))
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// 排行榜统计周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardPeriod {
    #[default]
    Total,
    Weekly,
    Daily,
}

impl LeaderboardPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            LeaderboardPeriod::Total => "total",
            LeaderboardPeriod::Weekly => "weekly",
            LeaderboardPeriod::Daily => "daily",
        }
    }
}

impl fmt::Display for LeaderboardPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaderboardUser {
    pub rank: u32,
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaderboardGroup {
    pub rank: u32,
    pub chat_id: i64,
    pub title: String,
    #[serde(default)]
    pub username: Option<String>,
    /// 群组按平均分排序，带一位小数
    pub score: f64,
}

/// `GET /leaderboard` 响应
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Leaderboard {
    #[serde(default)]
    pub users: Vec<LeaderboardUser>,
    #[serde(default)]
    pub groups: Vec<LeaderboardGroup>,
    #[serde(default)]
    pub user_rank: Option<LeaderboardUser>,
}

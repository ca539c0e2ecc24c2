pub mod draft;
pub mod leaderboard;
pub mod quiz;

pub use draft::{FieldRef, QuestionDraft, QuizDraft, CORRECT_OPTION_INDEX, OPTION_SLOTS};
pub use leaderboard::{Leaderboard, LeaderboardGroup, LeaderboardPeriod, LeaderboardUser};
pub use quiz::{BotInfo, BotStats, QuestionPayload, QuizDetail, QuizSummary, QuizUpdate, SplitPayload};

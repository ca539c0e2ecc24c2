//! 编辑中的测验草稿
//!
//! 草稿只存在于内存中，由 `DraftStore` 独占；保存成功、取消或离开编辑页时销毁。

use std::fmt;
use tracing::warn;

use super::quiz::{QuestionPayload, QuizDetail, QuizUpdate};

/// 每道题固定的选项数
pub const OPTION_SLOTS: usize = 4;

/// 正确答案固定为第一个选项
pub const CORRECT_OPTION_INDEX: usize = 0;

/// 单道题目草稿
///
/// 没有可写的正确答案字段：任何修改路径都无法改变 `correct_option_index()`。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionDraft {
    pub text: String,
    pub options: [String; OPTION_SLOTS],
}

impl QuestionDraft {
    /// 空白题目（四个空选项）
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn correct_option_index(&self) -> usize {
        CORRECT_OPTION_INDEX
    }

    /// 从服务端格式转换
    ///
    /// 正确选项被移到第一位，其余选项保持原顺序；多于四个的选项被截断，不足的补空。
    pub fn from_payload(payload: &QuestionPayload) -> Self {
        let dropped = Self::overflow_options(payload);
        if dropped > 0 {
            warn!(
                "⚠️ 题目「{}」有 {} 个选项，只保留 {} 个，保存后多余的 {} 个选项会被删除",
                payload.question,
                payload.options.len(),
                OPTION_SLOTS,
                dropped
            );
        }

        let mut ordered: Vec<&str> = payload.options.iter().map(String::as_str).collect();
        if payload.correct_option_id < ordered.len() {
            let correct = ordered.remove(payload.correct_option_id);
            ordered.insert(0, correct);
        }

        let mut options: [String; OPTION_SLOTS] = Default::default();
        for (slot, value) in options.iter_mut().zip(ordered) {
            *slot = value.to_string();
        }

        Self {
            text: payload.question.clone(),
            options,
        }
    }

    /// 超出固定选项数、加载时会被截断的选项个数
    pub fn overflow_options(payload: &QuestionPayload) -> usize {
        payload.options.len().saturating_sub(OPTION_SLOTS)
    }

    pub fn to_payload(&self) -> QuestionPayload {
        QuestionPayload {
            question: self.text.trim().to_string(),
            options: self.options.iter().map(|o| o.trim().to_string()).collect(),
            correct_option_id: CORRECT_OPTION_INDEX,
        }
    }
}

/// 测验草稿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub id: i64,
    pub title: String,
    pub questions: Vec<QuestionDraft>,
}

impl QuizDraft {
    pub fn from_detail(detail: &QuizDetail) -> Self {
        Self {
            id: detail.id,
            title: detail.title.clone(),
            questions: detail
                .questions
                .iter()
                .map(QuestionDraft::from_payload)
                .collect(),
        }
    }

    /// 构建保存请求体
    pub fn to_update(&self) -> QuizUpdate {
        QuizUpdate {
            title: self.title.trim().to_string(),
            questions: self.questions.iter().map(QuestionDraft::to_payload).collect(),
        }
    }
}

/// 表单字段定位，按文档顺序：标题 → 每题题干 → 该题选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRef {
    Title,
    QuestionText { question: usize },
    Option { question: usize, option: usize },
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Title => write!(f, "标题"),
            FieldRef::QuestionText { question } => write!(f, "第 {} 题题干", question + 1),
            FieldRef::Option { question, option } => {
                write!(f, "第 {} 题选项 {}", question + 1, option + 1)
            }
        }
    }
}

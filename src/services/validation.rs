//! 字段校验
//!
//! 校验结果是派生数据：每次输入和保存前重新计算，从不保存。

use crate::error::ValidationError;
use crate::models::{FieldRef, QuestionDraft};

/// 标题最大长度（服务端字段长度）
pub const TITLE_LIMIT: usize = 255;
/// 题干最大长度
pub const QUESTION_TEXT_LIMIT: usize = 300;
/// 选项最大长度
pub const OPTION_LIMIT: usize = 100;

pub fn limit_for(field: FieldRef) -> usize {
    match field {
        FieldRef::Title => TITLE_LIMIT,
        FieldRef::QuestionText { .. } => QUESTION_TEXT_LIMIT,
        FieldRef::Option { .. } => OPTION_LIMIT,
    }
}

/// 校验单个字段：去掉首尾空白后长度必须在 `1..=limit` 之间（按字符计）
pub fn check_field(field: FieldRef, value: &str) -> Option<ValidationError> {
    let len = value.trim().chars().count();
    let limit = limit_for(field);
    if len == 0 {
        Some(ValidationError::Empty { field })
    } else if len > limit {
        Some(ValidationError::OverLimit { field, limit })
    } else {
        None
    }
}

/// 整个表单的校验结果，按文档顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationState {
    issues: Vec<ValidationError>,
}

impl ValidationState {
    pub fn compute(title: &str, questions: &[QuestionDraft]) -> Self {
        let mut issues = Vec::new();
        issues.extend(check_field(FieldRef::Title, title));

        for (q, question) in questions.iter().enumerate() {
            issues.extend(check_field(
                FieldRef::QuestionText { question: q },
                &question.text,
            ));
            for (o, option) in question.options.iter().enumerate() {
                issues.extend(check_field(
                    FieldRef::Option {
                        question: q,
                        option: o,
                    },
                    option,
                ));
            }
        }

        Self { issues }
    }

    /// 文档顺序中的第一个问题字段
    pub fn first(&self) -> Option<ValidationError> {
        self.issues.first().copied()
    }

    pub fn issues(&self) -> &[ValidationError] {
        &self.issues
    }
}

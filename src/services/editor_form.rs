//! 编辑表单绑定
//!
//! 表单保存界面上当前显示的值。界面输入事件写入表单，
//! `DraftStore::collect` 再把表单同步回草稿；草稿变化后重新渲染表单。

use crate::error::{DraftError, ValidationError};
use crate::models::{FieldRef, QuestionDraft, QuizDraft, OPTION_SLOTS};
use crate::services::validation;

/// 一次输入事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormInput {
    Title(String),
    QuestionText { question: usize, value: String },
    Option {
        question: usize,
        option: usize,
        value: String,
    },
}

impl FormInput {
    pub fn field(&self) -> FieldRef {
        match self {
            FormInput::Title(_) => FieldRef::Title,
            FormInput::QuestionText { question, .. } => FieldRef::QuestionText {
                question: *question,
            },
            FormInput::Option {
                question, option, ..
            } => FieldRef::Option {
                question: *question,
                option: *option,
            },
        }
    }
}

/// 已渲染的表单字段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorForm {
    pub title: String,
    pub questions: Vec<QuestionDraft>,
    /// 需要滚动到并聚焦的字段
    pub focused: Option<FieldRef>,
}

impl EditorForm {
    /// 按草稿渲染
    pub fn render(draft: &QuizDraft) -> Self {
        Self {
            title: draft.title.clone(),
            questions: draft.questions.clone(),
            focused: None,
        }
    }

    /// 写入一次输入，返回该字段当前的校验结果（用于实时提示）
    pub fn apply(&mut self, input: FormInput) -> Result<Option<ValidationError>, DraftError> {
        let field = input.field();
        let len = self.questions.len();

        match input {
            FormInput::Title(value) => self.title = value,
            FormInput::QuestionText { question, value } => {
                let target = self
                    .questions
                    .get_mut(question)
                    .ok_or(DraftError::IndexOutOfRange { index: question, len })?;
                target.text = value;
            }
            FormInput::Option {
                question,
                option,
                value,
            } => {
                if option >= OPTION_SLOTS {
                    return Err(DraftError::IndexOutOfRange {
                        index: option,
                        len: OPTION_SLOTS,
                    });
                }
                let target = self
                    .questions
                    .get_mut(question)
                    .ok_or(DraftError::IndexOutOfRange { index: question, len })?;
                target.options[option] = value;
            }
        }

        Ok(self.value(field).and_then(|v| validation::check_field(field, v)))
    }

    /// 读取字段当前显示的值
    pub fn value(&self, field: FieldRef) -> Option<&str> {
        match field {
            FieldRef::Title => Some(self.title.as_str()),
            FieldRef::QuestionText { question } => {
                self.questions.get(question).map(|q| q.text.as_str())
            }
            FieldRef::Option { question, option } => self
                .questions
                .get(question)
                .and_then(|q| q.options.get(option))
                .map(String::as_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuizDraft {
        QuizDraft {
            id: 1,
            title: "Geo".to_string(),
            questions: vec![QuestionDraft {
                text: "Capital?".to_string(),
                options: ["Tashkent", "Samarkand", "Bukhara", "Khiva"].map(String::from),
            }],
        }
    }

    #[test]
    fn test_apply_reports_live_validation() {
        let mut form = EditorForm::render(&draft());

        let ok = form
            .apply(FormInput::Option {
                question: 0,
                option: 2,
                value: "Nukus".to_string(),
            })
            .unwrap();
        assert_eq!(ok, None);
        assert_eq!(
            form.value(FieldRef::Option {
                question: 0,
                option: 2
            }),
            Some("Nukus")
        );

        let empty = form.apply(FormInput::Title("   ".to_string())).unwrap();
        assert_eq!(empty, Some(ValidationError::Empty { field: FieldRef::Title }));
    }

    #[test]
    fn test_apply_rejects_unknown_fields() {
        let mut form = EditorForm::render(&draft());
        assert_eq!(
            form.apply(FormInput::QuestionText {
                question: 3,
                value: "x".to_string()
            }),
            Err(DraftError::IndexOutOfRange { index: 3, len: 1 })
        );
        assert!(form
            .apply(FormInput::Option {
                question: 0,
                option: 4,
                value: "x".to_string()
            })
            .is_err());
    }
}

//! 草稿存储 - 业务能力层
//!
//! 独占"当前正在编辑的测验"。同一时间只有一份草稿，后一次加载直接覆盖前一次。
//!
//! 所有破坏性或持久化操作（增删题目、保存）之前都会先 `collect`，
//! 保证草稿与界面上显示的内容完全一致。

use tracing::{debug, info, warn};

use crate::clients::ApiGateway;
use crate::error::{ApiResult, DraftError, ValidationError};
use crate::models::{QuestionDraft, QuizDetail, QuizDraft};
use crate::services::editor_form::{EditorForm, FormInput};
use crate::services::validation::ValidationState;
use crate::workflow::{EditorState, Epoch, EpochCounter, LoadTicket, SaveTicket};

/// 每个测验最多的题目数
pub const MAX_QUESTIONS: usize = 50;

/// 删除前的用户确认（弹窗由界面提供）
pub trait ConfirmGate {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> ConfirmGate for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// 草稿存储
#[derive(Debug, Default)]
pub struct DraftStore {
    state: EditorState,
    draft: Option<QuizDraft>,
    form: Option<EditorForm>,
    epochs: EpochCounter,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn draft(&self) -> Option<&QuizDraft> {
        self.draft.as_ref()
    }

    pub fn form(&self) -> Option<&EditorForm> {
        self.form.as_ref()
    }

    pub fn epoch(&self) -> Epoch {
        self.epochs.current()
    }

    // ========== 加载 ==========

    /// 开始加载：无条件丢弃现有草稿（包括未保存的修改）
    pub fn begin_load(&mut self, quiz_id: i64) -> LoadTicket {
        if self.draft.is_some() {
            debug!("丢弃现有草稿，重新加载测验 {}", quiz_id);
        }
        self.draft = None;
        self.form = None;
        self.state = EditorState::Loading;
        LoadTicket {
            epoch: self.epochs.advance(),
            quiz_id,
        }
    }

    /// 加载结果返回
    ///
    /// 如果期间视图已经切换（关闭或重新加载），结果被丢弃并返回 `Superseded`。
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: ApiResult<QuizDetail>,
    ) -> Result<(), DraftError> {
        if !self.epochs.is_current(ticket.epoch) {
            debug!("测验 {} 的加载结果已过期，丢弃", ticket.quiz_id);
            return Err(DraftError::Superseded);
        }

        match result {
            Ok(detail) => {
                let draft = QuizDraft::from_detail(&detail);
                info!(
                    "✓ 已加载测验 {}（{} 题）",
                    draft.id,
                    draft.questions.len()
                );
                self.form = Some(EditorForm::render(&draft));
                self.draft = Some(draft);
                self.state = EditorState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!("⚠️ 加载测验 {} 失败: {}", ticket.quiz_id, e);
                self.state = EditorState::Closed;
                Err(DraftError::Api(e))
            }
        }
    }

    /// 读取测验并替换当前草稿
    pub async fn load(&mut self, gateway: &ApiGateway, quiz_id: i64) -> Result<(), DraftError> {
        let ticket = self.begin_load(quiz_id);
        let result = gateway.get_quiz(quiz_id).await;
        self.complete_load(ticket, result)
    }

    // ========== 编辑 ==========

    /// 界面输入事件，只写入表单，不立即同步到草稿
    pub fn input(
        &mut self,
        input: FormInput,
    ) -> Result<Option<ValidationError>, DraftError> {
        self.ensure_interactive("input")?;
        let form = self.form.as_mut().ok_or(DraftError::NoDraft)?;
        let live = form.apply(input)?;
        self.state = EditorState::Editing;
        Ok(live)
    }

    /// 把表单中的当前值同步回草稿（包括尚未通过校验的值和空值）
    pub fn collect(&mut self) -> Result<&QuizDraft, DraftError> {
        let (Some(draft), Some(form)) = (self.draft.as_mut(), self.form.as_ref()) else {
            return Err(DraftError::NoDraft);
        };
        draft.title = form.title.clone();
        draft.questions = form.questions.clone();
        Ok(draft)
    }

    /// 追加一道空白题目，返回新题目的索引
    pub fn add_question(&mut self) -> Result<usize, DraftError> {
        self.ensure_interactive("add_question")?;
        self.collect()?;

        let draft = self.draft.as_mut().ok_or(DraftError::NoDraft)?;
        if draft.questions.len() >= MAX_QUESTIONS {
            return Err(DraftError::TooManyQuestions { max: MAX_QUESTIONS });
        }
        draft.questions.push(QuestionDraft::blank());
        let index = draft.questions.len() - 1;

        self.rerender();
        Ok(index)
    }

    /// 删除题目，需要用户确认；用户取消时返回 `Ok(false)`
    pub fn delete_question(
        &mut self,
        index: usize,
        gate: &dyn ConfirmGate,
    ) -> Result<bool, DraftError> {
        self.ensure_interactive("delete_question")?;
        let len = self.collect()?.questions.len();
        if index >= len {
            return Err(DraftError::IndexOutOfRange { index, len });
        }

        if !gate.confirm(&format!("删除第 {} 题？", index + 1)) {
            return Ok(false);
        }

        if let Some(draft) = self.draft.as_mut() {
            draft.questions.remove(index);
        }
        self.rerender();
        Ok(true)
    }

    /// 基于当前表单值计算校验结果
    pub fn validation_state(&self) -> ValidationState {
        match &self.form {
            Some(form) => ValidationState::compute(&form.title, &form.questions),
            None => ValidationState::default(),
        }
    }

    // ========== 保存 ==========

    /// 校验并准备保存请求
    ///
    /// 任何字段无效时不会产生请求：聚焦文档顺序中的第一个无效字段，状态回到 Ready。
    pub fn begin_save(&mut self) -> Result<SaveTicket, DraftError> {
        self.ensure_interactive("save")?;
        self.collect()?;
        self.state = EditorState::Validating;

        let validation = self.validation_state();
        if let Some(first) = validation.first() {
            if let Some(form) = self.form.as_mut() {
                form.focused = Some(first.field());
            }
            self.state = EditorState::Ready;
            warn!(
                "⚠️ 保存被阻止（共 {} 处问题）: {}",
                validation.issues().len(),
                first
            );
            return Err(DraftError::Validation(first));
        }

        let draft = self.draft.as_ref().ok_or(DraftError::NoDraft)?;
        let ticket = SaveTicket {
            epoch: self.epochs.current(),
            quiz_id: draft.id,
            update: draft.to_update(),
        };
        self.state = EditorState::Saving;
        Ok(ticket)
    }

    /// 保存结果返回：成功后销毁草稿，失败时保留草稿回到 Ready
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: ApiResult<()>,
    ) -> Result<(), DraftError> {
        if !self.epochs.is_current(ticket.epoch) {
            debug!("测验 {} 的保存结果已过期，丢弃", ticket.quiz_id);
            return Err(DraftError::Superseded);
        }

        match result {
            Ok(()) => {
                info!("✓ 测验 {} 已保存", ticket.quiz_id);
                self.discard();
                Ok(())
            }
            Err(e) => {
                warn!("⚠️ 保存测验 {} 失败: {}", ticket.quiz_id, e);
                self.state = EditorState::Ready;
                Err(DraftError::Api(e))
            }
        }
    }

    /// 校验通过后保存；校验失败时不发出请求
    pub async fn validate_and_save(&mut self, gateway: &ApiGateway) -> Result<(), DraftError> {
        let ticket = self.begin_save()?;
        let result = gateway.update_quiz(ticket.quiz_id, &ticket.update).await;
        self.complete_save(ticket, result)
    }

    /// 关闭编辑器 / 离开页面：丢弃草稿，尚未返回的结果全部作废
    pub fn close(&mut self) {
        self.discard();
    }

    // ========== 辅助方法 ==========

    fn discard(&mut self) {
        self.draft = None;
        self.form = None;
        self.state = EditorState::Closed;
        self.epochs.advance();
    }

    fn rerender(&mut self) {
        self.form = self.draft.as_ref().map(EditorForm::render);
        self.state = EditorState::Editing;
    }

    fn ensure_interactive(&self, action: &'static str) -> Result<(), DraftError> {
        if self.draft.is_none() && !matches!(self.state, EditorState::Loading | EditorState::Saving) {
            return Err(DraftError::NoDraft);
        }
        if !self.state.is_interactive() {
            return Err(DraftError::InvalidState {
                state: self.state,
                action,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{FieldRef, QuestionPayload};

    fn detail(count: usize) -> QuizDetail {
        QuizDetail {
            id: 5,
            title: "Geo".to_string(),
            questions: (0..count)
                .map(|i| QuestionPayload {
                    question: format!("Q{}", i),
                    options: vec![
                        format!("A{}", i),
                        format!("B{}", i),
                        format!("C{}", i),
                        format!("D{}", i),
                    ],
                    correct_option_id: 0,
                })
                .collect(),
        }
    }

    fn loaded(count: usize) -> DraftStore {
        let mut store = DraftStore::new();
        let ticket = store.begin_load(5);
        store.complete_load(ticket, Ok(detail(count))).unwrap();
        store
    }

    fn yes(_: &str) -> bool {
        true
    }

    fn no(_: &str) -> bool {
        false
    }

    #[test]
    fn test_reload_discards_unsaved_edits() {
        let mut store = loaded(3);
        store
            .input(FormInput::Title("Edited".to_string()))
            .unwrap();
        store.collect().unwrap();
        assert_eq!(store.draft().unwrap().title, "Edited");

        let ticket = store.begin_load(5);
        assert!(store.draft().is_none());
        store.complete_load(ticket, Ok(detail(3))).unwrap();
        assert_eq!(store.draft().unwrap().title, "Geo");
        assert_eq!(store.form().unwrap().title, "Geo");
    }

    #[test]
    fn test_delete_middle_question_shifts_rest() {
        let mut store = loaded(5);
        let before = store.draft().unwrap().questions.clone();

        assert!(store.delete_question(2, &yes).unwrap());

        let after = &store.draft().unwrap().questions;
        assert_eq!(after.len(), 4);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1]);
        assert_eq!(after[2], before[3]);
        assert_eq!(after[3], before[4]);
        assert_eq!(store.form().unwrap().questions, *after);
    }

    #[test]
    fn test_delete_declined_keeps_questions() {
        let mut store = loaded(3);
        assert!(!store.delete_question(1, &no).unwrap());
        assert_eq!(store.draft().unwrap().questions.len(), 3);
    }

    #[test]
    fn test_delete_collects_pending_edits_first() {
        let mut store = loaded(3);
        store
            .input(FormInput::QuestionText {
                question: 0,
                value: "edited".to_string(),
            })
            .unwrap();

        store.delete_question(2, &yes).unwrap();
        assert_eq!(store.draft().unwrap().questions[0].text, "edited");
        assert_eq!(store.form().unwrap().questions[0].text, "edited");
    }

    #[test]
    fn test_add_question_limit() {
        let mut store = loaded(49);
        assert_eq!(store.add_question().unwrap(), 49);
        let added = &store.draft().unwrap().questions[49];
        assert_eq!(added, &QuestionDraft::blank());

        assert_eq!(
            store.add_question(),
            Err(DraftError::TooManyQuestions { max: MAX_QUESTIONS })
        );
    }

    #[test]
    fn test_save_blocked_by_first_invalid_field() {
        let mut store = loaded(2);
        store
            .input(FormInput::Option {
                question: 0,
                option: 3,
                value: "x".repeat(101),
            })
            .unwrap();
        store
            .input(FormInput::QuestionText {
                question: 1,
                value: " ".to_string(),
            })
            .unwrap();

        let field = FieldRef::Option {
            question: 0,
            option: 3,
        };
        assert_eq!(
            store.begin_save(),
            Err(DraftError::Validation(ValidationError::OverLimit { field, limit: 100 }))
        );
        assert_eq!(store.state(), EditorState::Ready);
        assert_eq!(store.form().unwrap().focused, Some(field));
        assert!(store.draft().is_some());
    }

    #[test]
    fn test_save_success_clears_draft() {
        let mut store = loaded(2);
        let ticket = store.begin_save().unwrap();
        assert_eq!(store.state(), EditorState::Saving);
        assert_eq!(ticket.update.questions.len(), 2);

        store.complete_save(ticket, Ok(())).unwrap();
        assert_eq!(store.state(), EditorState::Closed);
        assert!(store.draft().is_none());
    }

    #[test]
    fn test_save_failure_keeps_draft_and_restores_ready() {
        let mut store = loaded(2);
        let ticket = store.begin_save().unwrap();
        let err = store.complete_save(
            ticket,
            Err(ApiError::Application {
                status: 404,
                detail: "Quiz not found or unauthorized".to_string(),
            }),
        );

        assert!(matches!(err, Err(DraftError::Api(_))));
        assert_eq!(store.state(), EditorState::Ready);
        assert!(store.draft().is_some());
    }

    #[test]
    fn test_stale_load_result_is_discarded() {
        let mut store = DraftStore::new();
        let stale = store.begin_load(5);
        store.close();

        assert_eq!(
            store.complete_load(stale, Ok(detail(3))),
            Err(DraftError::Superseded)
        );
        assert!(store.draft().is_none());
        assert_eq!(store.state(), EditorState::Closed);
    }

    #[test]
    fn test_stale_save_result_does_not_clobber_new_draft() {
        let mut store = loaded(2);
        let ticket = store.begin_save().unwrap();

        // 保存进行中离开页面后又打开同一测验
        store.close();
        let reload = store.begin_load(5);
        store.complete_load(reload, Ok(detail(4))).unwrap();

        assert_eq!(store.complete_save(ticket, Ok(())), Err(DraftError::Superseded));
        assert_eq!(store.draft().unwrap().questions.len(), 4);
        assert_eq!(store.state(), EditorState::Ready);
    }

    #[test]
    fn test_operations_rejected_while_saving() {
        let mut store = loaded(2);
        let _ticket = store.begin_save().unwrap();
        assert!(matches!(
            store.add_question(),
            Err(DraftError::InvalidState {
                state: EditorState::Saving,
                ..
            })
        ));
    }

    #[test]
    fn test_operations_without_draft() {
        let mut store = DraftStore::new();
        assert_eq!(store.add_question(), Err(DraftError::NoDraft));
        assert!(matches!(store.collect(), Err(DraftError::NoDraft)));
    }
}

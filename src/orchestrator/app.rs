//! 会话上下文 - 编排层
//!
//! ## 职责
//!
//! `App` 是唯一的会话上下文对象，取代散落的全局变量（当前草稿、当前视图、当前凭据）：
//!
//! 1. **凭据**：持有 `CredentialResolver`，上下文缺失时先解析；收到 401 时作废并跳转
//! 2. **请求**：所有网络调用都经过 `ApiGateway`
//! 3. **编辑**：草稿只由 `DraftStore` 持有
//! 4. **闸门**：修改类请求期间占用 `BusyGate`，防止重复提交
//!
//! 所有失败分支都会释放闸门并让界面回到可操作状态。

use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{AuthContext, CredentialResolver, HostBridge, ResolutionDiagnostics};
use crate::clients::ApiGateway;
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, DraftError, ValidationError};
use crate::infrastructure::{ReqwestTransport, Transport};
use crate::models::{BotInfo, Leaderboard, LeaderboardPeriod, QuizDetail, QuizSummary};
use crate::services::split_planner::{self, SplitRequest};
use crate::services::{ConfirmGate, DraftStore, FormInput};
use crate::workflow::{BusyGate, BusyGuard, LoadTicket};

/// 当前显示的视图
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Startup,
    QuizList,
    Editor(i64),
    Leaderboard(LeaderboardPeriod),
    /// 未认证：引导用户回到 bot 重新打开
    Redirect(BotInfo),
}

/// 会话上下文
pub struct App<H: HostBridge> {
    config: Config,
    host: H,
    resolver: CredentialResolver,
    gateway: ApiGateway,
    drafts: DraftStore,
    view: View,
    busy: BusyGate,
    quizzes: Vec<QuizSummary>,
    /// 修改类请求成功后列表未能重新读取
    quizzes_stale: bool,
}

impl<H: HostBridge> App<H> {
    /// 使用真实 HTTP 传输初始化
    pub fn initialize(config: Config, host: H) -> AppResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::new(config, host, transport))
    }

    pub fn new(config: Config, host: H, transport: Arc<dyn Transport>) -> Self {
        Self {
            resolver: CredentialResolver::new(&config),
            gateway: ApiGateway::new(&config, transport),
            drafts: DraftStore::new(),
            view: View::Startup,
            busy: BusyGate::new(),
            quizzes: Vec::new(),
            quizzes_stale: false,
            config,
            host,
        }
    }

    // ========== 访问器 ==========

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn quizzes(&self) -> &[QuizSummary] {
        &self.quizzes
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn auth_context(&self) -> &AuthContext {
        self.resolver.current()
    }

    /// 最近一次凭据解析的诊断信息（用于错误提示）
    pub fn diagnostics(&self) -> Option<&ResolutionDiagnostics> {
        self.resolver.diagnostics()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    // ========== 认证 ==========

    /// 启动：解析凭据，没有凭据时直接进入跳转页，否则加载列表
    pub async fn start(&mut self) -> AppResult<()> {
        self.reauthenticate();
        if !self.resolver.current().is_authenticated() {
            self.redirect_to_host().await;
            return Ok(());
        }
        self.refresh_quizzes().await?;
        Ok(())
    }

    /// 丢弃当前凭据，重新解析并替换网关使用的上下文
    pub fn reauthenticate(&mut self) -> AuthContext {
        self.resolver.invalidate();
        let context = self.resolver.resolve(&mut self.host);
        self.gateway.set_auth_context(context.clone());
        context
    }

    /// 上下文为空时先尝试重新解析；仍然为空则跳转，不发请求
    async fn ensure_authenticated(&mut self) -> AppResult<()> {
        if self.resolver.current().is_authenticated() {
            return Ok(());
        }
        if self.reauthenticate().is_authenticated() {
            return Ok(());
        }
        self.redirect_to_host().await;
        Err(AppError::Api(ApiError::Unauthenticated))
    }

    /// 进入跳转页：bot-info 获取失败时使用配置中的用户名
    async fn redirect_to_host(&mut self) {
        let info = match self.gateway.bot_info().await {
            Ok(info) => info,
            Err(e) => {
                warn!("⚠️ 获取 bot 信息失败，使用默认值: {}", e);
                BotInfo::fallback(&self.config.fallback_bot_username)
            }
        };
        info!("↪️ 跳转到 {}", info.bot_link);
        self.drafts.close();
        self.view = View::Redirect(info);
    }

    /// 统一处理 API 错误：401 作废凭据并跳转，其他错误原样返回
    async fn handle_api_error(&mut self, error: ApiError) -> AppError {
        if error.is_unauthenticated() {
            warn!("⚠️ 凭据失效，需要重新认证");
            if let Some(diagnostics) = self.resolver.diagnostics() {
                warn!("凭据诊断:\n{}", diagnostics);
            }
            self.resolver.invalidate();
            self.gateway.set_auth_context(AuthContext::none());
            self.redirect_to_host().await;
        }
        AppError::Api(error)
    }

    /// 修改类请求成功后重新读取列表（仍持有闸门），读取失败时标记缓存失效
    async fn reload_quizzes(&mut self) {
        match self.gateway.list_quizzes().await {
            Ok(quizzes) => {
                self.quizzes = quizzes;
                self.quizzes_stale = false;
            }
            Err(e) => {
                warn!("⚠️ 重新读取测验列表失败，缓存已失效: {}", e);
                self.quizzes_stale = true;
                if e.is_unauthenticated() {
                    self.handle_api_error(e).await;
                }
            }
        }
    }

    async fn handle_draft_error(&mut self, error: DraftError) -> AppError {
        match error {
            DraftError::Api(api) => self.handle_api_error(api).await,
            other => AppError::Draft(other),
        }
    }

    fn acquire(&self, operation: &'static str) -> AppResult<BusyGuard> {
        self.busy.try_acquire(operation).ok_or_else(|| {
            warn!(
                "⚠️ {} 被忽略：{} 仍在进行中",
                operation,
                self.busy.current().unwrap_or_default()
            );
            AppError::Busy
        })
    }

    // ========== 列表 ==========

    pub async fn refresh_quizzes(&mut self) -> AppResult<&[QuizSummary]> {
        self.ensure_authenticated().await?;
        let _guard = self.acquire("list")?;

        match self.gateway.list_quizzes().await {
            Ok(quizzes) => {
                info!("✓ 共 {} 个测验", quizzes.len());
                self.quizzes = quizzes;
                self.quizzes_stale = false;
                self.view = View::QuizList;
                Ok(&self.quizzes)
            }
            Err(e) => Err(self.handle_api_error(e).await),
        }
    }

    /// 删除测验（需要确认），用户取消时返回 `Ok(false)`
    pub async fn delete_quiz(&mut self, quiz_id: i64, gate: &dyn ConfirmGate) -> AppResult<bool> {
        self.ensure_authenticated().await?;
        if !gate.confirm(&format!("删除测验 {}？", quiz_id)) {
            return Ok(false);
        }
        let _guard = self.acquire("delete")?;

        match self.gateway.delete_quiz(quiz_id).await {
            Ok(()) => {
                info!("🗑️ 测验 {} 已删除", quiz_id);
                self.reload_quizzes().await;
                Ok(true)
            }
            Err(e) => Err(self.handle_api_error(e).await),
        }
    }

    /// 请求 bot 把测验文件发送到聊天中
    pub async fn download_quiz(&mut self, quiz_id: i64) -> AppResult<()> {
        self.ensure_authenticated().await?;
        let _guard = self.acquire("download")?;

        match self.gateway.download_quiz(quiz_id).await {
            Ok(()) => {
                info!("📤 测验 {} 已发送到聊天", quiz_id);
                Ok(())
            }
            Err(e) => Err(self.handle_api_error(e).await),
        }
    }

    /// 拆分测验
    ///
    /// 规则校验失败时不会发出请求；请求进行中再次提交会返回 `Busy`。
    pub async fn split_quiz(
        &mut self,
        quiz_id: i64,
        request: SplitRequest,
    ) -> AppResult<Vec<QuizSummary>> {
        self.ensure_authenticated().await?;
        let total = self.question_count(quiz_id).await?;
        let request = split_planner::plan(total, request)?;
        let _guard = self.acquire("split")?;

        info!(
            "✂️ 拆分测验 {}（{} 题）: {}，预计 {} 份",
            quiz_id,
            total,
            request,
            request.expected_parts(total)
        );
        match self.gateway.split_quiz(quiz_id, request.to_payload()).await {
            Ok(parts) => {
                info!("✓ 已生成 {} 个新测验", parts.len());
                self.reload_quizzes().await;
                Ok(parts)
            }
            Err(e) => Err(self.handle_api_error(e).await),
        }
    }

    /// 题目数：列表有效时使用摘要，否则读取详情
    async fn question_count(&mut self, quiz_id: i64) -> AppResult<usize> {
        if !self.quizzes_stale {
            if let Some(summary) = self.quizzes.iter().find(|quiz| quiz.id == quiz_id) {
                return Ok(summary.questions_count);
            }
        }
        match self.gateway.get_quiz(quiz_id).await {
            Ok(detail) => Ok(detail.questions.len()),
            Err(e) => Err(self.handle_api_error(e).await),
        }
    }

    pub async fn leaderboard(&mut self, period: LeaderboardPeriod) -> AppResult<Leaderboard> {
        self.ensure_authenticated().await?;
        let _guard = self.acquire("leaderboard")?;

        match self.gateway.leaderboard(period).await {
            Ok(board) => {
                self.drafts.close();
                self.view = View::Leaderboard(period);
                Ok(board)
            }
            Err(e) => Err(self.handle_api_error(e).await),
        }
    }

    // ========== 编辑器 ==========

    /// 切换到编辑视图并开始加载，之前的草稿和未返回的结果全部作废
    pub fn begin_open_editor(&mut self, quiz_id: i64) -> LoadTicket {
        self.view = View::Editor(quiz_id);
        self.drafts.begin_load(quiz_id)
    }

    pub async fn finish_open_editor(
        &mut self,
        ticket: LoadTicket,
        result: Result<QuizDetail, ApiError>,
    ) -> AppResult<()> {
        match self.drafts.complete_load(ticket, result) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.after_failed_load(ticket.quiz_id, e).await),
        }
    }

    pub async fn open_editor(&mut self, quiz_id: i64) -> AppResult<()> {
        self.ensure_authenticated().await?;
        let _guard = self.acquire("load")?;

        self.view = View::Editor(quiz_id);
        match self.drafts.load(&self.gateway, quiz_id).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.after_failed_load(quiz_id, e).await),
        }
    }

    async fn after_failed_load(&mut self, quiz_id: i64, error: DraftError) -> AppError {
        if matches!(error, DraftError::Superseded) {
            return AppError::Draft(error);
        }
        if self.view == View::Editor(quiz_id) {
            self.view = View::QuizList;
        }
        self.handle_draft_error(error).await
    }

    /// 离开编辑器，丢弃草稿
    pub fn close_editor(&mut self) {
        self.drafts.close();
        self.view = View::QuizList;
    }

    pub fn edit(&mut self, input: FormInput) -> AppResult<Option<ValidationError>> {
        Ok(self.drafts.input(input)?)
    }

    pub fn add_question(&mut self) -> AppResult<usize> {
        Ok(self.drafts.add_question()?)
    }

    pub fn delete_question(&mut self, index: usize, gate: &dyn ConfirmGate) -> AppResult<bool> {
        Ok(self.drafts.delete_question(index, gate)?)
    }

    /// 校验并保存；成功后回到列表并重新读取
    pub async fn save_editor(&mut self) -> AppResult<()> {
        self.ensure_authenticated().await?;
        let _guard = self.acquire("save")?;

        match self.drafts.validate_and_save(&self.gateway).await {
            Ok(()) => {
                self.view = View::QuizList;
                self.reload_quizzes().await;
                Ok(())
            }
            Err(e) => Err(self.handle_draft_error(e).await),
        }
    }
}

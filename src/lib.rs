//! # Quiz WebApp Client
//!
//! Telegram 测验机器人 Web 管理端的客户端核心
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 HTTP 客户端，只暴露 `Transport` 能力
//!
//! ### ② 凭据与网关（Auth / Clients）
//! - `auth/` - 从宿主环境解析 initData 与旧版 token，生成不可变的 `AuthContext`
//! - `clients/` - `ApiGateway`，附带认证头并区分 401 / 业务错误 / 网络错误
//!
//! ### ③ 业务能力层（Services）
//! - `DraftStore` - 唯一的编辑草稿
//! - `EditorForm` - 表单绑定
//! - `validation` - 字段长度校验
//! - `split_planner` - 拆分规则
//!
//! ### ④ 流程层（Workflow）
//! - `EditorState` - 编辑会话状态机
//! - `BusyGate` - 请求期间禁止重复提交
//!
//! ### ⑤ 编排层（Orchestration）
//! - `App` - 会话上下文
//!
//! ## 模块结构

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use auth::{AuthContext, AuthKind, CredentialResolver, HostBridge, StaticHost};
pub use clients::ApiGateway;
pub use config::Config;
pub use error::{ApiError, AppError, AppResult};
pub use infrastructure::{ReqwestTransport, Transport};
pub use orchestrator::{App, View};
pub use services::{DraftStore, FormInput, SplitRequest};

//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 持有会话中唯一的一份状态：凭据、网关、草稿、当前视图、请求闸门。
//! 界面事件只调用 `App` 的方法，不直接接触下层。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (会话上下文)
//!     ↓
//! workflow (编辑状态机 / 请求闸门)
//!     ↓
//! services (草稿 / 表单 / 校验 / 拆分规划)
//!     ↓
//! clients::ApiGateway + auth::CredentialResolver
//!     ↓
//! infrastructure (Transport)
//! ```

pub mod app;

pub use app::{App, View};

//! 凭据解析
//!
//! ## 解析链（按顺序，第一个成功的生效）
//!
//! 1. 宿主桥接直接提供的 initData
//! 2. 地址片段 / 查询串中的 `tgWebAppData`
//! 3. 片段参数去掉宿主元数据后按原始编码重新拼接
//! 4. 片段无法解析时的正则兜底
//!
//! 旧版 `token` 独立解析，可以和身份数据同时附带。

pub mod context;
pub mod host;
pub mod resolver;
pub mod strategies;

pub use context::{AuthContext, AuthKind, IdentitySource, TokenSource};
pub use host::{HostBridge, Location, StaticHost};
pub use resolver::{resolve_snapshot, CredentialResolver, Resolution, ResolutionDiagnostics};
pub use strategies::ResolutionInput;

//! 凭据解析器
//!
//! 从宿主环境推导出当前会话的 `AuthContext`。解析本身是快照上的纯函数，
//! 副作用（保存旧版 token、从地址栏移除 token）只在 `CredentialResolver::resolve` 中执行一次。

use std::fmt;
use tracing::{debug, info, warn};

use super::context::{AuthContext, HEADER_AUTH_TOKEN, HEADER_INIT_DATA, TokenSource};
use super::host::{HostBridge, Location};
use super::strategies::{self, ResolutionInput, TOKEN_PARAM};
use crate::config::Config;
use crate::utils::truncate_text;

/// 一次解析的诊断信息，可以展示给用户
///
/// 不包含完整凭据，只有长度和截断后的片段预览。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionDiagnostics {
    pub strategy: String,
    pub has_init_data_header: bool,
    pub has_token_header: bool,
    pub init_data_len: usize,
    pub fragment_preview: String,
    pub auth_date: Option<i64>,
    pub appears_expired: bool,
    pub token_user_id: Option<i64>,
    pub language: Option<String>,
}

impl fmt::Display for ResolutionDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "strategy: {}", self.strategy)?;
        writeln!(f, "initData header: {} ({} bytes)", self.has_init_data_header, self.init_data_len)?;
        writeln!(f, "token header: {}", self.has_token_header)?;
        if let Some(auth_date) = self.auth_date {
            writeln!(f, "auth_date: {} (expired: {})", auth_date, self.appears_expired)?;
        }
        write!(f, "fragment: {}", self.fragment_preview)
    }
}

/// 纯解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub context: AuthContext,
    /// 本次在地址中首次看到的旧版 token
    pub fresh_url_token: Option<String>,
    pub diagnostics: ResolutionDiagnostics,
}

/// 在快照上执行完整的解析链，相同输入总是得到相同结果
pub fn resolve_snapshot(
    input: &ResolutionInput,
    preview_len: usize,
    init_data_ttl_secs: i64,
) -> Resolution {
    let identity = strategies::resolve_identity(input);
    let token = strategies::resolve_token(input, identity.is_some());

    let fresh_url_token = token
        .as_ref()
        .filter(|(source, _)| *source == TokenSource::UrlQuery)
        .map(|(_, value)| value.clone());
    let token_user_id = token
        .as_ref()
        .and_then(|(_, value)| strategies::token_user_id(value));
    let auth_date = identity
        .as_ref()
        .and_then(|(_, payload)| strategies::auth_date(payload));

    let context = AuthContext::from_parts(identity, token);

    let init_data_len = context
        .headers()
        .get(HEADER_INIT_DATA)
        .map(String::len)
        .unwrap_or_default();
    let fragment = input.location().fragment.unwrap_or_default();

    let diagnostics = ResolutionDiagnostics {
        strategy: context.source_tag().to_string(),
        has_init_data_header: context.headers().contains_key(HEADER_INIT_DATA),
        has_token_header: context.headers().contains_key(HEADER_AUTH_TOKEN),
        init_data_len,
        fragment_preview: truncate_text(fragment, preview_len),
        auth_date,
        appears_expired: auth_date.is_some_and(|date| input.now_unix - date > init_data_ttl_secs),
        token_user_id,
        language: strategies::language_hint(input),
    };

    Resolution {
        context,
        fresh_url_token,
        diagnostics,
    }
}

/// 凭据解析器
///
/// 职责：
/// - 持有当前唯一的 `AuthContext`
/// - 记录最近一次解析的诊断信息
/// - 旧版 token 只从地址栏移除一次
pub struct CredentialResolver {
    token_key: String,
    preview_len: usize,
    init_data_ttl_secs: i64,
    url_token_consumed: bool,
    current: AuthContext,
    last_diagnostics: Option<ResolutionDiagnostics>,
}

impl CredentialResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            token_key: config.session_token_key.clone(),
            preview_len: config.diagnostic_preview_len,
            init_data_ttl_secs: config.init_data_ttl_secs,
            url_token_consumed: false,
            current: AuthContext::none(),
            last_diagnostics: None,
        }
    }

    /// 读取宿主快照
    pub fn snapshot(&self, host: &dyn HostBridge) -> ResolutionInput {
        ResolutionInput {
            bridge_init_data: host.init_data(),
            href: host.location(),
            session_token: host.session_get(&self.token_key),
            now_unix: chrono::Utc::now().timestamp(),
        }
    }

    /// 解析并替换当前上下文，从不失败；没有可用凭据时得到 `AuthKind::None`
    pub fn resolve(&mut self, host: &mut dyn HostBridge) -> AuthContext {
        let input = self.snapshot(host);
        let resolution = resolve_snapshot(&input, self.preview_len, self.init_data_ttl_secs);

        if let Some(token) = &resolution.fresh_url_token {
            host.session_set(&self.token_key, token);
            if !self.url_token_consumed {
                let cleaned = Location::parse(&input.href).without_query_param(TOKEN_PARAM);
                host.replace_location(cleaned);
                self.url_token_consumed = true;
                debug!("旧版 token 已保存到会话存储，并从地址栏移除");
            }
        }

        let diagnostics = &resolution.diagnostics;
        if resolution.context.is_authenticated() {
            info!(
                "🔐 凭据解析完成: {} (initData {} 字节, token: {})",
                diagnostics.strategy, diagnostics.init_data_len, diagnostics.has_token_header
            );
        } else {
            warn!(
                "⚠️ 没有找到可用凭据，片段预览: {}",
                diagnostics.fragment_preview
            );
        }
        if diagnostics.appears_expired {
            warn!("⚠️ initData 的 auth_date 已超过有效期，服务端可能会拒绝");
        }

        self.last_diagnostics = Some(resolution.diagnostics);
        self.current = resolution.context;
        self.current.clone()
    }

    pub fn current(&self) -> &AuthContext {
        &self.current
    }

    /// 丢弃当前上下文（例如收到 401），下一次必须重新解析
    pub fn invalidate(&mut self) {
        self.current = AuthContext::none();
    }

    pub fn diagnostics(&self) -> Option<&ResolutionDiagnostics> {
        self.last_diagnostics.as_ref()
    }
}

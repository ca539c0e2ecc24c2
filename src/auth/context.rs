use std::collections::BTreeMap;
use std::fmt;

pub const HEADER_INIT_DATA: &str = "X-Telegram-Init-Data";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_AUTH_TOKEN: &str = "X-Auth-Token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthKind {
    PlatformIdentity,
    BearerToken,
    None,
}

/// 身份数据来源（按优先级排列）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentitySource {
    /// 宿主桥接直接提供
    Bridge,
    /// 地址片段或查询串中的 `tgWebAppData`
    UrlParameter,
    /// 由地址片段中的其余参数重新拼接
    FragmentReconstructed,
    /// 对原始片段文本做正则提取
    FragmentPattern,
}

impl IdentitySource {
    pub fn tag(self) -> &'static str {
        match self {
            IdentitySource::Bridge => "bridge",
            IdentitySource::UrlParameter => "url-param",
            IdentitySource::FragmentReconstructed => "fragment-reconstructed",
            IdentitySource::FragmentPattern => "fragment-pattern",
        }
    }
}

/// 旧版 token 来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSource {
    UrlQuery,
    SessionStorage,
}

impl TokenSource {
    pub fn tag(self) -> &'static str {
        match self {
            TokenSource::UrlQuery => "url-token",
            TokenSource::SessionStorage => "session-token",
        }
    }
}

/// 认证上下文
///
/// 不可变：重新解析时整体替换，不做原地修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    kind: AuthKind,
    headers: BTreeMap<String, String>,
    source_tag: String,
    identity_source: Option<IdentitySource>,
    token_source: Option<TokenSource>,
}

impl AuthContext {
    pub fn none() -> Self {
        Self {
            kind: AuthKind::None,
            headers: BTreeMap::new(),
            source_tag: "none".to_string(),
            identity_source: None,
            token_source: None,
        }
    }

    /// 身份数据和旧版 token 可以同时存在，两者的请求头都会附带
    pub fn from_parts(
        identity: Option<(IdentitySource, String)>,
        token: Option<(TokenSource, String)>,
    ) -> Self {
        let mut context = Self::none();

        if let Some((_, token_value)) = &token {
            context
                .headers
                .insert(HEADER_AUTH_TOKEN.to_string(), token_value.clone());
        }
        if let Some((_, init_data)) = &identity {
            context
                .headers
                .insert(HEADER_INIT_DATA.to_string(), init_data.clone());
            context
                .headers
                .insert(HEADER_AUTHORIZATION.to_string(), format!("tma {}", init_data));
        }

        context.identity_source = identity.as_ref().map(|(source, _)| *source);
        context.token_source = token.as_ref().map(|(source, _)| *source);

        match (context.identity_source, context.token_source) {
            (Some(source), _) => {
                context.kind = AuthKind::PlatformIdentity;
                context.source_tag = source.tag().to_string();
            }
            (None, Some(source)) => {
                context.kind = AuthKind::BearerToken;
                context.source_tag = source.tag().to_string();
            }
            (None, None) => {}
        }

        context
    }

    pub fn kind(&self) -> AuthKind {
        self.kind
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// 产生该上下文的解析策略，用于诊断
    pub fn source_tag(&self) -> &str {
        &self.source_tag
    }

    pub fn identity_source(&self) -> Option<IdentitySource> {
        self.identity_source
    }

    pub fn token_source(&self) -> Option<TokenSource> {
        self.token_source
    }

    pub fn is_authenticated(&self) -> bool {
        self.kind != AuthKind::None
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.headers.keys().map(String::as_str).collect();
        write!(
            f,
            "{:?} via {} [{}]",
            self.kind,
            self.source_tag,
            names.join(", ")
        )
    }
}

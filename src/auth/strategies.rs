//! 凭据解析策略
//!
//! 每个策略都是纯函数 `(&ResolutionInput) -> Option<String>`，按 `IDENTITY_CHAIN`
//! 的顺序执行，第一个返回 `Some` 的策略生效。旧版 token 独立于身份链解析。

use phf::phf_set;
use regex::Regex;

use super::context::{IdentitySource, TokenSource};
use super::host::Location;

/// 宿主在地址中传递身份数据使用的参数名
pub const IDENTITY_PARAM: &str = "tgWebAppData";

/// 旧版 token 的查询参数名
pub const TOKEN_PARAM: &str = "token";

/// 地址片段中与认证无关的宿主元数据
static NON_AUTH_KEYS: phf::Set<&'static str> = phf_set! {
    "tgWebAppVersion",
    "tgWebAppPlatform",
    "tgWebAppThemeParams",
    "tgWebAppBotInline",
};

/// 某一时刻宿主环境的快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionInput {
    pub bridge_init_data: Option<String>,
    pub href: String,
    /// 之前保存到会话存储中的旧版 token
    pub session_token: Option<String>,
    /// 当前 Unix 时间（秒），只用于诊断
    pub now_unix: i64,
}

impl ResolutionInput {
    pub fn location(&self) -> Location<'_> {
        Location::parse(&self.href)
    }
}

pub type IdentityStrategy = fn(&ResolutionInput) -> Option<String>;

/// 身份解析链，顺序即优先级
pub const IDENTITY_CHAIN: [(IdentitySource, IdentityStrategy); 4] = [
    (IdentitySource::Bridge, from_bridge),
    (IdentitySource::UrlParameter, from_url_parameter),
    (IdentitySource::FragmentReconstructed, from_fragment_pairs),
    (IdentitySource::FragmentPattern, from_fragment_pattern),
];

/// 依次执行身份解析链
pub fn resolve_identity(input: &ResolutionInput) -> Option<(IdentitySource, String)> {
    IDENTITY_CHAIN
        .iter()
        .find_map(|(source, strategy)| strategy(input).map(|payload| (*source, payload)))
}

/// A：宿主直接提供的 initData，原样使用
pub fn from_bridge(input: &ResolutionInput) -> Option<String> {
    input
        .bridge_init_data
        .as_deref()
        .filter(|data| !data.trim().is_empty())
        .map(str::to_string)
}

/// B：片段（优先）或查询串中的 `tgWebAppData` 参数
pub fn from_url_parameter(input: &ResolutionInput) -> Option<String> {
    let location = input.location();
    [location.fragment, location.query]
        .into_iter()
        .flatten()
        .filter_map(|raw| parse_pairs(raw).ok())
        .find_map(|pairs| {
            pairs
                .into_iter()
                .find(|pair| pair.key == IDENTITY_PARAM && !pair.value.trim().is_empty())
                .map(|pair| pair.value)
        })
}

/// C：把片段中除元数据外的参数按原始编码重新拼接
///
/// 剩余参数必须带 `hash`，否则不是签名数据。
pub fn from_fragment_pairs(input: &ResolutionInput) -> Option<String> {
    let fragment = input.location().fragment?;
    let pairs = parse_pairs(fragment).ok()?;

    let kept: Vec<&RawPair> = pairs
        .iter()
        .filter(|pair| !NON_AUTH_KEYS.contains(pair.key.as_str()))
        .collect();

    if !kept.iter().any(|pair| pair.key == "hash") {
        return None;
    }

    Some(
        kept.iter()
            .map(|pair| pair.raw)
            .collect::<Vec<_>>()
            .join("&"),
    )
}

/// D：片段无法按键值对解析时，直接用正则提取 `tgWebAppData`
pub fn from_fragment_pattern(input: &ResolutionInput) -> Option<String> {
    let fragment = input.location().fragment?;
    if parse_pairs(fragment).is_ok() {
        return None;
    }

    let re = Regex::new(r"(?:^|[&?#])tgWebAppData=([^&#]*)").ok()?;
    let raw = re.captures(fragment)?.get(1)?.as_str();
    let decoded = urlencoding::decode_binary(raw.replace('+', " ").as_bytes()).into_owned();
    let value = String::from_utf8_lossy(&decoded).into_owned();

    (!value.trim().is_empty()).then_some(value)
}

/// E：查询串中的旧版 token
pub fn token_from_url(input: &ResolutionInput) -> Option<String> {
    let query = input.location().query?;
    parse_pairs(query)
        .ok()?
        .into_iter()
        .find(|pair| pair.key == TOKEN_PARAM && !pair.value.trim().is_empty())
        .map(|pair| pair.value)
}

/// E / F：本次地址中的 token 优先；会话中的 token 只在没有任何身份数据时使用
pub fn resolve_token(
    input: &ResolutionInput,
    has_identity: bool,
) -> Option<(TokenSource, String)> {
    if let Some(token) = token_from_url(input) {
        return Some((TokenSource::UrlQuery, token));
    }
    if has_identity {
        return None;
    }
    input
        .session_token
        .as_deref()
        .filter(|token| !token.trim().is_empty())
        .map(|token| (TokenSource::SessionStorage, token.to_string()))
}

/// 查询参数 `lang`
pub fn language_hint(input: &ResolutionInput) -> Option<String> {
    let query = input.location().query?;
    parse_pairs(query)
        .ok()?
        .into_iter()
        .find(|pair| pair.key == "lang")
        .map(|pair| pair.value)
}

/// initData 中的 `auth_date`
pub fn auth_date(init_data: &str) -> Option<i64> {
    parse_pairs(init_data)
        .ok()?
        .into_iter()
        .find(|pair| pair.key == "auth_date")
        .and_then(|pair| pair.value.parse().ok())
}

/// 旧版 token 格式 `{user_id}:{timestamp}:{signature}` 中的用户 ID
pub fn token_user_id(token: &str) -> Option<i64> {
    let mut parts = token.split(':');
    let user_id = parts.next()?.parse().ok()?;
    let _timestamp: i64 = parts.next()?.parse().ok()?;
    parts.next()?;
    parts.next().is_none().then_some(user_id)
}

/// 一个键值对，同时保留原始文本和解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPair<'a> {
    /// 原始 `key=value` 片段
    pub raw: &'a str,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedPairs;

/// 按 `&` 拆分键值对并解码
///
/// 任何一个键为空、转义不完整或解码后不是 UTF-8，整体视为解析失败。
pub fn parse_pairs(raw: &str) -> Result<Vec<RawPair<'_>>, MalformedPairs> {
    raw.split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (raw_key, raw_value) = segment.split_once('=').unwrap_or((segment, ""));
            let key = decode_component(raw_key).ok_or(MalformedPairs)?;
            if key.is_empty() {
                return Err(MalformedPairs);
            }
            let value = decode_component(raw_value).ok_or(MalformedPairs)?;
            Ok(RawPair {
                raw: segment,
                key,
                value,
            })
        })
        .collect()
}

/// 表单式解码：`+` 视为空格，`%XX` 必须完整
fn decode_component(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !well_formed {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}

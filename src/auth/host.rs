//! 宿主环境（Telegram 内嵌 WebView）
//!
//! 凭据解析只通过 `HostBridge` 读取宿主数据，便于在测试中替换。

use std::collections::HashMap;

/// 宿主桥接
pub trait HostBridge {
    /// 宿主直接提供的 initData（Telegram.WebApp.initData）
    fn init_data(&self) -> Option<String>;

    /// 当前页面完整地址
    fn location(&self) -> String;

    /// 替换地址栏中的地址（不产生新的历史记录）
    fn replace_location(&mut self, href: String);

    /// 会话级存储
    fn session_get(&self, key: &str) -> Option<String>;

    fn session_set(&mut self, key: &str, value: &str);
}

/// 内存中的宿主实现
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    pub init_data: Option<String>,
    pub href: String,
    pub session: HashMap<String, String>,
    /// `replace_location` 被调用的次数
    pub location_replacements: usize,
}

impl StaticHost {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    pub fn with_init_data(mut self, init_data: impl Into<String>) -> Self {
        self.init_data = Some(init_data.into());
        self
    }

    pub fn with_session(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.session.insert(key.into(), value.into());
        self
    }
}

impl HostBridge for StaticHost {
    fn init_data(&self) -> Option<String> {
        self.init_data.clone()
    }

    fn location(&self) -> String {
        self.href.clone()
    }

    fn replace_location(&mut self, href: String) {
        self.href = href;
        self.location_replacements += 1;
    }

    fn session_get(&self, key: &str) -> Option<String> {
        self.session.get(key).cloned()
    }

    fn session_set(&mut self, key: &str, value: &str) {
        self.session.insert(key.to_string(), value.to_string());
    }
}

/// 地址拆分结果，所有部分都保持原始编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    pub base: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl<'a> Location<'a> {
    pub fn parse(href: &'a str) -> Self {
        let (before_fragment, fragment) = match href.split_once('#') {
            Some((head, tail)) => (head, Some(tail)),
            None => (href, None),
        };
        let (base, query) = match before_fragment.split_once('?') {
            Some((head, tail)) => (head, Some(tail)),
            None => (before_fragment, None),
        };

        Self {
            base,
            query,
            fragment,
        }
    }

    /// 去掉查询串中指定参数后重新拼接地址，其余部分逐字节保留
    pub fn without_query_param(&self, name: &str) -> String {
        let kept: Vec<&str> = self
            .query
            .unwrap_or_default()
            .split('&')
            .filter(|segment| !segment.is_empty())
            .filter(|segment| segment.split('=').next() != Some(name))
            .collect();

        let mut href = self.base.to_string();
        if !kept.is_empty() {
            href.push('?');
            href.push_str(&kept.join("&"));
        }
        if let Some(fragment) = self.fragment {
            href.push('#');
            href.push_str(fragment);
        }
        href
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse_keeps_raw_parts() {
        let loc = Location::parse("https://a.b/app/?token=1%3A2&lang=uz#tgWebAppData=x%3D1");
        assert_eq!(loc.base, "https://a.b/app/");
        assert_eq!(loc.query, Some("token=1%3A2&lang=uz"));
        assert_eq!(loc.fragment, Some("tgWebAppData=x%3D1"));
    }

    #[test]
    fn test_question_mark_inside_fragment_is_not_query() {
        let loc = Location::parse("https://a.b/#route?x=1");
        assert_eq!(loc.query, None);
        assert_eq!(loc.fragment, Some("route?x=1"));
    }

    #[test]
    fn test_without_query_param() {
        let loc = Location::parse("https://a.b/?token=abc&lang=uz#frag");
        assert_eq!(loc.without_query_param("token"), "https://a.b/?lang=uz#frag");

        let only = Location::parse("https://a.b/?token=abc");
        assert_eq!(only.without_query_param("token"), "https://a.b/");
    }
}

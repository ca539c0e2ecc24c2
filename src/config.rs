use crate::error::{AppError, AppResult, FileError};
use serde::Deserialize;
use std::path::Path;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 题库服务地址
    pub api_base_url: String,
    /// API 路径前缀
    pub api_prefix: String,
    /// 传输层超时（秒），客户端本身不做重试
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 诊断信息中片段预览的最大字符数
    pub diagnostic_preview_len: usize,
    /// initData 有效期（秒），只用于诊断提示
    pub init_data_ttl_secs: i64,
    /// 会话存储中旧版 token 的键名
    pub session_token_key: String,
    /// bot-info 不可用时跳转使用的 bot 用户名
    pub fallback_bot_username: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://xamidullayevi.uz".to_string(),
            api_prefix: "/api".to_string(),
            request_timeout_secs: 30,
            verbose_logging: false,
            diagnostic_preview_len: 64,
            init_data_ttl_secs: 3600,
            session_token_key: "quiz_auth_token".to_string(),
            fallback_bot_username: "quizbot_example_bot".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，缺失字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })
    }

    /// 用环境变量覆盖已有配置，解析失败时保留原值
    pub fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("QUIZ_API_BASE_URL").unwrap_or(self.api_base_url),
            api_prefix: std::env::var("QUIZ_API_PREFIX").unwrap_or(self.api_prefix),
            request_timeout_secs: std::env::var("QUIZ_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            diagnostic_preview_len: std::env::var("QUIZ_DIAGNOSTIC_PREVIEW_LEN").ok().and_then(|v| v.parse().ok()).unwrap_or(self.diagnostic_preview_len),
            init_data_ttl_secs: std::env::var("QUIZ_INIT_DATA_TTL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.init_data_ttl_secs),
            session_token_key: std::env::var("QUIZ_SESSION_TOKEN_KEY").unwrap_or(self.session_token_key),
            fallback_bot_username: std::env::var("QUIZ_FALLBACK_BOT_USERNAME").unwrap_or(self.fallback_bot_username),
        }
    }

    /// 完整的 API 根路径，例如 `https://host/api`
    pub fn api_root(&self) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.api_prefix.trim_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_root_joins_without_double_slash() {
        let config = Config {
            api_base_url: "https://example.org/".to_string(),
            api_prefix: "/api/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.api_root(), "https://example.org/api");
    }

    #[test]
    fn test_toml_missing_fields_use_defaults() {
        let config: Config = toml::from_str(
            r#"
            api_base_url = "http://localhost:8000"
            verbose_logging = true
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert!(config.verbose_logging);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.init_data_ttl_secs, 3600);
    }
}

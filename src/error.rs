use crate::models::FieldRef;
use crate::workflow::EditorState;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 编辑草稿错误
    #[error("编辑错误: {0}")]
    Draft(#[from] DraftError),
    /// 拆分参数错误
    #[error("拆分错误: {0}")]
    Split(#[from] SplitError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 另一个请求仍在进行中
    #[error("操作进行中，请稍候")]
    Busy,
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

impl AppError {
    /// 是否需要走重新认证 / 跳转流程
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            AppError::Api(e) => e.is_unauthenticated(),
            AppError::Draft(DraftError::Api(e)) => e.is_unauthenticated(),
            _ => false,
        }
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

/// API 调用错误
///
/// 只有三类传输层结果：401、其他非 2xx、无响应。`Decode` 表示 2xx 但响应体无法解析。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 没有可用凭据，或服务端返回 401
    #[error("未认证，请从 Telegram 重新打开")]
    Unauthenticated,
    /// 网络请求失败（没有收到响应）
    #[error("网络请求失败 ({route}): {message}")]
    Network { route: String, message: String },
    /// 服务端返回非 2xx，detail 原样展示
    #[error("{detail}")]
    Application { status: u16, detail: String },
    /// 响应体解析失败
    #[error("响应解析失败 ({route}): {message}")]
    Decode { route: String, message: String },
}

impl ApiError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
    }

    /// 拆分接口的频率限制（429）
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::Application { status: 429, .. })
    }
}

/// 字段校验错误
///
/// 空值与超长是两种不同的错误，而不只是提示文本不同。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} 不能为空")]
    Empty { field: FieldRef },
    #[error("{field} 超出长度限制（最多 {limit} 个字符）")]
    OverLimit { field: FieldRef, limit: usize },
}

impl ValidationError {
    pub fn field(&self) -> FieldRef {
        match self {
            ValidationError::Empty { field } | ValidationError::OverLimit { field, .. } => *field,
        }
    }
}

/// 拆分请求错误，全部在发出网络请求之前产生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("题目数量 {total} 少于 {minimum}，无法拆分")]
    TooFewToSplit { total: usize, minimum: usize },
    #[error("每份题目数 {chunk_size} 少于 {minimum}")]
    ChunkTooSmall { chunk_size: usize, minimum: usize },
    #[error("最多拆分为 {maximum} 份，请求了 {parts} 份")]
    TooManyParts { parts: usize, maximum: usize },
    #[error("拆分参数必须是正整数")]
    InvalidValue,
}

/// 草稿编辑错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("当前没有打开的草稿")]
    NoDraft,
    #[error("题目数量已达上限 {max}")]
    TooManyQuestions { max: usize },
    #[error("题目索引 {index} 超出范围（共 {len} 题）")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("当前状态 {state:?} 不允许执行 {action}")]
    InvalidState {
        state: EditorState,
        action: &'static str,
    },
    /// 结果属于已经离开的视图，已丢弃
    #[error("视图已切换，结果已丢弃")]
    Superseded,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

pub type ApiResult<T> = Result<T, ApiError>;

//! 拆分规划
//!
//! 纯函数：把用户的拆分请求（按份数或按每份题数）转换为经过校验的请求。
//! 所有规则在发出网络请求之前检查。

use std::fmt;

use crate::error::SplitError;
use crate::models::SplitPayload;

/// 拆分前至少需要的题目数
pub const MIN_TOTAL_QUESTIONS: usize = 20;
/// 每份至少的题目数
pub const MIN_CHUNK_SIZE: usize = 10;
/// 服务端允许的最大份数
pub const MAX_PARTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitMode {
    /// 按份数
    Parts,
    /// 按每份题数
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SplitRequest {
    pub mode: SplitMode,
    pub value: usize,
}

impl SplitRequest {
    pub fn parts(value: usize) -> Self {
        Self {
            mode: SplitMode::Parts,
            value,
        }
    }

    pub fn size(value: usize) -> Self {
        Self {
            mode: SplitMode::Size,
            value,
        }
    }

    /// 拆分后每份的题目数
    pub fn chunk_size(&self, total: usize) -> usize {
        match self.mode {
            SplitMode::Parts if self.value == 0 => 0,
            SplitMode::Parts => total.div_ceil(self.value),
            SplitMode::Size => self.value,
        }
    }

    /// 拆分后的份数
    pub fn expected_parts(&self, total: usize) -> usize {
        match self.chunk_size(total) {
            0 => 0,
            chunk => total.div_ceil(chunk),
        }
    }

    pub fn to_payload(&self) -> SplitPayload {
        match self.mode {
            SplitMode::Parts => SplitPayload::Parts(self.value),
            SplitMode::Size => SplitPayload::Size(self.value),
        }
    }
}

impl fmt::Display for SplitRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            SplitMode::Parts => write!(f, "{} 份", self.value),
            SplitMode::Size => write!(f, "每份 {} 题", self.value),
        }
    }
}

/// 校验拆分请求
///
/// # 参数
/// - `total`: 拆分前的题目数
/// - `request`: 用户输入的拆分方式
///
/// # 返回
/// 通过校验的请求；题目不足时无论参数为何都返回 `TooFewToSplit`
pub fn plan(total: usize, request: SplitRequest) -> Result<SplitRequest, SplitError> {
    if total < MIN_TOTAL_QUESTIONS {
        return Err(SplitError::TooFewToSplit {
            total,
            minimum: MIN_TOTAL_QUESTIONS,
        });
    }
    if request.value == 0 {
        return Err(SplitError::InvalidValue);
    }
    if request.mode == SplitMode::Parts && request.value > MAX_PARTS {
        return Err(SplitError::TooManyParts {
            parts: request.value,
            maximum: MAX_PARTS,
        });
    }

    let chunk_size = request.chunk_size(total);
    if chunk_size < MIN_CHUNK_SIZE {
        return Err(SplitError::ChunkTooSmall {
            chunk_size,
            minimum: MIN_CHUNK_SIZE,
        });
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_mode_chunk_boundary() {
        assert_eq!(
            plan(45, SplitRequest::parts(5)),
            Err(SplitError::ChunkTooSmall {
                chunk_size: 9,
                minimum: 10
            })
        );

        let accepted = plan(45, SplitRequest::parts(4)).unwrap();
        assert_eq!(accepted.chunk_size(45), 12);
        assert_eq!(accepted.expected_parts(45), 4);
        assert_eq!(accepted.to_payload(), SplitPayload::Parts(4));
    }

    #[test]
    fn test_too_few_regardless_of_value() {
        for request in [
            SplitRequest::size(10),
            SplitRequest::size(0),
            SplitRequest::parts(1),
            SplitRequest::parts(100),
        ] {
            assert_eq!(
                plan(18, request),
                Err(SplitError::TooFewToSplit {
                    total: 18,
                    minimum: 20
                })
            );
        }
    }

    #[test]
    fn test_size_mode() {
        assert_eq!(plan(20, SplitRequest::size(10)), Ok(SplitRequest::size(10)));
        assert_eq!(
            plan(100, SplitRequest::size(9)),
            Err(SplitError::ChunkTooSmall {
                chunk_size: 9,
                minimum: 10
            })
        );
        assert_eq!(SplitRequest::size(12).expected_parts(45), 4);
    }

    #[test]
    fn test_zero_and_too_many_parts() {
        assert_eq!(plan(30, SplitRequest::parts(0)), Err(SplitError::InvalidValue));
        assert_eq!(
            plan(1000, SplitRequest::parts(51)),
            Err(SplitError::TooManyParts {
                parts: 51,
                maximum: 50
            })
        );
        assert!(plan(1000, SplitRequest::parts(50)).is_ok());
    }
}

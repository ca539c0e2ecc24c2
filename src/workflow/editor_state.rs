//! 编辑会话状态
//!
//! `Closed → Loading → Ready → {Editing ⇄ Validating} → Saving → {Closed | Ready}`
//!
//! 只有 Loading 和 Saving 会等待网络，其余转换都是同步的。

use crate::models::QuizUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Closed,
    Loading,
    Ready,
    Editing,
    Validating,
    Saving,
}

impl EditorState {
    /// 草稿已加载且没有请求在进行中
    pub fn is_interactive(self) -> bool {
        matches!(self, EditorState::Ready | EditorState::Editing)
    }
}

/// 视图代数，每次加载 / 关闭都会递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

#[derive(Debug, Default)]
pub struct EpochCounter {
    current: u64,
}

impl EpochCounter {
    pub fn advance(&mut self) -> Epoch {
        self.current += 1;
        Epoch(self.current)
    }

    pub fn current(&self) -> Epoch {
        Epoch(self.current)
    }

    /// 异步结果回来时判断它所属的视图是否仍然有效
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current == epoch.0
    }
}

/// 正在进行的加载请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub epoch: Epoch,
    pub quiz_id: i64,
}

/// 已通过校验、等待发送的保存请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub epoch: Epoch,
    pub quiz_id: i64,
    pub update: QuizUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_old_epoch_is_not_current() {
        let mut counter = EpochCounter::default();
        let first = counter.advance();
        assert!(counter.is_current(first));

        let second = counter.advance();
        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));
        assert!(first < second);
    }
}

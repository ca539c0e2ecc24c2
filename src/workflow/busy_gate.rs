//! 加载状态闸门
//!
//! 同一时间只允许一个请求持有闸门；持有期间界面上的触发按钮处于禁用状态。
//! 守卫在任何返回路径上被丢弃时都会释放闸门。

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct BusyGate {
    busy: Rc<Cell<Option<&'static str>>>,
}

impl BusyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试占用闸门，已被占用时返回 `None`
    pub fn try_acquire(&self, operation: &'static str) -> Option<BusyGuard> {
        if self.busy.get().is_some() {
            return None;
        }
        self.busy.set(Some(operation));
        Some(BusyGuard {
            busy: self.busy.clone(),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get().is_some()
    }

    /// 当前占用闸门的操作名
    pub fn current(&self) -> Option<&'static str> {
        self.busy.get()
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    busy: Rc<Cell<Option<&'static str>>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.set(None);
    }
}

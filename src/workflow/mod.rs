//! 流程层：编辑会话状态机与请求闸门

pub mod busy_gate;
pub mod editor_state;

pub use busy_gate::{BusyGate, BusyGuard};
pub use editor_state::{EditorState, Epoch, EpochCounter, LoadTicket, SaveTicket};

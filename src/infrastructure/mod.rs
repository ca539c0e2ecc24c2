//! 基础设施层
//!
//! 持有稀缺资源（HTTP 客户端），只暴露能力

pub mod testing;
pub mod transport;

pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};

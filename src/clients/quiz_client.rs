/// 题库服务网关
///
/// 封装所有与题库 REST API 相关的调用逻辑：附带认证头、区分失败类型。
/// 不做任何自动重试，所有操作都由用户手动重新提交。
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::AuthContext;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::infrastructure::{HttpRequest, HttpResponse, Method, Transport};
use crate::models::{
    BotInfo, Leaderboard, LeaderboardPeriod, QuizDetail, QuizSummary, QuizUpdate, SplitPayload,
};

/// 题库服务网关
pub struct ApiGateway {
    api_root: String,
    transport: Arc<dyn Transport>,
    auth: AuthContext,
}

impl ApiGateway {
    /// 创建新的网关，初始没有认证上下文
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_root: config.api_root(),
            transport,
            auth: AuthContext::none(),
        }
    }

    /// 整体替换认证上下文
    pub fn set_auth_context(&mut self, auth: AuthContext) {
        self.auth = auth;
    }

    pub fn auth_context(&self) -> &AuthContext {
        &self.auth
    }

    /// 调用需要认证的接口
    ///
    /// # 参数
    /// - `route`: 相对 API 根路径的路由，例如 `/quizzes`
    /// - `method`: 请求方法
    /// - `body`: 请求体（可选）
    ///
    /// # 返回
    /// 成功时返回响应 JSON（空响应体为 `Null`）。
    /// 没有凭据时直接返回 `Unauthenticated`，不会发出请求。
    pub async fn call(&self, route: &str, method: Method, body: Option<Value>) -> ApiResult<Value> {
        if !self.auth.is_authenticated() {
            debug!("没有凭据，跳过请求 {} {}", method, route);
            return Err(ApiError::Unauthenticated);
        }
        self.send(route, method, body).await
    }

    /// 调用公开接口（bot-info），仍然附带已有的认证头
    pub async fn call_public(&self, route: &str, method: Method) -> ApiResult<Value> {
        self.send(route, method, None).await
    }

    pub async fn list_quizzes(&self) -> ApiResult<Vec<QuizSummary>> {
        let route = "/quizzes";
        let value = self.call(route, Method::Get, None).await?;
        decode(route, value)
    }

    pub async fn get_quiz(&self, quiz_id: i64) -> ApiResult<QuizDetail> {
        let route = format!("/quizzes/{}", quiz_id);
        let value = self.call(&route, Method::Get, None).await?;
        decode(&route, value)
    }

    /// 保存测验（后写入者覆盖）
    pub async fn update_quiz(&self, quiz_id: i64, update: &QuizUpdate) -> ApiResult<()> {
        let route = format!("/quizzes/{}", quiz_id);
        let body = encode(&route, update)?;
        self.call(&route, Method::Put, Some(body)).await?;
        Ok(())
    }

    pub async fn delete_quiz(&self, quiz_id: i64) -> ApiResult<()> {
        let route = format!("/quizzes/{}", quiz_id);
        self.call(&route, Method::Delete, None).await?;
        Ok(())
    }

    /// 请求服务端通过 bot 发送导出文件
    pub async fn download_quiz(&self, quiz_id: i64) -> ApiResult<()> {
        let route = format!("/quizzes/{}/download", quiz_id);
        self.call(&route, Method::Post, None).await?;
        Ok(())
    }

    /// 拆分测验，非幂等：每次调用都会生成新的测验
    pub async fn split_quiz(
        &self,
        quiz_id: i64,
        payload: SplitPayload,
    ) -> ApiResult<Vec<QuizSummary>> {
        let route = format!("/quizzes/{}/split", quiz_id);
        let body = encode(&route, &payload)?;
        let value = self.call(&route, Method::Post, Some(body)).await?;
        decode(&route, value)
    }

    pub async fn leaderboard(&self, period: LeaderboardPeriod) -> ApiResult<Leaderboard> {
        let route = format!("/leaderboard?period={}", period.as_str());
        let value = self.call(&route, Method::Get, None).await?;
        decode(&route, value)
    }

    pub async fn bot_info(&self) -> ApiResult<BotInfo> {
        let route = "/bot-info";
        let value = self.call_public(route, Method::Get).await?;
        decode(route, value)
    }

    async fn send(&self, route: &str, method: Method, body: Option<Value>) -> ApiResult<Value> {
        let request = HttpRequest {
            method,
            url: format!("{}{}", self.api_root, route),
            headers: self
                .auth
                .headers()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body,
        };

        debug!("{} {} (认证: {})", method, route, self.auth.source_tag());

        let response = self.transport.send(request).await.map_err(|e| {
            warn!("网络请求失败 {} {}: {}", method, route, e);
            ApiError::Network {
                route: route.to_string(),
                message: e.to_string(),
            }
        })?;

        classify(route, response)
    }
}

/// 按状态码区分失败类型
fn classify(route: &str, response: HttpResponse) -> ApiResult<Value> {
    match response.status {
        401 => {
            warn!("⚠️ {} 返回 401，需要重新认证", route);
            Err(ApiError::Unauthenticated)
        }
        200..=299 => {
            if response.body.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&response.body).map_err(|e| ApiError::Decode {
                route: route.to_string(),
                message: e.to_string(),
            })
        }
        status => {
            let detail = extract_detail(status, &response.body);
            warn!("⚠️ {} 返回 {}: {}", route, status, detail);
            Err(ApiError::Application { status, detail })
        }
    }
}

/// 提取错误详情
///
/// `{detail: "..."}` 原样返回；`{detail: [...]}` 用 `; ` 拼接各项 `msg`；
/// 其余情况返回原始文本，空响应体返回状态码。
pub fn extract_detail(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        match value.get("detail") {
            Some(Value::String(detail)) => return detail.clone(),
            Some(Value::Array(items)) => {
                let messages: Vec<String> = items
                    .iter()
                    .map(|item| match item.get("msg").and_then(Value::as_str) {
                        Some(msg) => msg.to_string(),
                        None => item.to_string(),
                    })
                    .collect();
                return messages.join("; ");
            }
            _ => {}
        }
    }

    let text = body.trim();
    if text.is_empty() {
        format!("HTTP {}", status)
    } else {
        text.to_string()
    }
}

fn decode<T: DeserializeOwned>(route: &str, value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        route: route.to_string(),
        message: e.to_string(),
    })
}

fn encode<T: serde::Serialize>(route: &str, body: &T) -> ApiResult<Value> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode {
        route: route.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::context::{HEADER_AUTHORIZATION, HEADER_INIT_DATA};
    use crate::auth::IdentitySource;
    use crate::infrastructure::testing::RecordingTransport;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn gateway(transport: &Arc<RecordingTransport>, authenticated: bool) -> ApiGateway {
        let config = Config {
            api_base_url: "https://quiz.test".to_string(),
            ..Config::default()
        };
        let mut gateway = ApiGateway::new(&config, transport.clone());
        if authenticated {
            gateway.set_auth_context(AuthContext::from_parts(
                Some((IdentitySource::Bridge, "a=1&hash=h".to_string())),
                None,
            ));
        }
        gateway
    }

    #[tokio::test]
    async fn test_headers_attached_to_every_call() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push_json(200, json!([]));
        let gateway = gateway(&transport, true);

        let quizzes = assert_ok!(gateway.list_quizzes().await);
        assert!(quizzes.is_empty());

        let requests = transport.requests();
        assert_eq!(requests[0].url, "https://quiz.test/api/quizzes");
        assert_eq!(requests[0].header(HEADER_INIT_DATA), Some("a=1&hash=h"));
        assert_eq!(requests[0].header(HEADER_AUTHORIZATION), Some("tma a=1&hash=h"));
    }

    #[tokio::test]
    async fn test_no_credentials_means_no_request() {
        let transport = Arc::new(RecordingTransport::new());
        let gateway = gateway(&transport, false);

        let err = assert_err!(gateway.list_quizzes().await);
        assert_eq!(err, ApiError::Unauthenticated);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_status_classification() {
        let transport = Arc::new(RecordingTransport::new());
        transport
            .push_json(401, json!({"detail": "Unauthorized"}))
            .push_json(404, json!({"detail": "Quiz not found"}))
            .push_failure("connection reset");
        let gateway = gateway(&transport, true);

        assert_eq!(gateway.get_quiz(1).await, Err(ApiError::Unauthenticated));
        assert_eq!(
            gateway.get_quiz(1).await,
            Err(ApiError::Application {
                status: 404,
                detail: "Quiz not found".to_string()
            })
        );
        assert!(matches!(gateway.get_quiz(1).await, Err(ApiError::Network { .. })));
        // 没有自动重试
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_split_body_and_rate_limit() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push_json(429, json!({"detail": "Too many split actions. Please wait a minute."}));
        let gateway = gateway(&transport, true);

        let err = assert_err!(gateway.split_quiz(9, SplitPayload::Parts(3)).await);
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "Too many split actions. Please wait a minute.");

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://quiz.test/api/quizzes/9/split");
        assert_eq!(request.body, Some(json!({"parts": 3})));
    }

    #[tokio::test]
    async fn test_bot_info_is_public() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push_json(
            200,
            json!({"bot_username": "quiz_bot", "bot_link": "https://t.me/quiz_bot"}),
        );
        let gateway = gateway(&transport, false);

        let info = assert_ok!(gateway.bot_info().await);
        assert_eq!(info.bot_username, "quiz_bot");
        assert!(info.stats.is_none());
    }

    #[test]
    fn test_extract_detail_variants() {
        assert_eq!(extract_detail(400, r#"{"detail":"bad"}"#), "bad");
        assert_eq!(
            extract_detail(422, r#"{"detail":[{"msg":"too long"},{"msg":"missing"}]}"#),
            "too long; missing"
        );
        assert_eq!(extract_detail(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(extract_detail(500, ""), "HTTP 500");
    }
}

use anyhow::{Context, Result};
use std::env;
use tracing::{info, warn};

use quiz_webapp_client::utils::logging;
use quiz_webapp_client::{App, Config, StaticHost, View};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = match env::var("QUIZ_CONFIG") {
        Ok(path) => Config::from_toml_file(&path)
            .with_context(|| format!("无法加载配置文件 {}", path))?
            .with_env_overrides(),
        Err(_) => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    // 宿主环境：页面地址与 initData 由启动方传入
    let mut host = StaticHost::new(env::var("QUIZ_WEBAPP_URL").unwrap_or_default());
    if let Ok(init_data) = env::var("QUIZ_INIT_DATA") {
        host = host.with_init_data(init_data);
    }

    let mut app = App::initialize(config, host)?;
    app.start().await?;

    match app.view() {
        View::Redirect(info) => {
            warn!("⚠️ 未认证，请从 {} 重新打开", info.bot_link);
        }
        _ => {
            for quiz in app.quizzes() {
                info!(
                    "📋 [{}] {} - {} 题 ({})",
                    quiz.id,
                    quiz.title,
                    quiz.questions_count,
                    quiz.created_at.format("%Y-%m-%d")
                );
            }
        }
    }

    Ok(())
}

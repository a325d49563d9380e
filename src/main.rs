use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use wechat_robot::app;
use wechat_robot::config::Config;
use wechat_robot::keyword::KeywordTable;
use wechat_robot::provider::openai::ChatFallback;
use wechat_robot::responder::Fallback;
use wechat_robot::router::ResponseRouter;

// 日志输出到终端，或按天滚动写入文件。
fn setup_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "wechat-robot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() {
    // Read in configuration from OS env.
    let config = Config::from_env().expect("Please provide WECHAT_TOKEN env var");

    // Setup tracing
    let _guard = setup_tracing(&config);

    // 关键字回复表
    let keywords = match &config.keyword_file {
        Some(path) => {
            KeywordTable::load(path).expect("Keyword file should be a valid JSON object")
        }
        None => {
            tracing::warn!("未配置关键字文件，关键字回复不可用。");
            KeywordTable::default()
        }
    };

    // 关键字未命中时由AI回复
    let fallback = config.chat().map(|chat_cfg| {
        tracing::info!("对话AI已启用：{}", chat_cfg.endpoint);
        let handle = tokio::runtime::Handle::current();
        Box::new(ChatFallback::new(&chat_cfg, handle)) as Box<dyn Fallback>
    });

    // Init the service
    let texts = config.reply_texts();
    let router = ResponseRouter::new(&texts, Arc::new(keywords), fallback);
    let service = app(config.webhook(), texts, router);

    tracing::info!("开始监听{}..", config.bind_address);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .unwrap();
    axum::serve(listener, service).await.unwrap();
}

pub mod config;
pub mod crypto;
pub mod keyword;
pub mod provider;
pub mod reply;
pub mod responder;
pub mod router;
pub mod wechat_api;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use config::{ReplyTexts, WebhookConfig};
use router::ResponseRouter;
use wechat_api::{InboundMessage, UrlVerifyParams};

#[derive(Clone)]
struct AppState {
    webhook: Arc<WebhookConfig>,
    texts: Arc<ReplyTexts>,
    router: Arc<ResponseRouter>,
}

/// GET请求用于服务器地址验证，其余请求均视为消息推送。
pub fn app(webhook: WebhookConfig, texts: ReplyTexts, router: ResponseRouter) -> Router {
    let state = AppState {
        webhook: Arc::new(webhook),
        texts: Arc::new(texts),
        router: Arc::new(router),
    };
    Router::new()
        .route(
            "/",
            get(server_verification_handler).fallback(user_msg_handler),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// 响应微信服务器的地址验证请求。
async fn server_verification_handler(
    State(state): State<AppState>,
    query: Result<Query<UrlVerifyParams>, QueryRejection>,
) -> String {
    // 无法解析的参数按缺失处理，由签名校验拒绝。
    let params = match query {
        Ok(Query(p)) => p,
        Err(e) => {
            tracing::warn!("验证请求参数解析失败。{e}");
            UrlVerifyParams::default()
        }
    };

    // Is this request safe?
    if state
        .webhook
        .verify(&params.signature, &params.timestamp, &params.nonce)
    {
        tracing::info!("服务器地址验证通过");
        params.echostr
    } else {
        tracing::warn!("签名校验失败。timestamp: {}", params.timestamp);
        state.texts.rejection.clone()
    }
}

/// 处理用户发来的消息。
async fn user_msg_handler(State(state): State<AppState>, body: Bytes) -> String {
    let parsed = std::str::from_utf8(&body)
        .map_err(|e| e.to_string())
        .and_then(|s| InboundMessage::from_xml(s).map_err(|e| e.to_string()));
    let msg = match parsed {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("解析XML出错: {e}");
            return state.texts.processing_error.clone();
        }
    };
    tracing::info!(
        "收到消息 from: {}, type: {}, id: {}",
        msg.from_user_name,
        msg.msg_type.as_str(),
        msg.msg_id
    );

    // 兜底应答者可能阻塞，放到阻塞线程中执行。
    let router = state.router.clone();
    match tokio::task::spawn_blocking(move || router.reply_xml(&msg)).await {
        Ok(xml) => {
            tracing::debug!("响应消息 ||{xml}||");
            xml
        }
        Err(e) => {
            tracing::error!("生成回复失败。{e}");
            String::new()
        }
    }
}

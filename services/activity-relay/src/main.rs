//! ユーザーコンテナ上で動作するアクティビティ通知中継HTTPサーバー
//!
//! 本バイナリは以下の機能を提供する:
//! - アクティビティ通知の受信 (POST /activity)
//! - ゲートウェイファイルから転送先ホスト名を取得
//! - ゲートウェイの /collab/event へイベントを転送（Authorizationヘッダーは無加工で引き継ぐ）

mod config;
mod error;
mod event;
mod forwarder;
mod gateway;
mod logging;

pub use config::RelayConfig;
pub use error::RelayError;
pub use event::{OutboundEvent, RelayResponse, extract_last_activity};
pub use forwarder::{EventForwarder, ForwardError, ForwardRequest, HttpForwarder};
pub use gateway::read_gateway_host;
pub use logging::init_logging;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::post,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// アプリケーション状態
///
/// ルーター全体で共有される状態を保持する。
/// 可変状態は持たず、設定と転送クライアントのみを共有する。
#[derive(Clone)]
pub struct AppState {
    /// 中継サーバー設定
    pub config: Arc<RelayConfig>,
    /// イベント転送クライアント
    pub forwarder: Arc<dyn EventForwarder>,
}

impl AppState {
    pub fn new(config: RelayConfig, forwarder: Arc<dyn EventForwarder>) -> Self {
        Self {
            config: Arc::new(config),
            forwarder,
        }
    }
}

/// アクティビティ通知エンドポイント (POST /activity)
///
/// 検証順序:
/// 1. ゲートウェイファイルの存在確認と読み込み（ペイロード解析より先）
/// 2. ペイロードの解析とlast_activityの抽出
///
/// 転送の成否はレスポンスに反映しない。失敗はエラーログとして記録する。
/// クエリ文字列付きのパスは /activity とは別のパスとして扱う。
///
/// # Returns
/// - 200 OK: `{"status": "Request received"}`
/// - 404 Not Found: クエリ文字列が付いている
/// - 400 Bad Request: JSONが不正、またはlast_activityが欠落・偽値
/// - 500 Internal Server Error: ゲートウェイファイルが存在しない、または読み込めない
async fn relay_activity(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    if uri.query().is_some() {
        return Ok(not_found(method, uri).await.into_response());
    }

    tracing::info!(size = body.len(), "アクティビティ通知を受信");
    tracing::debug!(payload = %String::from_utf8_lossy(&body), "受信ペイロード");

    // 空のAuthorizationヘッダーは付いていないものとして扱う
    let authorization = headers
        .get(header::AUTHORIZATION)
        .filter(|value| !value.is_empty())
        .cloned();
    if authorization.is_some() {
        tracing::info!("Authorizationヘッダーを受信");
    }

    let gateway_file = state.config.gateway_file();
    let host = read_gateway_host(gateway_file).await.inspect_err(|e| {
        tracing::error!(path = %gateway_file.display(), error = %e, "転送先ホスト名の取得に失敗");
    })?;
    tracing::info!(host = %host, "ゲートウェイファイルから転送先を取得");

    let last_activity = extract_last_activity(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "ペイロードの検証に失敗");
    })?;

    let request = ForwardRequest {
        url: state.config.forward_url(&host),
        event: OutboundEvent::activity(last_activity),
        authorization,
    };

    tracing::info!(url = %request.url, "ゲートウェイへイベントを転送");
    match state.forwarder.forward(&request).await {
        Ok(status) => {
            tracing::info!(url = %request.url, status = %status, "イベント転送に成功");
        }
        Err(e) => {
            // 呼び出し元には通知しない
            tracing::error!(url = %request.url, error = %e, "イベント転送に失敗");
        }
    }

    Ok(Json(RelayResponse::received()).into_response())
}

/// 未定義のパス・メソッドに対して空ボディの404を返す
async fn not_found(method: Method, uri: Uri) -> StatusCode {
    tracing::warn!(method = %method, uri = %uri, "未定義のルートへのリクエスト");
    StatusCode::NOT_FOUND
}

/// ルーターを構築する
///
/// POST /activity 以外はパス・メソッドを問わず404を返す。
/// /activity はボディサイズを制限せず、Content-Lengthの分だけ読み込む。
/// TraceLayerによりリクエスト/レスポンスの構造化ログを自動記録する。
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/activity",
            post(relay_activity)
                .fallback(not_found)
                .layer(DefaultBodyLimit::disable()),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// メイン関数
///
/// トレーシングを初期化し、HTTPサーバーを起動する。
/// サーバーは停止されるまでリクエストを受け付け続ける。
///
/// # 環境変数
/// - `RELAY_BIND_ADDR`: リッスンアドレス（デフォルト: 0.0.0.0:8000）
/// - `RELAY_GATEWAY_FILE`: ゲートウェイファイルのパス（デフォルト: /tmp/gateway）
/// - `RELAY_FORWARD_URL_TEMPLATE`: 転送先URLテンプレート
/// - `RELAY_ACCEPT_INVALID_CERTS`: TLS証明書検証を無効化（開発用）
/// - `RELAY_FORWARD_TIMEOUT_SECS`: 転送タイムアウト秒数
/// - `RUST_LOG`: ログレベル（デフォルト: info）
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    tracing::info!("アクティビティ中継サーバーを起動します");

    let config = RelayConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "設定の読み込みに失敗");
    })?;
    tracing::info!(gateway_file = %config.gateway_file().display(), "設定を読み込みました");

    if config.accept_invalid_certs() {
        tracing::warn!("転送時のTLS証明書検証が無効化されています（開発環境専用）");
    }

    let forwarder = HttpForwarder::new(&config)?;
    let addr = config.bind_addr();
    let app = create_router(AppState::new(config, Arc::new(forwarder)));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("リッスン開始: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

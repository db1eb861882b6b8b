//! ゲートウェイへのイベント転送
//!
//! 転送処理を`EventForwarder`トレイトで抽象化し、
//! 本番用のreqwest実装とテスト用の実装を差し替え可能にする。

use crate::config::RelayConfig;
use crate::event::OutboundEvent;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// 転送エラー
///
/// # エラー種別
/// - `ClientBuild`: HTTPクライアントの構築失敗（起動時）
/// - `HttpError`: ゲートウェイからのエラーレスポンス
/// - `Timeout`: 設定されたタイムアウトを超過
/// - `NetworkError`: 接続・DNS・TLS・シリアライズなどのリクエスト送信エラー
#[derive(Debug, Error)]
pub enum ForwardError {
    /// HTTPクライアントの構築に失敗
    #[error("HTTPクライアントの構築に失敗しました: {0}")]
    ClientBuild(String),

    /// HTTPエラー（ステータスコード付き）
    #[error("HTTPエラー: status={status}, message={message}")]
    HttpError {
        /// HTTPステータスコード
        status: u16,
        /// レスポンスボディ
        message: String,
    },

    /// タイムアウト
    #[error("タイムアウト: {0}")]
    Timeout(String),

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    NetworkError(String),
}

/// 転送リクエスト
///
/// ハンドラーが構築した送信内容そのもの。
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRequest {
    /// 転送先URL
    pub url: String,
    /// 送信イベント
    pub event: OutboundEvent,
    /// 受信リクエストのAuthorizationヘッダー（無加工）
    pub authorization: Option<HeaderValue>,
}

/// イベント転送用トレイト
///
/// 実際のHTTPクライアントとテスト用モックを差し替えるための抽象。
#[async_trait]
pub trait EventForwarder: Send + Sync {
    /// イベントを転送する
    ///
    /// # 戻り値
    /// * 成功時はゲートウェイのレスポンスステータス
    /// * 失敗時は`ForwardError`
    async fn forward(&self, request: &ForwardRequest) -> Result<StatusCode, ForwardError>;
}

/// reqwestによるHTTPS転送実装
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client,
}

impl HttpForwarder {
    /// 設定からHttpForwarderを作成
    ///
    /// 再試行は行わない。タイムアウトは設定された場合のみ適用する。
    pub fn new(config: &RelayConfig) -> Result<Self, ForwardError> {
        let mut builder =
            Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs());

        if let Some(timeout) = config.forward_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ForwardError::ClientBuild(e.to_string()))?;

        info!(
            accept_invalid_certs = config.accept_invalid_certs(),
            timeout = ?config.forward_timeout(),
            "HttpForwarderを初期化"
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl EventForwarder for HttpForwarder {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn forward(&self, request: &ForwardRequest) -> Result<StatusCode, ForwardError> {
        let mut builder = self.client.post(&request.url).json(&request.event);

        if let Some(authorization) = &request.authorization {
            builder = builder.header(AUTHORIZATION, authorization.clone());
        }

        debug!("ゲートウェイへイベントを送信");

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ForwardError::Timeout(e.to_string())
            } else {
                ForwardError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(status);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ForwardError::HttpError {
            status: status.as_u16(),
            message,
        })
    }
}

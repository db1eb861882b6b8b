//! リクエスト単位のエラーハンドリング
//!
//! 中継ハンドラーで発生するエラーを分類し、HTTPステータスコードに対応付ける。
//! 呼び出し元には常に空のボディでステータスのみを返却する。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use thiserror::Error;

/// 中継リクエストのエラー
///
/// # エラー種別
/// - `GatewayFileMissing` / `GatewayFileUnreadable`: 環境起因（500）
/// - `InvalidPayload` / `MissingLastActivity`: 入力起因（400）
#[derive(Debug, Error)]
pub enum RelayError {
    /// ゲートウェイファイルが存在しない
    #[error("ゲートウェイファイルが存在しません: {}", .0.display())]
    GatewayFileMissing(PathBuf),

    /// ゲートウェイファイルの読み込みに失敗
    #[error("ゲートウェイファイルの読み込みに失敗しました: {}: {source}", .path.display())]
    GatewayFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// リクエストボディがJSONとして解釈できない
    #[error("JSONペイロードの解析に失敗しました: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// last_activityが存在しない、または偽値
    #[error("ペイロードにlast_activityがありません")]
    MissingLastActivity,
}

impl RelayError {
    /// エラーに対応するHTTPステータスコードを取得
    pub fn status(&self) -> StatusCode {
        match self {
            Self::GatewayFileMissing(_) | Self::GatewayFileUnreadable { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidPayload(_) | Self::MissingLastActivity => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

//! ゲートウェイファイルからの転送先ホスト名読み込み
//!
//! ファイルはリクエストごとに読み直し、キャッシュしない。
//! 本サーバーはこのファイルに書き込まない。

use crate::error::RelayError;
use std::path::Path;

/// 転送先ホスト名を読み込む
///
/// # Returns
/// - `Ok(String)`: 前後の空白を除去したホスト名
/// - `Err(RelayError::GatewayFileMissing)`: ファイルが存在しない
/// - `Err(RelayError::GatewayFileUnreadable)`: 読み込みに失敗
pub async fn read_gateway_host(path: &Path) -> Result<String, RelayError> {
    // 存在確認に失敗した場合も不在として扱う
    if !matches!(tokio::fs::try_exists(path).await, Ok(true)) {
        return Err(RelayError::GatewayFileMissing(path.to_path_buf()));
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RelayError::GatewayFileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(content.trim().to_string())
}

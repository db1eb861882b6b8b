// 中継サーバー設定
//
// リッスンアドレス、ゲートウェイファイルのパス、転送先URLテンプレート、
// TLS検証の有無を環境変数から読み込む。

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// リッスンアドレス環境変数名
const BIND_ADDR_ENV: &str = "RELAY_BIND_ADDR";

/// ゲートウェイファイルパス環境変数名
const GATEWAY_FILE_ENV: &str = "RELAY_GATEWAY_FILE";

/// 転送先URLテンプレート環境変数名
const FORWARD_URL_TEMPLATE_ENV: &str = "RELAY_FORWARD_URL_TEMPLATE";

/// TLS証明書検証無効化フラグ環境変数名
const ACCEPT_INVALID_CERTS_ENV: &str = "RELAY_ACCEPT_INVALID_CERTS";

/// 転送タイムアウト（秒）環境変数名
const FORWARD_TIMEOUT_SECS_ENV: &str = "RELAY_FORWARD_TIMEOUT_SECS";

/// デフォルトのリッスンアドレス（全インターフェース、ポート8000）
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// デフォルトのゲートウェイファイルパス
const DEFAULT_GATEWAY_FILE: &str = "/tmp/gateway";

/// デフォルトの転送先URLテンプレート
const DEFAULT_FORWARD_URL_TEMPLATE: &str = "https://{host}/collab/event";

/// テンプレート内のホスト名プレースホルダー
const HOST_PLACEHOLDER: &str = "{host}";

/// 設定エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 環境変数の値が不正
    #[error("環境変数 {name} の値が不正です: {value}")]
    InvalidEnvVar { name: String, value: String },

    /// URLテンプレートにプレースホルダーがない
    #[error("転送先URLテンプレートに {{host}} が含まれていません: {0}")]
    MissingHostPlaceholder(String),
}

/// 中継サーバーの設定
///
/// # フィールド
/// - `bind_addr`: HTTPサーバーのリッスンアドレス
/// - `gateway_file`: 転送先ホスト名を保持するファイルのパス
/// - `forward_url_template`: 転送先URL（`{host}`をホスト名で置換）
/// - `accept_invalid_certs`: 転送時にTLS証明書検証を無効化するか（開発用）
/// - `forward_timeout`: 転送リクエストのタイムアウト（未設定なら無制限）
#[derive(Debug, Clone)]
pub struct RelayConfig {
    bind_addr: SocketAddr,
    gateway_file: PathBuf,
    forward_url_template: String,
    accept_invalid_certs: bool,
    forward_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            gateway_file: PathBuf::from(DEFAULT_GATEWAY_FILE),
            forward_url_template: DEFAULT_FORWARD_URL_TEMPLATE.to_string(),
            accept_invalid_certs: false,
            forward_timeout: None,
        }
    }
}

impl RelayConfig {
    /// 指定したゲートウェイファイルで設定を作成（その他はデフォルト値）
    pub fn new(gateway_file: impl Into<PathBuf>) -> Self {
        Self {
            gateway_file: gateway_file.into(),
            ..Self::default()
        }
    }

    /// 環境変数から設定を読み込み
    ///
    /// # 環境変数
    /// - `RELAY_BIND_ADDR`: リッスンアドレス（デフォルト: 0.0.0.0:8000）
    /// - `RELAY_GATEWAY_FILE`: ゲートウェイファイルのパス（デフォルト: /tmp/gateway）
    /// - `RELAY_FORWARD_URL_TEMPLATE`: 転送先URLテンプレート（デフォルト: https://{host}/collab/event）
    /// - `RELAY_ACCEPT_INVALID_CERTS`: TLS証明書検証を無効化（デフォルト: false）
    /// - `RELAY_FORWARD_TIMEOUT_SECS`: 転送タイムアウト秒数（デフォルト: なし）
    ///
    /// # 戻り値
    /// - `Ok(RelayConfig)`: 設定が正常に読み込まれた
    /// - `Err(ConfigError)`: 値が解析できない
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr_raw =
            std::env::var(BIND_ADDR_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .parse::<SocketAddr>()
            .map_err(|_| invalid(BIND_ADDR_ENV, &bind_addr_raw))?;

        let gateway_file = std::env::var(GATEWAY_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_GATEWAY_FILE));

        let template = std::env::var(FORWARD_URL_TEMPLATE_ENV)
            .unwrap_or_else(|_| DEFAULT_FORWARD_URL_TEMPLATE.to_string());

        let accept_invalid_certs = match std::env::var(ACCEPT_INVALID_CERTS_ENV) {
            Ok(raw) => parse_bool(&raw).ok_or_else(|| invalid(ACCEPT_INVALID_CERTS_ENV, &raw))?,
            Err(_) => false,
        };

        let mut config = Self {
            bind_addr,
            gateway_file,
            ..Self::default()
        }
        .with_accept_invalid_certs(accept_invalid_certs)
        .with_forward_url_template(template)?;

        if let Ok(raw) = std::env::var(FORWARD_TIMEOUT_SECS_ENV) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid(FORWARD_TIMEOUT_SECS_ENV, &raw))?;
            config = config.with_forward_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// 転送先URLテンプレートを変更
    ///
    /// テンプレートには `{host}` が含まれている必要がある。
    pub fn with_forward_url_template(
        mut self,
        template: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let template = template.into();
        if !template.contains(HOST_PLACEHOLDER) {
            return Err(ConfigError::MissingHostPlaceholder(template));
        }
        self.forward_url_template = template;
        Ok(self)
    }

    /// TLS証明書検証の無効化を設定
    pub fn with_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Self {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }

    /// 転送タイムアウトを設定
    pub fn with_forward_timeout(mut self, timeout: Duration) -> Self {
        self.forward_timeout = Some(timeout);
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub fn gateway_file(&self) -> &Path {
        &self.gateway_file
    }

    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    pub fn forward_timeout(&self) -> Option<Duration> {
        self.forward_timeout
    }

    /// 転送先URLを構築
    ///
    /// # 戻り値
    /// 完全なURL (例: "https://gateway.example.com/collab/event")
    pub fn forward_url(&self, host: &str) -> String {
        self.forward_url_template.replace(HOST_PLACEHOLDER, host)
    }
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvVar {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

//! 受信・送信イベントのペイロード定義
//!
//! 受信したJSONから`last_activity`を取り出し、
//! ゲートウェイの`/collab/event`向けの形式に組み替える。

use crate::error::RelayError;
use serde::Serialize;
use serde_json::Value;

/// 送信イベントの種別
const ACTIVITY_EVENT_TYPE: &str = "activity";

/// 受信成功時のステータスメッセージ
const REQUEST_RECEIVED: &str = "Request received";

/// ゲートウェイへ送信するイベント
///
/// `{"event": {"type": "activity", "last_activity": <value>}}` の形でシリアライズされる。
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutboundEvent {
    pub event: ActivityEvent,
}

/// 送信イベント本体
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivityEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub last_activity: Value,
}

impl OutboundEvent {
    /// last_activityからアクティビティイベントを構築
    pub fn activity(last_activity: Value) -> Self {
        Self {
            event: ActivityEvent {
                kind: ACTIVITY_EVENT_TYPE,
                last_activity,
            },
        }
    }
}

/// 呼び出し元へ返すレスポンスボディ
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: &'static str,
}

impl RelayResponse {
    pub fn received() -> Self {
        Self {
            status: REQUEST_RECEIVED,
        }
    }
}

/// リクエストボディからlast_activityを抽出する
///
/// 値の形式（タイムスタンプかどうか）は検証しない。
///
/// # Returns
/// - `Ok(Value)`: 真値のlast_activity
/// - `Err(RelayError::InvalidPayload)`: JSONとして解析できない
/// - `Err(RelayError::MissingLastActivity)`: オブジェクトでない、フィールドがない、または偽値
pub fn extract_last_activity(body: &[u8]) -> Result<Value, RelayError> {
    let payload: Value = serde_json::from_slice(body)?;

    let last_activity = match payload {
        Value::Object(mut fields) => fields.remove("last_activity"),
        _ => None,
    };

    match last_activity {
        Some(value) if is_truthy(&value) => Ok(value),
        _ => Err(RelayError::MissingLastActivity),
    }
}

/// JSON値の真偽判定
///
/// null、false、数値の0、空文字列、空配列、空オブジェクトを偽とみなす。
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

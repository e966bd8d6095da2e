//! # tempdrop 共有型定義
//!
//! Gatewayとストレージバックエンド、および結合テストで共有するデータ構造。
//!
//! ## エンコーディング規則
//! - オブジェクトID: UUID v4 のハイフン区切り小文字文字列
//! - パスワードダイジェスト: SHA-256 の16進数文字列（小文字）

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// コンテンツタイプが保存されていない場合に返却するMIMEタイプ。
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// オブジェクトID
// ---------------------------------------------------------------------------

/// アップロード時に一度だけ払い出される不透明なオブジェクトID。
///
/// 一意性は確率的（122ビットの乱数）であり、ストアへの重複確認は行わない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// 新しいIDを生成する。
    ///
    /// OSの乱数源が利用できない場合は `uuid` 側でpanicする（プロセス致命的エラー）。
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// ダウンロード要求で受け取った文字列をIDとして扱う。
    /// 形式の検証は行わない（未知のIDは単にストアに存在しない）。
    pub fn from_request(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// パスワード
// ---------------------------------------------------------------------------

/// 保存時パスワードのSHA-256ダイジェスト。
///
/// 平文はストアに書き込まない。ダイジェスト同士の一致は元の文字列の完全一致と同値。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// 平文パスワードからダイジェストを計算する。
    pub fn of(password: &str) -> Self {
        Self(hex::encode(Sha256::digest(password.as_bytes())))
    }

    /// 提示された資格情報が保存時パスワードと一致するかを判定する。
    /// 比較はSHA-256ダイジェストのバイト列に対する定数時間比較。
    pub fn matches(&self, candidate: &str) -> bool {
        let Ok(expected) = hex::decode(&self.0) else {
            return false;
        };
        let actual = Sha256::digest(candidate.as_bytes());
        if expected.len() != actual.len() {
            return false;
        }
        expected.as_slice().ct_eq(actual.as_slice()).into()
    }
}

// ---------------------------------------------------------------------------
// オブジェクトレコード
// ---------------------------------------------------------------------------

/// オブジェクトに付随するメタデータ。作成後は変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// アップロード者が指定したMIMEタイプ
    pub content_type: Option<String>,
    /// 取得時に要求するパスワード。Noneなら公開オブジェクト
    pub password: Option<PasswordDigest>,
}

impl ObjectMetadata {
    /// アップロード時の入力からメタデータを構築する。
    ///
    /// 空文字列のパスワードおよびコンテンツタイプは「未指定」として扱う。
    pub fn from_upload(content_type: Option<String>, password: Option<&str>) -> Self {
        Self {
            content_type: content_type.filter(|ct| !ct.trim().is_empty()),
            password: password
                .filter(|p| !p.is_empty())
                .map(PasswordDigest::of),
        }
    }

    /// レスポンスの `content-type` ヘッダーに使用する値。
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    pub fn is_protected(&self) -> bool {
        self.password.is_some()
    }
}

/// ストアの保存単位。バイト列とメタデータ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: ObjectId,
    #[serde(with = "serde_bytes")]
    pub content: Vec<u8>,
    pub metadata: ObjectMetadata,
}

// ---------------------------------------------------------------------------
// HTTP ペイロード
// ---------------------------------------------------------------------------

/// POST /upload のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// 取得に使用するオブジェクトID
    pub id: ObjectId,
    /// 失効時刻（UNIXタイムスタンプ秒）。この時刻を過ぎると取得できない
    pub expires_at: u64,
}

/// エラーレスポンス `{ "error": "..." }`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

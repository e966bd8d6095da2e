//! # アクセスゲート
//!
//! 取得要求に対し、オブジェクト本体を返すか資格情報の再入力を求めるかを決める。
//! 副作用のない判定関数。試行回数によるロックアウトは行わない。

use tempdrop_types::ObjectRecord;

/// 判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// 本体を返してよい
    Grant,
    /// パスワードを付けて同じ要求を再送させる
    Challenge,
}

/// レコードと提示された資格情報から取得可否を判定する。
///
/// - パスワード未設定 → 常に `Grant`
/// - パスワード設定済みで一致 → `Grant`
/// - パスワード設定済みで未提示または不一致 → `Challenge`
pub fn authorize(record: &ObjectRecord, credential: Option<&str>) -> AccessDecision {
    let Some(expected) = &record.metadata.password else {
        return AccessDecision::Grant;
    };
    match credential {
        Some(candidate) if expected.matches(candidate) => AccessDecision::Grant,
        _ => AccessDecision::Challenge,
    }
}

//! # tempdrop Gateway
//!
//! 匿名・短期保存のオブジェクトストア。アップロードされたバイト列に
//! 不透明なIDを払い出し、TTLの間だけIDで取得できるようにする。
//!
//! ## 役割
//! - IDの生成とTTL付き保存
//! - コンテンツタイプの保存と返却
//! - パスワード保護されたオブジェクトの取得時チャレンジ
//! - CORSプリフライト応答
//!
//! 永続媒体は `storage::ObjectStore` で抽象化する。

pub mod access;
pub mod config;
pub mod cors;
pub mod endpoints;
pub mod error;
pub mod storage;

pub use config::{GatewayConfig, GatewayState};
pub use endpoints::router;
pub use error::GatewayError;

// インデックス名の導出と分解
//
// (warehouse_id, connection_id) の組から `{warehouse_id}-{connection_id}` 形式の
// インデックス名を作り、検索時に同じ区切り文字で分解する。

use thiserror::Error;

/// インデックス名の区切り文字
pub const SEPARATOR: char = '-';

/// インデックス名のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexNameError {
    /// 区切り文字で2要素に分解できない
    #[error("インデックス名を warehouse_id-connection_id に分解できません: {0}")]
    MalformedIndexName(String),
}

/// 倉庫IDと接続IDからインデックス名を構築する
pub fn build_index(warehouse_id: &str, connection_id: &str) -> String {
    format!("{warehouse_id}{SEPARATOR}{connection_id}")
}

/// インデックス名を (warehouse_id, connection_id) に分解する
///
/// 区切り文字でちょうど2要素に分かれない場合は `MalformedIndexName`。
pub fn split_index(index_name: &str) -> Result<(&str, &str), IndexNameError> {
    let mut parts = index_name.split(SEPARATOR);

    match (parts.next(), parts.next(), parts.next()) {
        (Some(warehouse_id), Some(connection_id), None) => Ok((warehouse_id, connection_id)),
        _ => Err(IndexNameError::MalformedIndexName(index_name.to_string())),
    }
}

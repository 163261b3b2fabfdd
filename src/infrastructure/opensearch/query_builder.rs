// QueryBuilder - 検索条件をOpenSearch Query DSLに変換
//
// インデックス名から倉庫・接続の組を復元し、任意の絞り込み条件と合わせて
// bool.filter クエリを生成する。

use crate::domain::{
    parse_date, split_index, DateBoundError, IndexNameError, SearchCriteria, DATE_FORMAT,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use thiserror::Error;

/// クエリ構築のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    /// インデックス名が不正
    #[error(transparent)]
    IndexName(#[from] IndexNameError),

    /// 日付境界が不正
    #[error(transparent)]
    Timestamp(#[from] DateBoundError),
}

/// 検索条件からOpenSearchクエリへの変換
///
/// # 変換ルール
/// - 全条件はAND結合（bool.filter）、スコア計算なし
/// - warehouse_id / connection_id: 常にterm query
/// - start_time / end_time: timestampのrange query（gte / lte、片側のみも可）
/// - status / operation: 指定時のみterm query
///
/// 条件が何も指定されていなくても、倉庫・接続の組で必ず絞り込む。
pub struct QueryBuilder;

impl QueryBuilder {
    /// 検索条件をクエリドキュメントに変換
    ///
    /// # 引数
    /// * `index_name` - `{warehouse_id}-{connection_id}` 形式のインデックス名
    /// * `criteria` - 任意の絞り込み条件
    ///
    /// # 戻り値
    /// `{"query": {"bool": {"filter": [...]}}}` 形式のJSON
    pub fn build_query(
        index_name: &str,
        criteria: &SearchCriteria,
    ) -> Result<Value, QueryBuildError> {
        let (warehouse_id, connection_id) = split_index(index_name)?;

        let mut filter_clauses = vec![
            Self::build_term_query("warehouse_id", warehouse_id),
            Self::build_term_query("connection_id", connection_id),
        ];

        if criteria.has_time_range() {
            let start = criteria.start_time.as_deref().map(parse_date).transpose()?;
            let end = criteria.end_time.as_deref().map(parse_date).transpose()?;

            if let Some(query) = Self::build_time_range_query(start, end) {
                filter_clauses.push(query);
            }
        }

        if let Some(status) = criteria.status {
            filter_clauses.push(Self::build_term_query("status", status.as_str()));
        }

        if let Some(operation) = criteria.operation {
            filter_clauses.push(Self::build_term_query("operation", operation.as_str()));
        }

        Ok(json!({
            "query": {
                "bool": {
                    "filter": filter_clauses
                }
            }
        }))
    }

    /// 完全一致のterm query
    fn build_term_query(field: &str, value: &str) -> Value {
        json!({
            "term": {
                field: value
            }
        })
    }

    /// start/endをtimestampのrange queryに変換
    ///
    /// 両方Noneの場合はNone。
    fn build_time_range_query(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Value> {
        if start.is_none() && end.is_none() {
            return None;
        }

        let mut range = serde_json::Map::new();

        if let Some(start_date) = start {
            range.insert(
                "gte".to_string(),
                json!(start_date.format(DATE_FORMAT).to_string()),
            );
        }

        if let Some(end_date) = end {
            range.insert(
                "lte".to_string(),
                json!(end_date.format(DATE_FORMAT).to_string()),
            );
        }

        Some(json!({
            "range": {
                "timestamp": range
            }
        }))
    }
}

/// 操作ログイベントを検索エンジンに格納・検索するためのリポジトリ
///
/// インデックス作成、イベント挿入、クエリ実行の3操作を抽象化する。
/// 実装はOpenSearch（`infrastructure::opensearch`）とテスト用の記録モック。
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::Event;

/// インデックス作成・検索のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// 対象インデックスが存在しない
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// リクエストがタイムアウトした
    #[error("Timeout: {0}")]
    Timeout(String),

    /// 接続に失敗
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// 検索エンジンがエラーを返した
    #[error("Engine error: status={status}, message={message}")]
    EngineError {
        /// HTTPステータスコード
        status: u16,
        /// レスポンスボディ
        message: String,
    },

    /// レスポンスのデシリアライズに失敗
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

/// イベント単位の挿入失敗
///
/// バッチ処理では記録のみ行い、後続イベントの処理は継続する。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InsertError {
    /// バージョン競合（409）
    #[error("Version conflict: {0}")]
    Conflict(String),

    /// 接続失敗・タイムアウト
    #[error("Transport error: {0}")]
    Transport(String),

    /// 検索エンジンがドキュメントを作成しなかった
    #[error("Document rejected: {0}")]
    Rejected(String),

    /// 分類できないエラー
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// 操作ログリポジトリトレイト
///
/// 呼び出し側は`insert`の前に`create_index`でインデックスの存在を保証すること。
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// インデックスを作成する（既に存在する場合は何もしない）
    async fn create_index(&self, index_name: &str) -> Result<(), RepositoryError>;

    /// イベントをインデックスに挿入する
    ///
    /// インデックスの作成は行わない。
    async fn insert(&self, event: &Event, index_name: &str) -> Result<(), InsertError>;

    /// クエリドキュメントを実行し、ヒットを検索エンジンの返却順で返す
    ///
    /// # 引数
    /// * `index_name` - 検索対象のインデックス
    /// * `query` - `QueryBuilder`が生成したクエリドキュメント
    async fn search(
        &self,
        index_name: &str,
        query: &Value,
    ) -> Result<Vec<Value>, RepositoryError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, Utc};
    use serde_json::json;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    // ==================== エラー表示テスト ====================

    #[test]
    fn test_repository_error_index_not_found_display() {
        let error = RepositoryError::IndexNotFound("warehouse_1-connection_1".to_string());
        assert_eq!(error.to_string(), "Index not found: warehouse_1-connection_1");
    }

    #[test]
    fn test_repository_error_engine_error_display() {
        let error = RepositoryError::EngineError {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "Engine error: status=500, message=boom");
    }

    #[test]
    fn test_insert_error_display() {
        assert_eq!(
            InsertError::Conflict("doc exists".to_string()).to_string(),
            "Version conflict: doc exists"
        );
        assert_eq!(
            InsertError::Transport("connection refused".to_string()).to_string(),
            "Transport error: connection refused"
        );
        assert_eq!(
            InsertError::Rejected("result=updated".to_string()).to_string(),
            "Document rejected: result=updated"
        );
        assert_eq!(
            InsertError::Unknown("?".to_string()).to_string(),
            "Unknown error: ?"
        );
    }

    // ==================== 記録モックリポジトリ ====================

    /// モックへの呼び出し記録
    #[derive(Debug, Clone, PartialEq)]
    pub enum RepositoryCall {
        CreateIndex(String),
        Insert {
            index_name: String,
            description: String,
        },
        Search {
            index_name: String,
            query: Value,
        },
    }

    /// ユニットテスト用の記録モックEventRepository
    ///
    /// 呼び出し順を記録し、挿入されたイベントをメモリ上に保持する。
    /// 検索はクエリドキュメントのterm/range句を評価して絞り込む。
    #[derive(Debug, Clone, Default)]
    pub struct RecordingEventRepository {
        /// 呼び出し記録（呼び出し順）
        calls: Arc<Mutex<Vec<RepositoryCall>>>,
        /// 存在するインデックス
        indices: Arc<Mutex<HashSet<String>>>,
        /// インデックス名 -> 挿入済みイベント
        documents: Arc<Mutex<HashMap<String, Vec<Event>>>>,
        /// n回目（0始まり）のinsertで返すエラー
        insert_failures: Arc<Mutex<HashMap<usize, InsertError>>>,
        /// create_indexで返すエラー（インデックス名指定）
        create_index_failures: Arc<Mutex<HashMap<String, RepositoryError>>>,
        /// insert呼び出し回数
        insert_count: Arc<Mutex<usize>>,
    }

    impl RecordingEventRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// n回目（0始まり）のinsertを失敗させる
        pub fn fail_insert_at(&self, ordinal: usize, error: InsertError) {
            self.insert_failures.lock().unwrap().insert(ordinal, error);
        }

        /// 指定インデックスのcreate_indexを失敗させる
        pub fn fail_create_index(&self, index_name: &str, error: RepositoryError) {
            self.create_index_failures
                .lock()
                .unwrap()
                .insert(index_name.to_string(), error);
        }

        pub fn calls(&self) -> Vec<RepositoryCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn has_index(&self, index_name: &str) -> bool {
            self.indices.lock().unwrap().contains(index_name)
        }

        pub fn documents(&self, index_name: &str) -> Vec<Event> {
            self.documents
                .lock()
                .unwrap()
                .get(index_name)
                .cloned()
                .unwrap_or_default()
        }

        fn record(&self, call: RepositoryCall) {
            self.calls.lock().unwrap().push(call);
        }

        /// クエリドキュメントのfilter句がすべてイベントに合致するか
        fn matches(event: &Event, query: &Value) -> bool {
            let document = serde_json::to_value(event).unwrap();
            let Some(filters) = query.pointer("/query/bool/filter").and_then(Value::as_array)
            else {
                return false;
            };

            filters.iter().all(|clause| {
                if let Some(term) = clause.get("term").and_then(Value::as_object) {
                    term.iter().all(|(field, value)| document.get(field) == Some(value))
                } else if let Some(range) = clause.pointer("/range/timestamp") {
                    let bound = |key: &str| -> Option<DateTime<Utc>> {
                        range.get(key).and_then(Value::as_str).map(|text| {
                            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                                .unwrap()
                                .and_hms_opt(0, 0, 0)
                                .unwrap()
                                .and_utc()
                        })
                    };
                    bound("gte").is_none_or(|gte| event.timestamp() >= gte)
                        && bound("lte").is_none_or(|lte| event.timestamp() <= lte)
                } else {
                    false
                }
            })
        }
    }

    #[async_trait]
    impl EventRepository for RecordingEventRepository {
        async fn create_index(&self, index_name: &str) -> Result<(), RepositoryError> {
            self.record(RepositoryCall::CreateIndex(index_name.to_string()));

            if let Some(error) = self.create_index_failures.lock().unwrap().get(index_name) {
                return Err(error.clone());
            }

            self.indices.lock().unwrap().insert(index_name.to_string());
            Ok(())
        }

        async fn insert(&self, event: &Event, index_name: &str) -> Result<(), InsertError> {
            self.record(RepositoryCall::Insert {
                index_name: index_name.to_string(),
                description: event.description().to_string(),
            });

            let ordinal = {
                let mut count = self.insert_count.lock().unwrap();
                let ordinal = *count;
                *count += 1;
                ordinal
            };

            if let Some(error) = self.insert_failures.lock().unwrap().remove(&ordinal) {
                return Err(error);
            }

            if !self.has_index(index_name) {
                return Err(InsertError::Rejected(format!(
                    "index_not_found_exception: {index_name}"
                )));
            }

            self.documents
                .lock()
                .unwrap()
                .entry(index_name.to_string())
                .or_default()
                .push(event.clone());
            Ok(())
        }

        async fn search(
            &self,
            index_name: &str,
            query: &Value,
        ) -> Result<Vec<Value>, RepositoryError> {
            self.record(RepositoryCall::Search {
                index_name: index_name.to_string(),
                query: query.clone(),
            });

            if !self.has_index(index_name) {
                return Err(RepositoryError::IndexNotFound(index_name.to_string()));
            }

            Ok(self
                .documents(index_name)
                .iter()
                .filter(|event| Self::matches(event, query))
                .map(|event| {
                    json!({
                        "_index": index_name,
                        "_source": event,
                    })
                })
                .collect())
        }
    }

    // ==================== モック自体のテスト ====================

    fn event(description: &str) -> Event {
        use crate::domain::{Operation, Status};
        use chrono::TimeZone;

        Event::new(
            "warehouse_1",
            "connection_1",
            Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap(),
            Operation::Insert,
            Status::Success,
            description,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_mock_insert_requires_index() {
        let repo = RecordingEventRepository::new();

        let result = repo.insert(&event("a"), "warehouse_1-connection_1").await;
        assert!(matches!(result, Err(InsertError::Rejected(_))));

        repo.create_index("warehouse_1-connection_1").await.unwrap();
        repo.insert(&event("b"), "warehouse_1-connection_1").await.unwrap();
        assert_eq!(repo.documents("warehouse_1-connection_1").len(), 1);
    }

    #[tokio::test]
    async fn test_mock_search_evaluates_filters() {
        let repo = RecordingEventRepository::new();
        repo.create_index("warehouse_1-connection_1").await.unwrap();
        repo.insert(&event("a"), "warehouse_1-connection_1").await.unwrap();

        let matching = json!({
            "query": { "bool": { "filter": [
                { "term": { "warehouse_id": "warehouse_1" } },
                { "range": { "timestamp": { "gte": "2024-01-05" } } }
            ] } }
        });
        let not_matching = json!({
            "query": { "bool": { "filter": [
                { "term": { "status": "FAILURE" } }
            ] } }
        });

        assert_eq!(
            repo.search("warehouse_1-connection_1", &matching).await.unwrap().len(),
            1
        );
        assert!(
            repo.search("warehouse_1-connection_1", &not_matching)
                .await
                .unwrap()
                .is_empty()
        );
    }
}

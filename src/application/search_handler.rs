/// 操作ログの検索ハンドラー
///
/// インデックス名と絞り込み条件からクエリを構築し、リポジトリで実行する。
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::SearchCriteria;
use crate::infrastructure::{EventRepository, QueryBuildError, QueryBuilder, RepositoryError};

/// 検索ハンドラーのエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchHandlerError {
    /// クエリ構築エラー（インデックス名・日付の形式不正）
    #[error(transparent)]
    Query(#[from] QueryBuildError),

    /// リポジトリエラー
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 操作ログを検索するハンドラー
pub struct SearchHandler<R>
where
    R: EventRepository,
{
    repository: R,
}

impl<R> SearchHandler<R>
where
    R: EventRepository,
{
    /// 新しいSearchHandlerを作成
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// 検索を実行し、ヒットを検索エンジンの返却順で返す
    #[instrument(skip(self, criteria))]
    pub async fn search(
        &self,
        index_name: &str,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Value>, SearchHandlerError> {
        let query = QueryBuilder::build_query(index_name, criteria)?;
        debug!(query = %query, "クエリを構築");

        Ok(self.repository.search(index_name, &query).await?)
    }
}

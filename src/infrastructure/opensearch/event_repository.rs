// OpenSearchEventRepository - OpenSearchを使用したEventRepository実装
//
// インデックス作成・イベント挿入・検索をOpenSearch APIで行う。
// 再試行は行わず、失敗はそのまま呼び出し元に返す。

use super::client::{OpenSearchClient, OpenSearchClientError};
use super::config::RepoConfig;
use crate::domain::Event;
use crate::infrastructure::event_repository::{EventRepository, InsertError, RepositoryError};
use async_trait::async_trait;
use opensearch::indices::{IndicesCreateParts, IndicesExistsParts};
use opensearch::{IndexParts, SearchParts};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

/// インデックス重複作成時にOpenSearchが返すエラー種別
const ALREADY_EXISTS_ERROR: &str = "resource_already_exists_exception";

/// OpenSearchを使用したEventRepository実装
#[derive(Clone)]
pub struct OpenSearchEventRepository {
    /// OpenSearchクライアント
    client: OpenSearchClient,
    /// 新規インデックスのシャード数
    number_of_shards: u32,
}

impl std::fmt::Debug for OpenSearchEventRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchEventRepository")
            .field("base_url", &self.client.base_url().as_str())
            .field("number_of_shards", &self.number_of_shards)
            .finish_non_exhaustive()
    }
}

impl OpenSearchEventRepository {
    /// 設定からOpenSearchEventRepositoryを作成
    ///
    /// # Arguments
    /// * `config` - OpenSearch接続設定
    ///
    /// # Returns
    /// * `Ok(OpenSearchEventRepository)` - 初期化されたリポジトリ
    /// * `Err(OpenSearchClientError)` - クライアントの初期化に失敗
    pub fn new(config: &RepoConfig) -> Result<Self, OpenSearchClientError> {
        let client = OpenSearchClient::new(config)?;

        info!(
            base_url = %client.base_url(),
            number_of_shards = config.number_of_shards(),
            "OpenSearchEventRepositoryの初期化が完了"
        );

        Ok(Self {
            client,
            number_of_shards: config.number_of_shards(),
        })
    }

    /// インデックス作成リクエストのボディ
    fn index_settings_body(number_of_shards: u32) -> Value {
        json!({
            "settings": {
                "index": {
                    "number_of_shards": number_of_shards
                }
            }
        })
    }

    /// インデックスが存在するか
    async fn index_exists(&self, index_name: &str) -> Result<bool, RepositoryError> {
        let response = self
            .client
            .client()
            .indices()
            .exists(IndicesExistsParts::Index(&[index_name]))
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(Self::parse_error_status(index_name, status, "")),
        }
    }

    /// 並行作成などで既に存在していた場合のエラーレスポンスか
    fn is_already_exists(status: u16, body: &str) -> bool {
        status == 400 && body.contains(ALREADY_EXISTS_ERROR)
    }

    /// 送信エラーを変換
    fn map_transport_error(e: opensearch::Error) -> RepositoryError {
        error!(error = %e, "OpenSearchリクエストに失敗");
        if e.is_timeout() {
            RepositoryError::Timeout(e.to_string())
        } else {
            RepositoryError::ConnectionError(e.to_string())
        }
    }

    /// HTTPエラーステータスコードを対応するエラー型に変換
    fn parse_error_status(index_name: &str, status: u16, body: &str) -> RepositoryError {
        // インデックス不存在
        if status == 404 {
            error!(index_name = index_name, body = %body, "インデックスが存在しません");
            return RepositoryError::IndexNotFound(index_name.to_string());
        }

        // タイムアウト
        if status == 408 || status == 504 {
            error!(status = status, body = %body, "リクエストがタイムアウトしました");
            return RepositoryError::Timeout(format!("status: {}", status));
        }

        error!(status = status, body = %body, "OpenSearchエラー");
        RepositoryError::EngineError {
            status,
            message: body.to_string(),
        }
    }

    /// インデックスAPIのレスポンスを検証
    ///
    /// `result`が`created`以外なら失敗。`result`を含まないレスポンスは成功とみなす。
    fn check_index_result(response: &Value) -> Result<(), InsertError> {
        match response.get("result").and_then(Value::as_str) {
            Some("created") | None => Ok(()),
            Some(other) => Err(InsertError::Rejected(format!(
                "ドキュメントが作成されませんでした: result={}",
                other
            ))),
        }
    }

    /// 検索レスポンスからヒットを抽出（hits.hits）
    fn extract_hits(response: &Value) -> Result<Vec<Value>, RepositoryError> {
        response
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::DeserializationError(
                    "レスポンスにhitsフィールドがありません".to_string(),
                )
            })
    }
}

#[async_trait]
impl EventRepository for OpenSearchEventRepository {
    /// インデックスを作成（既に存在する場合はスキップ）
    #[instrument(skip(self))]
    async fn create_index(&self, index_name: &str) -> Result<(), RepositoryError> {
        if self.index_exists(index_name).await? {
            info!(index_name = index_name, "インデックスが既に存在するため作成をスキップ");
            return Ok(());
        }

        let response = self
            .client
            .client()
            .indices()
            .create(IndicesCreateParts::Index(index_name))
            .body(Self::index_settings_body(self.number_of_shards))
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status_code().as_u16();
        if (200..300).contains(&status) {
            info!(index_name = index_name, "インデックスを作成");
            return Ok(());
        }

        let body = response.text().await.map_err(Self::map_transport_error)?;
        if Self::is_already_exists(status, &body) {
            debug!(index_name = index_name, "インデックスは作成済み");
            return Ok(());
        }

        Err(Self::parse_error_status(index_name, status, &body))
    }

    /// イベントを挿入（ドキュメントIDは自動採番）
    #[instrument(skip(self, event), fields(warehouse_id = event.warehouse_id(), connection_id = event.connection_id()))]
    async fn insert(&self, event: &Event, index_name: &str) -> Result<(), InsertError> {
        let response = self
            .client
            .client()
            .index(IndexParts::Index(index_name))
            .body(event)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "イベント挿入リクエスト失敗");
                InsertError::Transport(e.to_string())
            })?;

        let status = response.status_code().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| InsertError::Transport(format!("レスポンス取得エラー: {}", e)))?;

        if status == 409 {
            warn!(index_name = index_name, body = %body, "バージョン競合");
            return Err(InsertError::Conflict(body));
        }

        if !(200..300).contains(&status) {
            warn!(index_name = index_name, status = status, body = %body, "イベント挿入エラー");
            return Err(InsertError::Rejected(format!(
                "status={}, body={}",
                status, body
            )));
        }

        let response_json: Value = serde_json::from_str(&body)
            .map_err(|e| InsertError::Unknown(format!("レスポンスパースエラー: {}", e)))?;

        Self::check_index_result(&response_json)?;

        let document_id = response_json
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        debug!(
            index_name = index_name,
            document_id = document_id,
            "イベントの挿入に成功"
        );
        Ok(())
    }

    /// クエリを実行してヒットを返す（ソート指定なし）
    #[instrument(skip(self, query))]
    async fn search(
        &self,
        index_name: &str,
        query: &Value,
    ) -> Result<Vec<Value>, RepositoryError> {
        debug!(query_body = %query, "クエリを実行");

        let response = self
            .client
            .client()
            .search(SearchParts::Index(&[index_name]))
            .body(query)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status_code().as_u16();
        let response_body = response.text().await.map_err(Self::map_transport_error)?;

        if status >= 400 {
            return Err(Self::parse_error_status(index_name, status, &response_body));
        }

        let response_json: Value = serde_json::from_str(&response_body).map_err(|e| {
            error!(error = %e, body = %response_body, "レスポンスのパースに失敗");
            RepositoryError::DeserializationError(format!("レスポンスパースエラー: {}", e))
        })?;

        let hits = Self::extract_hits(&response_json)?;

        info!(index_name = index_name, result_count = hits.len(), "クエリが完了");
        Ok(hits)
    }
}

// OpenSearchクライアント
//
// Basic認証付きでOpenSearchに接続するクライアント。
// 自己署名証明書のクラスタにも接続できるよう、証明書検証は設定で切り替える。

use super::config::{RepoConfig, RepoConfigError};
use opensearch::auth::Credentials;
use opensearch::cert::CertificateValidation;
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use opensearch::OpenSearch;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

/// リクエストタイムアウト（秒）
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// OpenSearchクライアントエラー
#[derive(Debug, Error)]
pub enum OpenSearchClientError {
    /// エンドポイントが不正
    #[error("エンドポイントの構築に失敗: {0}")]
    Endpoint(#[from] RepoConfigError),

    /// トランスポート構築に失敗
    #[error("トランスポート構築に失敗: {0}")]
    TransportBuildError(String),
}

/// OpenSearchクライアント
///
/// シングルノード接続プールでコネクションを再利用する。
#[derive(Clone)]
pub struct OpenSearchClient {
    /// OpenSearchクライアントインスタンス
    client: OpenSearch,
    /// ベースURL（`http(s)://host:port/`）
    base_url: Url,
}

impl std::fmt::Debug for OpenSearchClient {
    // トランスポートは認証情報を含むため出力しない
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl OpenSearchClient {
    /// 設定からOpenSearchクライアントを作成
    ///
    /// # Arguments
    /// * `config` - OpenSearch接続設定
    ///
    /// # Returns
    /// * `Ok(OpenSearchClient)` - 初期化されたクライアント
    /// * `Err(OpenSearchClientError)` - 初期化に失敗
    pub fn new(config: &RepoConfig) -> Result<Self, OpenSearchClientError> {
        let base_url = config.base_url()?;

        info!(
            base_url = %base_url,
            username = config.username(),
            verify_certs = config.verify_certs(),
            "OpenSearchクライアントを初期化中"
        );

        let cert_validation = if config.verify_certs() {
            CertificateValidation::Default
        } else {
            if config.use_ssl() {
                warn!(base_url = %base_url, "サーバー証明書の検証が無効化されています");
            }
            CertificateValidation::None
        };

        let conn_pool = SingleNodeConnectionPool::new(base_url.clone());

        let transport = TransportBuilder::new(conn_pool)
            .auth(Credentials::Basic(
                config.username().to_string(),
                config.password().to_string(),
            ))
            .cert_validation(cert_validation)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                error!(error = %e, "OpenSearchトランスポート構築に失敗");
                OpenSearchClientError::TransportBuildError(e.to_string())
            })?;

        Ok(Self {
            client: OpenSearch::new(transport),
            base_url,
        })
    }

    /// 内部OpenSearchクライアントへの参照を取得
    pub fn client(&self) -> &OpenSearch {
        &self.client
    }

    /// ベースURLを取得
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

// インフラストラクチャ層モジュール
pub mod event_repository;
pub mod logging;
pub mod opensearch;

// 再エクスポート
pub use event_repository::{EventRepository, InsertError, RepositoryError};
pub use logging::init_logging;
pub use opensearch::{
    OpenSearchClient, OpenSearchClientError, OpenSearchEventRepository, QueryBuildError,
    QueryBuilder, RepoConfig, RepoConfigError,
};

// OpenSearch連携モジュール
mod client;
mod config;
mod event_repository;
mod query_builder;

// 再エクスポート
pub use client::{OpenSearchClient, OpenSearchClientError};
pub use config::{RepoConfig, RepoConfigError};
pub use event_repository::OpenSearchEventRepository;
pub use query_builder::{QueryBuildError, QueryBuilder};

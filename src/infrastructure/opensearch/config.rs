// OpenSearch接続設定
//
// 環境変数からホスト・ポート・認証情報を読み取る。
// 起動時に一度だけ構築し、以降は読み取り専用で使用する。

use thiserror::Error;
use url::Url;

/// OpenSearch設定のエラー型
#[derive(Debug, Error)]
pub enum RepoConfigError {
    /// 環境変数が欠落
    #[error("環境変数が設定されていません: {0}")]
    MissingEnvVar(String),

    /// 値が不正
    #[error("不正な設定値: {name}={value}")]
    InvalidValue {
        /// 環境変数名
        name: String,
        /// 設定された値
        value: String,
    },

    /// ホストとポートから有効なURLを構築できない
    #[error("無効なエンドポイント: {0}")]
    InvalidEndpoint(String),
}

/// OpenSearch接続設定
///
/// 環境変数:
/// - OPENSEARCH_HOST: ホスト名（必須）
/// - OPENSEARCH_PORT: ポート番号（デフォルト: 9200）
/// - OPENSEARCH_USERNAME: Basic認証ユーザー名（必須）
/// - OPENSEARCH_PASSWORD: Basic認証パスワード（必須）
/// - OPENSEARCH_USE_SSL: HTTPSで接続するか（デフォルト: true）
/// - OPENSEARCH_VERIFY_CERTS: サーバー証明書を検証するか（デフォルト: false）
/// - OPENSEARCH_SHARDS: 新規インデックスのシャード数（デフォルト: 1）
#[derive(Clone)]
pub struct RepoConfig {
    host: String,
    port: u16,
    username: String,
    password: String,
    use_ssl: bool,
    verify_certs: bool,
    number_of_shards: u32,
}

impl std::fmt::Debug for RepoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("use_ssl", &self.use_ssl)
            .field("verify_certs", &self.verify_certs)
            .field("number_of_shards", &self.number_of_shards)
            .finish_non_exhaustive()
    }
}

impl RepoConfig {
    /// デフォルトのポート番号
    pub const DEFAULT_PORT: u16 = 9200;

    /// デフォルトのシャード数
    pub const DEFAULT_NUMBER_OF_SHARDS: u32 = 1;

    /// 明示的な値で設定を作成
    ///
    /// HTTPS接続・証明書検証なし・シャード数1で初期化される。
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            use_ssl: true,
            verify_certs: false,
            number_of_shards: Self::DEFAULT_NUMBER_OF_SHARDS,
        }
    }

    /// HTTPSで接続するかを設定
    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    /// サーバー証明書を検証するかを設定
    pub fn with_verify_certs(mut self, verify_certs: bool) -> Self {
        self.verify_certs = verify_certs;
        self
    }

    /// 新規インデックスのシャード数を設定
    pub fn with_number_of_shards(mut self, number_of_shards: u32) -> Self {
        self.number_of_shards = number_of_shards;
        self
    }

    /// 環境変数から設定を読み込む
    ///
    /// # エラー
    /// - `MissingEnvVar`: 必須の環境変数が設定されていない
    /// - `InvalidValue`: ポート・真偽値・シャード数が解釈できない
    pub fn from_env() -> Result<Self, RepoConfigError> {
        let host = required_env("OPENSEARCH_HOST")?;
        let username = required_env("OPENSEARCH_USERNAME")?;
        let password = required_env("OPENSEARCH_PASSWORD")?;

        let port = parsed_env("OPENSEARCH_PORT", Self::DEFAULT_PORT, |v| v.parse().ok())?;
        let use_ssl = parsed_env("OPENSEARCH_USE_SSL", true, parse_bool)?;
        let verify_certs = parsed_env("OPENSEARCH_VERIFY_CERTS", false, parse_bool)?;
        let number_of_shards = parsed_env(
            "OPENSEARCH_SHARDS",
            Self::DEFAULT_NUMBER_OF_SHARDS,
            |v| v.parse::<u32>().ok().filter(|n| *n > 0),
        )?;

        let config = Self {
            host,
            port,
            username,
            password,
            use_ssl,
            verify_certs,
            number_of_shards,
        };
        config.base_url()?;

        Ok(config)
    }

    /// ベースURL（`http(s)://host:port`）を構築
    pub fn base_url(&self) -> Result<Url, RepoConfigError> {
        let scheme = if self.use_ssl { "https" } else { "http" };
        let raw = format!("{}://{}:{}", scheme, self.host, self.port);

        let url = Url::parse(&raw)
            .map_err(|e| RepoConfigError::InvalidEndpoint(format!("{}: {}", raw, e)))?;

        // ホスト部にパスやクエリが紛れ込んでいないことを確認
        if url.path() != "/" || url.query().is_some() {
            return Err(RepoConfigError::InvalidEndpoint(raw));
        }

        Ok(url)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn use_ssl(&self) -> bool {
        self.use_ssl
    }

    pub fn verify_certs(&self) -> bool {
        self.verify_certs
    }

    pub fn number_of_shards(&self) -> u32 {
        self.number_of_shards
    }
}

fn required_env(name: &str) -> Result<String, RepoConfigError> {
    std::env::var(name).map_err(|_| RepoConfigError::MissingEnvVar(name.to_string()))
}

/// 任意の環境変数を読み込み、未設定ならデフォルト値を返す
fn parsed_env<T>(
    name: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, RepoConfigError> {
    match std::env::var(name) {
        Ok(value) => parse(value.trim()).ok_or_else(|| RepoConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: [&str; 7] = [
        "OPENSEARCH_HOST",
        "OPENSEARCH_PORT",
        "OPENSEARCH_USERNAME",
        "OPENSEARCH_PASSWORD",
        "OPENSEARCH_USE_SSL",
        "OPENSEARCH_VERIFY_CERTS",
        "OPENSEARCH_SHARDS",
    ];

    // 環境変数を設定/削除するヘルパー (Rust 2024ではunsafe)
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) };
    }

    fn clear_env() {
        for key in ALL_VARS {
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set_required_env() {
        set_env("OPENSEARCH_HOST", "localhost");
        set_env("OPENSEARCH_USERNAME", "admin");
        set_env("OPENSEARCH_PASSWORD", "secret");
    }

    #[test]
    fn test_new_defaults() {
        let config = RepoConfig::new("localhost", 9200, "admin", "secret");

        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), 9200);
        assert_eq!(config.username(), "admin");
        assert_eq!(config.password(), "secret");
        assert!(config.use_ssl());
        assert!(!config.verify_certs());
        assert_eq!(config.number_of_shards(), 1);
    }

    #[test]
    fn test_builder_overrides() {
        let config = RepoConfig::new("localhost", 9200, "admin", "secret")
            .with_ssl(false)
            .with_verify_certs(true)
            .with_number_of_shards(4);

        assert!(!config.use_ssl());
        assert!(config.verify_certs());
        assert_eq!(config.number_of_shards(), 4);
    }

    #[test]
    fn test_base_url_https() {
        let config = RepoConfig::new("search.example.com", 9200, "admin", "secret");
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://search.example.com:9200/"
        );
    }

    #[test]
    fn test_base_url_http() {
        let config = RepoConfig::new("127.0.0.1", 9201, "admin", "secret").with_ssl(false);
        assert_eq!(config.base_url().unwrap().as_str(), "http://127.0.0.1:9201/");
    }

    #[test]
    fn test_base_url_rejects_host_with_path() {
        let config = RepoConfig::new("localhost/extra", 9200, "admin", "secret");
        assert!(matches!(
            config.base_url(),
            Err(RepoConfigError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = RepoConfig::new("localhost", 9200, "admin", "Justatest@2024");
        let debug = format!("{:?}", config);
        assert!(debug.contains("localhost"));
        assert!(!debug.contains("Justatest@2024"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        set_required_env();

        let config = RepoConfig::from_env().expect("設定の読み込みに失敗");

        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), RepoConfig::DEFAULT_PORT);
        assert!(config.use_ssl());
        assert!(!config.verify_certs());
        assert_eq!(config.number_of_shards(), 1);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        set_required_env();
        set_env("OPENSEARCH_PORT", "9300");
        set_env("OPENSEARCH_USE_SSL", "false");
        set_env("OPENSEARCH_VERIFY_CERTS", "TRUE");
        set_env("OPENSEARCH_SHARDS", "4");

        let config = RepoConfig::from_env().expect("設定の読み込みに失敗");

        assert_eq!(config.port(), 9300);
        assert!(!config.use_ssl());
        assert!(config.verify_certs());
        assert_eq!(config.number_of_shards(), 4);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_host() {
        clear_env();
        set_env("OPENSEARCH_USERNAME", "admin");
        set_env("OPENSEARCH_PASSWORD", "secret");

        match RepoConfig::from_env().unwrap_err() {
            RepoConfigError::MissingEnvVar(var) => assert_eq!(var, "OPENSEARCH_HOST"),
            other => panic!("予期しないエラー型: {:?}", other),
        }

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_password() {
        clear_env();
        set_env("OPENSEARCH_HOST", "localhost");
        set_env("OPENSEARCH_USERNAME", "admin");

        match RepoConfig::from_env().unwrap_err() {
            RepoConfigError::MissingEnvVar(var) => assert_eq!(var, "OPENSEARCH_PASSWORD"),
            other => panic!("予期しないエラー型: {:?}", other),
        }

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        clear_env();
        set_required_env();
        set_env("OPENSEARCH_PORT", "not-a-port");

        match RepoConfig::from_env().unwrap_err() {
            RepoConfigError::InvalidValue { name, value } => {
                assert_eq!(name, "OPENSEARCH_PORT");
                assert_eq!(value, "not-a-port");
            }
            other => panic!("予期しないエラー型: {:?}", other),
        }

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_zero_shards_is_invalid() {
        clear_env();
        set_required_env();
        set_env("OPENSEARCH_SHARDS", "0");

        assert!(matches!(
            RepoConfig::from_env(),
            Err(RepoConfigError::InvalidValue { .. })
        ));

        clear_env();
    }

    #[test]
    fn test_error_display() {
        let error = RepoConfigError::MissingEnvVar("OPENSEARCH_HOST".to_string());
        assert_eq!(error.to_string(), "環境変数が設定されていません: OPENSEARCH_HOST");

        let error = RepoConfigError::InvalidValue {
            name: "OPENSEARCH_PORT".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(error.to_string(), "不正な設定値: OPENSEARCH_PORT=abc");
    }
}

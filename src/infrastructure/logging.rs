/// ログ基盤モジュール
///
/// CLI向けの構造化ログ設定を提供する。
/// 検索結果を標準出力に書き出すため、ログはJSON形式で標準エラーに出力する。
use std::sync::Once;

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// ログサブスクライバー初期化用の同期プリミティブ
static INIT: Once = Once::new();

/// 既定のログレベル
const DEFAULT_LOG_LEVEL: &str = "info";

/// CLI向けのログサブスクライバーを初期化する
///
/// 環境変数`RUST_LOG`または既定のログレベル（info）でフィルタリングする。
/// 複数回呼び出しても最初の呼び出しのみ初期化を実行する。
///
/// # 使用例
/// ```ignore
/// use oplog::infrastructure::init_logging;
///
/// init_logging();
/// tracing::info!(count = 1000, "シード開始");
/// ```
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

        // 他のサブスクライバーが登録済みでもパニックしない
        let _ = json_subscriber(env_filter, std::io::stderr).try_init();
    });
}

/// JSON形式の構造化ログを`make_writer`に書き出すサブスクライバーを構築する
fn json_subscriber<W>(env_filter: EnvFilter, make_writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(make_writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .flatten_event(true)
        .with_current_span(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
}

/// テスト用のログサブスクライバーを初期化する（人間が読みやすい形式）
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    });
}

/// 操作ログCLI
///
/// ランダムな操作ログイベントをOpenSearchに投入し、
/// 倉庫・接続の組ごとのインデックスから絞り込み検索を行う。
///
/// # 環境変数
/// - OPENSEARCH_HOST / OPENSEARCH_USERNAME / OPENSEARCH_PASSWORD: 接続先（必須）
/// - OPENSEARCH_PORT / OPENSEARCH_USE_SSL / OPENSEARCH_VERIFY_CERTS / OPENSEARCH_SHARDS: 任意
/// - RUST_LOG: ログレベル（デフォルト: info）
///
/// # ローカル実行
/// ```bash
/// export OPENSEARCH_HOST=localhost
/// export OPENSEARCH_USERNAME=admin
/// export OPENSEARCH_PASSWORD=admin
///
/// # 1000件投入
/// cargo run --bin oplog -- seed
///
/// # 件数指定
/// cargo run --bin oplog -- seed --count 50
///
/// # 検索
/// cargo run --bin oplog -- search --index warehouse_1-connection_2 --status FAILURE \
///     --start-time 2024-01-01 --end-time 2024-01-31
/// ```
use chrono::Utc;
use clap::{Parser, Subcommand};
use oplog::application::{EventHandler, SearchHandler};
use oplog::domain::{generate_events, Operation, SearchCriteria, Status};
use oplog::infrastructure::{init_logging, OpenSearchEventRepository, RepoConfig};
use tracing::{error, info, warn};

type Error = Box<dyn std::error::Error + Send + Sync>;

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "oplog")]
#[command(about = "倉庫・接続ごとの操作ログをOpenSearchに記録・検索")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// ランダムなイベントを生成して投入
    Seed {
        /// 生成件数
        #[arg(long, short = 'n', default_value_t = 1000)]
        count: usize,
    },

    /// インデックスを検索してヒットをJSONで出力
    Search {
        /// `{warehouse_id}-{connection_id}` 形式のインデックス名
        #[arg(long, short = 'i')]
        index: String,

        /// 操作種別（INSERT / UPDATE / DELETE / SELECT）
        #[arg(long)]
        operation: Option<Operation>,

        /// 状態（SUCCESS / FAILURE / PENDING）
        #[arg(long)]
        status: Option<Status>,

        /// 開始日（YYYY-MM-DD、この日を含む）
        #[arg(long)]
        start_time: Option<String>,

        /// 終了日（YYYY-MM-DD）
        #[arg(long)]
        end_time: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let cli = Cli::parse();

    let config = RepoConfig::from_env().map_err(|e| {
        error!(error = %e, "設定の読み込みに失敗");
        e
    })?;
    let repository = OpenSearchEventRepository::new(&config)?;

    match cli.command {
        Command::Seed { count } => seed(repository, count).await,
        Command::Search {
            index,
            operation,
            status,
            start_time,
            end_time,
        } => {
            let criteria = SearchCriteria {
                operation,
                status,
                start_time,
                end_time,
            };
            search(repository, &index, &criteria).await
        }
    }
}

/// イベントを生成してバッチ投入
async fn seed(repository: OpenSearchEventRepository, count: usize) -> Result<(), Error> {
    // ThreadRngはSendでないため、await前にスコープを抜ける
    let events = {
        let mut rng = rand::thread_rng();
        generate_events(count, Utc::now(), &mut rng)?
    };

    info!(event_count = events.len(), "イベントの投入を開始");

    let handler = EventHandler::new(repository);
    let report = handler.process(&events).await?;

    for failure in report.failures() {
        if let Err(e) = &failure.result {
            warn!(
                position = failure.position,
                index_name = %failure.index_name,
                error = %e,
                "投入できなかったイベント"
            );
        }
    }

    info!(
        index_count = report.ensured_indices.len(),
        success_count = report.success_count(),
        failure_count = report.failure_count(),
        "イベントの投入が完了"
    );

    Ok(())
}

/// 検索してヒットを標準出力に書き出す
async fn search(
    repository: OpenSearchEventRepository,
    index_name: &str,
    criteria: &SearchCriteria,
) -> Result<(), Error> {
    let handler = SearchHandler::new(repository);
    let hits = handler.search(index_name, criteria).await?;

    info!(index_name = index_name, hit_count = hits.len(), "検索が完了");

    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

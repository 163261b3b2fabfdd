// ダミーイベント生成
//
// 検証用クラスタへの投入データを作る。倉庫・接続は各5種類、
// タイムスタンプは基準時刻から過去30日間に一様に分布させる。

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::event::{Event, EventValidationError, Operation, Status};

/// 倉庫IDの種類数（warehouse_1 ..= warehouse_5）
const WAREHOUSE_COUNT: u32 = 5;

/// 接続IDの種類数（connection_1 ..= connection_5）
const CONNECTION_COUNT: u32 = 5;

/// タイムスタンプを分布させる日数
const LOOKBACK_DAYS: i64 = 30;

/// 説明文の候補
const DESCRIPTIONS: [&str; 5] = [
    "Operation completed successfully.",
    "Operation failed due to timeout.",
    "Operation is pending approval.",
    "Operation completed with warnings.",
    "Operation failed due to syntax error.",
];

/// ランダムなイベントを `count` 件生成する
///
/// # 引数
/// * `count` - 生成件数
/// * `now` - タイムスタンプ範囲の終端
/// * `rng` - 乱数生成器（シード固定で再現可能）
pub fn generate_events<R: Rng>(
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<Event>, EventValidationError> {
    (0..count).map(|_| generate_event(now, rng)).collect()
}

fn generate_event<R: Rng>(
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Event, EventValidationError> {
    let warehouse_id = format!("warehouse_{}", rng.gen_range(1..=WAREHOUSE_COUNT));
    let connection_id = format!("connection_{}", rng.gen_range(1..=CONNECTION_COUNT));

    let window_ms = Duration::days(LOOKBACK_DAYS).num_milliseconds();
    let timestamp = now - Duration::days(LOOKBACK_DAYS)
        + Duration::milliseconds(rng.gen_range(0..=window_ms));

    let operation = Operation::ALL[rng.gen_range(0..Operation::ALL.len())];
    let status = Status::ALL[rng.gen_range(0..Status::ALL.len())];
    let description = DESCRIPTIONS[rng.gen_range(0..DESCRIPTIONS.len())];

    Event::new(
        warehouse_id,
        connection_id,
        timestamp,
        operation,
        status,
        description,
    )
}

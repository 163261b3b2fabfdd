// 検索範囲の日付境界の検証
//
// 絞り込みAPIは日単位の境界のみ受け付ける。YYYY-MM-DD以外の形式
// （時刻付きの日時を含む）はすべて拒否する。

use chrono::NaiveDate;
use thiserror::Error;

/// 日付境界のフォーマット
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 日付境界のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateBoundError {
    /// YYYY-MM-DD形式ではない、または存在しない日付
    #[error("タイムスタンプの形式はYYYY-MM-DDである必要があります: {0:?}")]
    InvalidTimestampFormat(String),
}

/// YYYY-MM-DD形式の文字列を日付に変換する
///
/// 年4桁・月2桁・日2桁をハイフンで区切った形式のみ受け付ける。
/// chronoのパーサーは桁数に寛容なため、先に形を検査してから暦として検証する。
pub fn parse_date(input: &str) -> Result<NaiveDate, DateBoundError> {
    if !has_calendar_date_shape(input) {
        return Err(DateBoundError::InvalidTimestampFormat(input.to_string()));
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| DateBoundError::InvalidTimestampFormat(input.to_string()))
}

fn has_calendar_date_shape(input: &str) -> bool {
    let bytes = input.as_bytes();

    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

// 検索条件
//
// 検索時に指定できる任意の絞り込み条件。倉庫・接続の組はインデックス名から
// 導出されるためここには含まない。日付境界は未検証の文字列のまま保持し、
// クエリ構築時に検証する。

use super::event::{Operation, Status};

/// 操作ログの検索条件
///
/// ```ignore
/// let criteria = SearchCriteria::new()
///     .status(Status::Failure)
///     .start_time("2024-01-03");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    /// 操作種別（完全一致）
    pub operation: Option<Operation>,
    /// 処理状態（完全一致）
    pub status: Option<Status>,
    /// 開始日（YYYY-MM-DD、この日を含む）
    pub start_time: Option<String>,
    /// 終了日（YYYY-MM-DD）
    pub end_time: Option<String>,
}

impl SearchCriteria {
    /// 条件なしの検索条件を作成
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn start_time(mut self, start_time: impl Into<String>) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    pub fn end_time(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = Some(end_time.into());
        self
    }

    /// 日付範囲の条件を含むか
    pub fn has_time_range(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

/// イベントバッチの格納ハンドラー
///
/// バッチ内の各イベントを`{warehouse_id}-{connection_id}`インデックスに振り分け、
/// 必要なインデックスをすべて作成してから、入力順に1件ずつ挿入する。
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domain::Event;
use crate::infrastructure::{EventRepository, InsertError, RepositoryError};

/// イベントハンドラーのエラー型
///
/// 個々の挿入失敗はエラーにせず`ProcessReport`に記録する。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EventHandlerError {
    /// インデックス作成に失敗（挿入前にバッチを中断）
    #[error("インデックスの作成に失敗: {index_name}: {source}")]
    IndexCreation {
        index_name: String,
        #[source]
        source: RepositoryError,
    },
}

/// 1イベントの処理結果
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    /// バッチ内の位置（0始まり）
    pub position: usize,
    /// 振り分け先インデックス
    pub index_name: String,
    /// 挿入結果
    pub result: Result<(), InsertError>,
}

/// バッチ処理の結果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessReport {
    /// 作成を保証したインデックス（初出順）
    pub ensured_indices: Vec<String>,
    /// イベントごとの結果（入力順）
    pub outcomes: Vec<EventOutcome>,
}

impl ProcessReport {
    /// 挿入に成功した件数
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// 挿入に失敗した件数
    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// 失敗したイベントの結果
    pub fn failures(&self) -> impl Iterator<Item = &EventOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// イベントバッチを格納するハンドラー
pub struct EventHandler<R>
where
    R: EventRepository,
{
    /// イベントリポジトリ
    repository: R,
}

impl<R> EventHandler<R>
where
    R: EventRepository,
{
    /// 新しいEventHandlerを作成
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// イベントバッチを処理
    ///
    /// 1. バッチ内のインデックス名を初出順に重複排除
    /// 2. 各インデックスを作成（失敗時は挿入前に中断）
    /// 3. 入力順に1件ずつ挿入（失敗は記録して継続）
    #[instrument(skip(self, events), fields(event_count = events.len()))]
    pub async fn process(&self, events: &[Event]) -> Result<ProcessReport, EventHandlerError> {
        let mut report = ProcessReport::default();
        if events.is_empty() {
            return Ok(report);
        }

        let routed: Vec<String> = events.iter().map(Event::index_name).collect();

        for index_name in &routed {
            if report.ensured_indices.contains(index_name) {
                continue;
            }
            self.repository
                .create_index(index_name)
                .await
                .map_err(|source| {
                    warn!(index_name = %index_name, error = %source, "インデックス作成に失敗");
                    EventHandlerError::IndexCreation {
                        index_name: index_name.clone(),
                        source,
                    }
                })?;
            report.ensured_indices.push(index_name.clone());
        }

        for (position, (event, index_name)) in events.iter().zip(routed).enumerate() {
            let result = self.repository.insert(event, &index_name).await;
            if let Err(e) = &result {
                warn!(
                    position = position,
                    index_name = %index_name,
                    error = %e,
                    "イベント挿入に失敗"
                );
            }
            report.outcomes.push(EventOutcome {
                position,
                index_name,
                result,
            });
        }

        info!(
            index_count = report.ensured_indices.len(),
            success_count = report.success_count(),
            failure_count = report.failure_count(),
            "バッチ処理が完了"
        );

        Ok(report)
    }
}

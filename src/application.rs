// アプリケーション層モジュール
pub mod event_handler;
pub mod search_handler;

// 再エクスポート
pub use event_handler::{EventHandler, EventHandlerError, EventOutcome, ProcessReport};
pub use search_handler::{SearchHandler, SearchHandlerError};

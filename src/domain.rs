// Domain layer modules
pub mod date_bound;
pub mod event;
pub mod event_generator;
pub mod index_name;
pub mod search_criteria;

// Re-exports
pub use date_bound::{parse_date, DateBoundError, DATE_FORMAT};
pub use event::{Event, EventValidationError, Operation, Status, UnknownVariantError};
pub use event_generator::generate_events;
pub use index_name::{build_index, split_index, IndexNameError, SEPARATOR};
pub use search_criteria::SearchCriteria;

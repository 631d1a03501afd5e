//! Seams between the engine and whatever keeps the records.
//!
//! `Database` is the SQLite implementation; tests use in-memory doubles.

use crate::error::Result;
use crate::models::TopicRecord;

pub trait RecordSource {
    /// Every topic owned by `owner`, with cycle history in chronological order.
    fn load_records(&self, owner: &str) -> Result<Vec<TopicRecord>>;
}

pub trait RecordSink {
    /// Persists a new record and returns its storage id.
    fn create_record(&self, owner: &str, record: &TopicRecord) -> Result<i64>;

    /// Overwrites the record's top-level fields and appends its newest
    /// history entry, as one unit.
    fn update_record_with_history_push(&self, record: &TopicRecord) -> Result<()>;

    fn delete_record(&self, id: i64) -> Result<bool>;

    /// Removes the cycle at `index`. Out-of-range indices change nothing.
    fn delete_cycle(&self, id: i64, index: usize) -> Result<bool>;
}

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Integers submitted for testing.
pub type Candidate = i64;

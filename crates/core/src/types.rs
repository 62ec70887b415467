/// Movie primary keys are PostgreSQL BIGINT.
pub type DbId = i64;

/// Release years are stored as PostgreSQL INTEGER.
pub type Year = i32;

//! Row structs for the `movies` table.

pub mod movie;

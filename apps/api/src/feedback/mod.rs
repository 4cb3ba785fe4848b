// Feedback: append-only JSONL record of rated transforms, plus the admin
// review endpoint. Records are never mutated or deleted.

pub mod handlers;
pub mod log;
pub mod types;

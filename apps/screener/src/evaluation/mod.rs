// Batch evaluation: candidates in, merged report rows and per-candidate failures out.

pub mod handlers;
pub mod pipeline;
pub mod report;

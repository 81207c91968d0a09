pub mod covers;
pub mod ingest;

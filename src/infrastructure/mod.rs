pub mod audio;
pub mod emr;
pub mod llm;
pub mod observability;
pub mod storage;

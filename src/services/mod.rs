pub mod document_file;
pub mod document_store;
pub mod rate_limiter;
pub mod sandbox;
pub mod scoped_exec;
pub mod transform;

pub mod health;
pub mod diagnostics;
pub mod document;
pub mod exec;

pub use health::*;
pub use diagnostics::*;
pub use document::*;
pub use exec::*;

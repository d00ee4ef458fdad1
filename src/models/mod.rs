pub mod health;
pub mod diagnostics;
pub mod error;
pub mod exec;
pub mod messages;
pub mod operation;
pub mod user;

pub use health::*;
pub use diagnostics::*;
pub use error::*;
pub use exec::*;
pub use messages::*;
pub use operation::*;
pub use user::*;

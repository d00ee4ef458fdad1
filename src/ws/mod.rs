pub mod collab;
pub mod registry;
pub mod session;

pub mod handler;
pub mod msg_build_handler;
pub mod msg_cursor_handler;
pub mod msg_join_handler;
pub mod msg_operation_handler;
pub mod msg_run_handler;
pub mod msg_save_handler;

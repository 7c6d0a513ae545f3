//! Interactive terminal chat (`buddy chat`).

pub mod commands;
pub mod input;
pub mod loop_runner;

pub use loop_runner::run_chat_loop;

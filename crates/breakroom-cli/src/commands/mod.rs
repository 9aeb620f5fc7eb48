pub mod completions;
pub mod config;
pub mod exception;
pub mod log;
pub mod run;
pub mod simulate;
pub mod tier;

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod runtime;
pub mod source;

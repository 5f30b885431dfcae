pub mod completion;
pub mod config;
pub mod data;
pub mod logging;
pub mod lsp;
pub mod position;
pub mod session;

pub mod backend;
pub mod document;

pub use backend::RobotBackend;

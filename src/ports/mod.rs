//! Port traits decoupling the domain from I/O adapters.

pub mod config_port;
pub mod data_port;
pub mod report_port;

pub use config_port::ConfigPort;
pub use data_port::DataPort;
pub use report_port::ReportPort;

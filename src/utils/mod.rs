pub mod diagnostic_log;
pub mod error;
pub mod logger;
pub mod path_links;
pub mod timer;
pub mod validation;

pub mod config;
pub mod logging;

pub mod attachment;
pub mod checksum;
pub mod dump;
pub mod error;
pub mod observer;
pub mod page;
pub mod session;
pub mod storage;
pub mod url_model;

pub use dump::{run, DumpRequest};
pub use error::{DumpError, SessionError};

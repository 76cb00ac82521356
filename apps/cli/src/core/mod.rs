pub mod error;
pub mod session;

pub use error::CliError;
pub use session::Session;

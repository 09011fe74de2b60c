//! Command implementations.

pub mod extract;
pub mod init;
pub mod schema;

pub use self::extract::execute_extract;
pub use self::init::execute_init;
pub use self::schema::execute_schema;

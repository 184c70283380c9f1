pub mod auth;
pub mod init;
pub mod parse;
pub mod sync;

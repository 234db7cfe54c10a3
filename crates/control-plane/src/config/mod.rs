// Configuration loading
//
// Server settings come from environment variables; auth settings live in
// `crate::auth::config`.

pub mod server;

pub use server::ServerConfig;

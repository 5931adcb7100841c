//! # livepad-server
//!
//! Serves the livepad client and hosts the shared editing session.
//!
//! ```rust,ignore
//! use livepad_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = ServerConfig::from_env()?;
//!     let server = Server::bind(&config).await?;
//!     server.serve(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
mod connection;
pub mod error;
pub mod hub;
mod server;
mod static_files;

pub use config::ServerConfig;
pub use connection::serve_connection;
pub use error::{HttpError, Result, ServerError};
pub use hub::{HubError, SessionHandle, SessionHub, SessionSnapshot};
pub use server::{Server, HEALTH_PATH, SOCKET_PATH};
pub use static_files::StaticFiles;

//! quark_save - Search shared Quark links and save them into your own drive.
//!
//! This library provides functionality to:
//! - Verify a pasted Quark cookie and read the account nickname
//! - Search a resource aggregator for Quark share links
//! - Save a share into the drive root (validity check, then save)
//!
//! # Example
//!
//! ```no_run
//! use quark_save::{App, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::new(&Config::default())?;
//!     app.verify_credential("__pus=...; __kp=...").await?;
//!
//!     let results = app.search("documentary").await.into_results();
//!     for result in &results {
//!         let outcome = app.save_resource(result).await?;
//!         println!("{}: {}", result.display_title(), outcome);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod save;
pub mod search;
pub mod session;
pub mod share_link;
pub mod state;

// Re-exports for convenience
pub use app::App;
pub use config::{Config, Endpoints};
pub use error::{Error, HttpError, Result, VerificationError};
pub use models::SearchResult;
pub use save::{SaveOutcome, SaveState, SaveTransaction};
pub use search::SearchOutcome;
pub use session::Session;
pub use share_link::extract_share_token;
pub use state::{AppState, StateEvent};

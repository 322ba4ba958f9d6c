#![deny(missing_docs)]
//! Async client for the Lichess API.
//!
//! Covers the calls a study/broadcast tool needs: the signed-in account,
//! listing studies and broadcast rounds (streamed as NDJSON), importing PGN,
//! and pushing PGN to a broadcast round. Every request is authenticated with a
//! bearer token from [`lichess_auth`].
//!
//! ```no_run
//! use lichess_auth::AuthToken;
//! use lichess_client::Lichess;
//!
//! # async fn run() -> Result<(), lichess_client::LichessError> {
//! let lichess = Lichess::new(AuthToken::new("lip_xxx"));
//! let me = lichess.account().await?;
//! for study in lichess.studies_by(&me.username).await? {
//!     println!("{} {}", study.id, study.name);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
pub mod session;
mod types;

pub use client::Lichess;
pub use config::{ClientConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use error::LichessError;
pub use session::{Session, resume, sign_in, sign_out};
pub use types::{Account, ImportedGame, Study};

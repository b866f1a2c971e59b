//! # CliniVida booking client
//!
//! Headless core of the patient booking flow: pick a professional, a day on
//! the calendar and a free time slot, then confirm.
//!
//! ## Layout:
//! - [`state`]: wizard, calendar, carousel and availability state machines
//! - [`services`]: REST client, session store, date formatting and logging setup
//! - [`coordinator`]: owns the state and turns user actions into state changes
//! - [`view_model`]: plain snapshot of what the booking screen renders
//!
//! ```no_run
//! use clinivida_frontend::{ApiClient, BookingCoordinator, ClientConfig, SessionStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ClientConfig::load_or_default(None)?;
//! clinivida_frontend::init_logging(&config.logging);
//!
//! let store = SessionStore::new(config.session_path());
//! let client = ApiClient::new(&config)?;
//!
//! // The stored session's token is handed to the client here
//! let mut booking = BookingCoordinator::new(client, &config)?.with_session_store(store)?;
//! booking.load_professionals().await.ok();
//! println!("{:?}", booking.view().step);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod services;
pub mod state;
pub mod view_model;

#[cfg(test)]
mod test_support;

pub use config::ClientConfig;
pub use coordinator::BookingCoordinator;
pub use error::{ApiError, ConfigError, SubmitError, ValidationError};
pub use services::{init_logging, ApiClient, SchedulingApi, Session, SessionStore};
pub use view_model::BookingView;

pub mod api;
pub mod date_utils;
pub mod logging;
pub mod session;

pub use api::{ApiClient, SchedulingApi};
pub use logging::init_logging;
pub use session::{Session, SessionStore};

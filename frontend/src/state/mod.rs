pub mod availability_state;
pub mod calendar_state;
pub mod carousel_state;
pub mod wizard_state;

pub use availability_state::*;
pub use calendar_state::*;
pub use carousel_state::*;
pub use wizard_state::*;

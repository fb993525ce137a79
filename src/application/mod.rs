//! Application layer managing session state and storefront workflows.
//!
//! This module coordinates between the domain layer and presentation layer:
//! the session state machine, the admin route gate, and the interactive
//! application state driven by the terminal UI.

pub mod routing;
pub mod session;
pub mod state;

pub use routing::*;
pub use session::*;
pub use state::*;

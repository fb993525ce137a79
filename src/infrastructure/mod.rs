//! Infrastructure layer providing the storefront's external collaborators.
//!
//! This module contains the stub identity provider, the logging notification
//! service, deal collection sources, configuration and log setup.

pub mod config;
pub mod identity;
pub mod logging;
pub mod notification;
pub mod sources;

pub use config::*;
pub use identity::*;
pub use logging::*;
pub use notification::*;
pub use sources::*;

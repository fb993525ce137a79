//! DealSpot - Terminal Deal Storefront Library
//!
//! A terminal storefront for discounted local deals with category and text
//! filtering, shopper and administrator sessions, and an admin dashboard for
//! managing the catalog.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;

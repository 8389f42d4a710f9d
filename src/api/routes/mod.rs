//! API Routes
//!
//! Route handlers organized by functionality.

pub mod cloudevents;
pub mod health;
pub mod negotiate;

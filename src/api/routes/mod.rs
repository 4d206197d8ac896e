//! API Routes
//!
//! Route handlers organized by functionality.

pub mod ask;
pub mod health;
pub mod roads;

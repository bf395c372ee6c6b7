//! # API Route Modules
//!
//! | Module | Prefix |
//! |--------|--------|
//! | [`certificates`] | `/v1/certificates` |
//! | [`courses`] | `/v1/courses` |
//! | [`catalog`] | `/v1/catalog` |

pub mod catalog;
pub mod certificates;
pub mod courses;

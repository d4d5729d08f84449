//! Module containing general helper functions and structures used throughout
//! the crate.

pub(crate) mod linear_transform;

//! Identity types shared across the vigil node hierarchy.

pub mod node;

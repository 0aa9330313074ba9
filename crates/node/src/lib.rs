//! The active core of a vigil monitoring node: hierarchy relationship
//! resolution and the fixed-cadence sync loop.
//!
//! The expensive reconciliation and the data-forward routines live behind
//! the collaborator traits in [`sync`]; this crate decides *when* they run
//! and answers the ancestor/descendant questions they depend on.

pub mod hierarchy;
pub mod sync;

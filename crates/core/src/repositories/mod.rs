//! Repository modules.
//!
//! One repository per entity. Each exclusively owns its table and offers create/list
//! only; records are never updated or deleted.

pub mod consultations;
mod helpers;
pub mod patients;

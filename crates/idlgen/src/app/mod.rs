//! Application layer: expansion, service scanning, root selection, and dispatch.

pub mod dispatch;
pub mod expand;
pub mod scan;
pub mod selection;

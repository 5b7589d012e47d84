//! Types exchanged between the transfer engine and whatever renders it.
//!
//! Everything here serializes as camelCase JSON so a web or desktop front end
//! can consume snapshots directly.

pub mod types;

pub use types::{FileDescriptor, TransferSnapshot, TransferStatus};

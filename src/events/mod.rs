//! Event distribution and event payloads.
//!
//! Subsystems never call each other directly to announce changes; they
//! publish on an [`distributor::EventDistributor`] and whoever cares
//! subscribes.
//!
//! Submodules:
//! - [`distributor`] – the publish/subscribe primitive
//! - [`engine`] – logic tick and frame notifications
//! - [`input`] – normalized pointer input and pointer hook payloads
//! - [`sprite`] – registry-level sprite events (created, moved, intersecting, ...)

pub mod distributor;
pub mod engine;
pub mod input;
pub mod sprite;

//! Aspect registry: entity allocation, type-indexed aspect storage and the
//! attach/detach notification protocol.
//!
//! Entities are bare ids. Data is attached as typed aspects, one store per
//! aspect type, and every registered [`Module`] hears about each attach
//! ("reveille") and detach ("taps").
//!
//! # Invariants
//! - An entity holds at most one aspect of each type.
//! - Ids are allocated monotonically and never reissued.
//! - Notifications fire synchronously, in module registration order.
//! - Modules only ever see the stores through a shared borrow, so they cannot
//!   attach or detach from inside a callback.

mod aspect;
mod module;
mod registry;
mod store;

pub use aspect::{Aspect, AspectRef};
pub use module::{Module, ModuleDispatcher};
pub use registry::{Registry, RegistryError};
pub use store::{AspectStore, Aspects, StoreSummary};
pub use vesper_common::EntityId;

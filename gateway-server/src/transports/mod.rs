//! Transport bindings.
//!
//! Three independent adapters over the same dispatcher and auth manager,
//! each owning its wire framing.

pub mod http;
pub mod push;
pub mod stream;

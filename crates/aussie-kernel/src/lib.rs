#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]

//! Aussie Kernel - the capability kernel of the Aussie web OS core.
//!
//! The kernel owns the one active [`CapabilityPolicy`] and turns it into a
//! [`KernelFacade`]: a guarded view over the file store, window registry,
//! scheduler and shell hook. Every façade method checks the policy before
//! delegating, so a denied call never partially applies.
//!
//! Changing the policy rebuilds the façade and swaps it in atomically.
//! Callers holding an older façade keep the old permissions; callers that
//! need current enforcement should fetch [`Kernel::facade`] per call.
//!
//! The [`Bridge`] maps the cross-context request/response protocol onto
//! façade calls, one action per method.

pub mod prelude;

mod bridge;
mod error;
mod facade;
mod kernel;
mod policy;

pub use bridge::{
    BRIDGE_SOURCE, Bridge, BridgeAction, BridgeRequest, BridgeResponse, KERNEL_SOURCE,
};
pub use error::{KernelError, KernelResult};
pub use facade::{KernelFacade, KernelServices};
pub use kernel::Kernel;
pub use policy::{Access, CapabilityPolicy, FsAccess, PolicyParseError, PolicyPatch};

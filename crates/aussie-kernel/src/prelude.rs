//! Prelude module - commonly used types for convenient import.
//!
//! Use `use aussie_kernel::prelude::*;` to import all essential types.

pub use crate::{Bridge, BridgeResponse, Kernel, KernelFacade, KernelServices};

pub use crate::{KernelError, KernelResult};

pub use crate::{Access, CapabilityPolicy, FsAccess, PolicyPatch};

use std::sync::{Arc, PoisonError, RwLock};

use aussie_events::{EventBus, topics};
use tracing::info;

use crate::facade::{KernelFacade, KernelServices};
use crate::policy::{CapabilityPolicy, PolicyPatch};

/// The capability kernel.
///
/// Exactly one façade is current at a time. Permission changes build a
/// replacement and swap it in under a write lock, so every caller sees
/// either the old or the new policy, never a mix.
pub struct Kernel {
    services: Arc<KernelServices>,
    current: RwLock<Arc<KernelFacade>>,
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("policy", &self.permissions())
            .finish_non_exhaustive()
    }
}

impl Kernel {
    /// Boot a kernel over `services` with an initial policy.
    #[must_use]
    pub fn new(services: KernelServices, policy: CapabilityPolicy) -> Self {
        let services = Arc::new(services);
        info!(?policy, "Kernel booted");
        Self {
            current: RwLock::new(Arc::new(KernelFacade::new(policy, Arc::clone(&services)))),
            services,
        }
    }

    /// The current façade.
    ///
    /// The returned handle keeps the policy it was built with; fetch a new
    /// one after a permission change to see it.
    #[must_use]
    pub fn facade(&self) -> Arc<KernelFacade> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// The active policy.
    #[must_use]
    pub fn permissions(&self) -> CapabilityPolicy {
        *self.facade().policy()
    }

    /// Merge `patch` into the active policy, swap in a rebuilt façade and
    /// emit `kernel-permissions-changed`. Returns the new policy.
    pub fn set_permissions(&self, patch: &PolicyPatch) -> CapabilityPolicy {
        let policy = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            let policy = current.policy().merged(patch);
            *current = Arc::new(KernelFacade::new(policy, Arc::clone(&self.services)));
            policy
        };

        info!(?policy, "Kernel permissions changed");
        self.services.bus.emit_or_log(
            topics::KERNEL_PERMISSIONS_CHANGED,
            serde_json::to_value(policy).unwrap_or_default(),
        );
        policy
    }

    /// The event bus every service reports on.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.services.bus
    }
}

#[cfg(test)]
mod tests {
    use aussie_core::ErrorKind;
    use aussie_test::TestCore;

    use super::*;
    use crate::facade::tests::services_from;
    use crate::policy::{Access, FsAccess};

    async fn kernel() -> (Kernel, TestCore) {
        let core = TestCore::new().await;
        let kernel = Kernel::new(services_from(&core), CapabilityPolicy::default());
        (kernel, core)
    }

    #[tokio::test]
    async fn test_set_permissions_swaps_facade() {
        let (kernel, _core) = kernel().await;
        let before = kernel.facade();

        let policy = kernel.set_permissions(&PolicyPatch {
            fs: Some(FsAccess::Read),
            ..PolicyPatch::default()
        });
        assert_eq!(policy.fs, FsAccess::Read);
        assert_eq!(policy.shell, Access::Allow);

        // A façade fetched earlier keeps the old policy.
        assert!(before.write_file("/old.txt", "x", false).is_ok());
        let err = kernel.facade().write_file("/new.txt", "x", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_set_permissions_emits_policy() {
        let (kernel, core) = kernel().await;
        kernel.set_permissions(&PolicyPatch {
            shell: Some(Access::Deny),
            ..PolicyPatch::default()
        });

        let payloads = core.events.payloads(topics::KERNEL_PERMISSIONS_CHANGED);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0]["shell"], "deny");
        assert_eq!(payloads[0]["fs"], "readwrite");
    }

    #[tokio::test]
    async fn test_listener_can_read_new_policy() {
        let (kernel, core) = kernel().await;
        let kernel = Arc::new(kernel);
        let seen = Arc::new(std::sync::Mutex::new(None));

        let k = Arc::clone(&kernel);
        let s = Arc::clone(&seen);
        let _id = core.bus.on(topics::KERNEL_PERMISSIONS_CHANGED, move |_| {
            *s.lock().unwrap() = Some(k.permissions());
            Ok(())
        });

        kernel.set_permissions(&PolicyPatch {
            notifications: Some(false),
            ..PolicyPatch::default()
        });
        let seen = (*seen.lock().unwrap()).unwrap();
        assert!(!seen.notifications);
    }

    #[tokio::test]
    async fn test_empty_patch_keeps_policy() {
        let (kernel, _core) = kernel().await;
        let policy = kernel.set_permissions(&PolicyPatch::default());
        assert_eq!(policy, CapabilityPolicy::default());
    }
}

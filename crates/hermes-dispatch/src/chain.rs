//! Hook composition.
//!
//! Merges global hooks with route-scoped hooks phase by phase: for every
//! phase, global hooks run first in declaration order, then route hooks in
//! declaration order.

use hermes_core::{HookError, HookRef, Hooks, Phase, Reply, Request};

/// Phase-ordered hooks for one bound endpoint.
#[derive(Debug, Clone, Default)]
pub struct HookChain {
    hooks: Hooks,
}

impl HookChain {
    /// Composes global and route hooks.
    #[must_use]
    pub fn compose(global: &Hooks, route: &Hooks) -> Self {
        let mut hooks = Hooks::new();
        for phase in Phase::all() {
            for hook in global.get(phase).iter().chain(route.get(phase)) {
                hooks.push(phase, hook.clone());
            }
        }
        Self { hooks }
    }

    /// Returns the hooks of `phase` in execution order.
    #[must_use]
    pub fn get(&self, phase: Phase) -> &[HookRef] {
        self.hooks.get(phase)
    }

    /// Returns the total number of hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns true if no phase has hooks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook of `phase` in order.
    ///
    /// Returns `Ok(true)` when a hook in a short-circuiting phase sent the
    /// reply; the remaining hooks of the phase are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure; later hooks do not run.
    pub async fn run(
        &self,
        phase: Phase,
        request: &mut Request,
        reply: &mut Reply,
    ) -> Result<bool, HookError> {
        for hook in self.hooks.get(phase) {
            tracing::trace!(phase = phase.name(), hook = hook.name(), "running hook");
            hook.run(request, reply).await?;

            if phase.can_short_circuit() && reply.is_sent() {
                tracing::debug!(
                    phase = phase.name(),
                    hook = hook.name(),
                    status = reply.status_code().as_u16(),
                    "hook answered the request"
                );
                return Ok(true);
            }
        }
        Ok(false)
    }
}

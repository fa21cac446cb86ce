//! Lifecycle hooks.
//!
//! Hooks come in three flavours that all normalize into one [`Hook`] trait
//! object at registration time:
//!
//! - [`hook_fn`]: a synchronous closure over `(&mut Request, &mut Reply)`
//! - [`hook_callback`]: a closure that signals completion through [`Done`]
//! - [`hook_async`]: an async closure that takes and returns the request and reply
//!
//! A hook short-circuits the pipeline by sending the reply. Only the phases
//! before the handler honour that; see [`Phase::can_short_circuit`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::handler::BoxFuture;
use crate::reply::Reply;
use crate::request::Request;

/// Lifecycle phases in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Phase {
    /// Before anything else, with only the raw request available.
    OnRequest = 0,
    /// Before the raw inputs are converted to JSON.
    PreParsing = 1,
    /// After conversion, before schema validation.
    PreValidation = 2,
    /// After validation, before the handler.
    PreHandler = 3,
    /// After the reply body is committed, before it leaves the dispatcher.
    OnSend = 4,
    /// After the reply is final.
    OnResponse = 5,
}

impl Phase {
    /// Number of phases.
    pub const COUNT: usize = 6;

    /// Returns the phase name used in logs and metrics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OnRequest => "onRequest",
            Self::PreParsing => "preParsing",
            Self::PreValidation => "preValidation",
            Self::PreHandler => "preHandler",
            Self::OnSend => "onSend",
            Self::OnResponse => "onResponse",
        }
    }

    /// Returns all phases in execution order.
    #[must_use]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::OnRequest,
            Self::PreParsing,
            Self::PreValidation,
            Self::PreHandler,
            Self::OnSend,
            Self::OnResponse,
        ]
    }

    /// Returns true if sending the reply in this phase ends the request.
    #[must_use]
    pub const fn can_short_circuit(self) -> bool {
        (self as u8) <= (Self::PreHandler as u8)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by hooks.
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook reported a failure.
    #[error("hook '{hook}' failed: {message}")]
    Failed {
        /// Hook name.
        hook: String,
        /// Failure description.
        message: String,
    },

    /// A callback hook dropped its [`Done`] signal without completing.
    #[error("hook '{hook}' never signalled completion")]
    Incomplete {
        /// Hook name.
        hook: String,
    },

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HookError {
    /// Creates a [`HookError::Failed`].
    #[must_use]
    pub fn failed(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// A lifecycle hook.
pub trait Hook: Send + Sync {
    /// Returns the hook name used in logs.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Runs the hook against the in-flight request and reply.
    fn run<'a>(
        &'a self,
        request: &'a mut Request,
        reply: &'a mut Reply,
    ) -> BoxFuture<'a, Result<(), HookError>>;
}

/// Shared handle to a hook.
pub type HookRef = Arc<dyn Hook>;

// ============================================================================
// Synchronous hooks
// ============================================================================

struct SyncHook<F> {
    name: String,
    f: F,
}

impl<F> Hook for SyncHook<F>
where
    F: Fn(&mut Request, &mut Reply) -> Result<(), HookError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run<'a>(
        &'a self,
        request: &'a mut Request,
        reply: &'a mut Reply,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let result = (self.f)(request, reply);
        Box::pin(std::future::ready(result))
    }
}

/// Creates a hook from a synchronous closure.
///
/// # Example
///
/// ```
/// use hermes_core::hooks::hook_fn;
/// use http::{HeaderName, HeaderValue};
///
/// let hook = hook_fn("powered-by", |_request, reply| {
///     reply.header(HeaderName::from_static("x-powered-by"), HeaderValue::from_static("hermes"));
///     Ok(())
/// });
/// assert_eq!(hook.name(), "powered-by");
/// ```
pub fn hook_fn<F>(name: impl Into<String>, f: F) -> HookRef
where
    F: Fn(&mut Request, &mut Reply) -> Result<(), HookError> + Send + Sync + 'static,
{
    Arc::new(SyncHook {
        name: name.into(),
        f,
    })
}

// ============================================================================
// Callback hooks
// ============================================================================

/// Completion signal handed to callback hooks.
///
/// The hook must call [`Done::complete`] or [`Done::fail`] exactly once. The
/// signal is `'static` so it can be moved into a spawned task.
#[derive(Debug)]
pub struct Done {
    tx: oneshot::Sender<Result<(), HookError>>,
}

impl Done {
    /// Signals success.
    pub fn complete(self) {
        let _ = self.tx.send(Ok(()));
    }

    /// Signals failure.
    pub fn fail(self, error: HookError) {
        let _ = self.tx.send(Err(error));
    }
}

struct CallbackHook<F> {
    name: String,
    f: F,
}

impl<F> Hook for CallbackHook<F>
where
    F: Fn(&mut Request, &mut Reply, Done) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run<'a>(
        &'a self,
        request: &'a mut Request,
        reply: &'a mut Reply,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let (tx, rx) = oneshot::channel();
        (self.f)(request, reply, Done { tx });
        Box::pin(async move {
            rx.await.unwrap_or_else(|_| {
                Err(HookError::Incomplete {
                    hook: self.name.clone(),
                })
            })
        })
    }
}

/// Creates a hook that signals completion through a [`Done`] handle.
pub fn hook_callback<F>(name: impl Into<String>, f: F) -> HookRef
where
    F: Fn(&mut Request, &mut Reply, Done) + Send + Sync + 'static,
{
    Arc::new(CallbackHook {
        name: name.into(),
        f,
    })
}

// ============================================================================
// Async hooks
// ============================================================================

struct AsyncHook<F> {
    name: String,
    f: F,
}

impl<F, Fut> Hook for AsyncHook<F>
where
    F: Fn(Request, Reply) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(Request, Reply), HookError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run<'a>(
        &'a self,
        request: &'a mut Request,
        reply: &'a mut Reply,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let fut = (self.f)(request.clone(), reply.clone());
        Box::pin(async move {
            let (next_request, next_reply) = fut.await?;
            *request = next_request;
            *reply = next_reply;
            Ok(())
        })
    }
}

/// Creates a hook from an async closure.
///
/// The closure receives owned copies of the request and reply and returns
/// them; the returned values replace the originals only on success.
pub fn hook_async<F, Fut>(name: impl Into<String>, f: F) -> HookRef
where
    F: Fn(Request, Reply) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(Request, Reply), HookError>> + Send + 'static,
{
    Arc::new(AsyncHook {
        name: name.into(),
        f,
    })
}

// ============================================================================
// Hook sets
// ============================================================================

/// Hooks grouped by phase, each list in declaration order.
#[derive(Clone, Default)]
pub struct Hooks {
    phases: [Vec<HookRef>; Phase::COUNT],
}

impl Hooks {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hook to `phase`.
    #[must_use]
    pub fn add(mut self, phase: Phase, hook: HookRef) -> Self {
        self.push(phase, hook);
        self
    }

    /// Adds several hooks to `phase`, keeping their order.
    #[must_use]
    pub fn add_all(mut self, phase: Phase, hooks: impl IntoIterator<Item = HookRef>) -> Self {
        self.phases[phase.index()].extend(hooks);
        self
    }

    /// Appends a hook to `phase`.
    pub fn push(&mut self, phase: Phase, hook: HookRef) {
        self.phases[phase.index()].push(hook);
    }

    /// Returns the hooks of `phase`.
    #[must_use]
    pub fn get(&self, phase: Phase) -> &[HookRef] {
        &self.phases[phase.index()]
    }

    /// Returns the total number of hooks across all phases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.iter().map(Vec::len).sum()
    }

    /// Returns true if no phase has hooks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.iter().all(Vec::is_empty)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for phase in Phase::all() {
            let hooks = self.get(phase);
            if !hooks.is_empty() {
                let names: Vec<&str> = hooks.iter().map(|h| h.name()).collect();
                map.entry(&phase.name(), &names);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_phase_order_and_names() {
        let names: Vec<_> = Phase::all().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "onRequest",
                "preParsing",
                "preValidation",
                "preHandler",
                "onSend",
                "onResponse"
            ]
        );
        assert!(Phase::PreValidation < Phase::PreHandler);
    }

    #[test]
    fn test_short_circuit_phases() {
        assert!(Phase::OnRequest.can_short_circuit());
        assert!(Phase::PreHandler.can_short_circuit());
        assert!(!Phase::OnSend.can_short_circuit());
        assert!(!Phase::OnResponse.can_short_circuit());
    }

    #[tokio::test]
    async fn test_sync_hook_mutates_request() {
        let hook = hook_fn("tag", |request, _reply| {
            request.route = "/tagged".to_string();
            Ok(())
        });

        let mut request = Request::default();
        let mut reply = Reply::new();
        hook.run(&mut request, &mut reply).await.unwrap();
        assert_eq!(request.route, "/tagged");
        assert_eq!(hook.name(), "tag");
    }

    #[tokio::test]
    async fn test_sync_hook_can_send_reply() {
        let hook = hook_fn("deny", |_request, reply| {
            reply.set_status(StatusCode::UNAUTHORIZED).send_text("denied");
            Ok(())
        });

        let mut request = Request::default();
        let mut reply = Reply::new();
        hook.run(&mut request, &mut reply).await.unwrap();
        assert!(reply.is_sent());
        assert_eq!(reply.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_callback_hook_completes_from_task() {
        let hook = hook_callback("deferred", |_request, _reply, done| {
            tokio::spawn(async move { done.complete() });
        });

        let mut request = Request::default();
        let mut reply = Reply::new();
        assert!(hook.run(&mut request, &mut reply).await.is_ok());
    }

    #[test]
    fn test_callback_hook_pending_until_signalled() {
        let slot: Arc<std::sync::Mutex<Option<Done>>> = Arc::default();
        let stash = Arc::clone(&slot);
        let hook = hook_callback("parked", move |_request, _reply, done| {
            *stash.lock().unwrap() = Some(done);
        });

        let mut request = Request::default();
        let mut reply = Reply::new();
        let mut run = tokio_test::task::spawn(hook.run(&mut request, &mut reply));
        tokio_test::assert_pending!(run.poll());

        slot.lock().unwrap().take().unwrap().complete();
        assert!(run.is_woken());
        tokio_test::assert_ready_ok!(run.poll());
    }

    #[tokio::test]
    async fn test_callback_hook_failure() {
        let hook = hook_callback("rejecting", |_request, _reply, done| {
            done.fail(HookError::failed("rejecting", "no"));
        });

        let mut request = Request::default();
        let mut reply = Reply::new();
        let error = hook.run(&mut request, &mut reply).await.unwrap_err();
        assert!(matches!(error, HookError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_callback_hook_dropped_signal() {
        let hook = hook_callback("forgetful", |_request, _reply, done| drop(done));

        let mut request = Request::default();
        let mut reply = Reply::new();
        let error = hook.run(&mut request, &mut reply).await.unwrap_err();
        assert_eq!(error.to_string(), "hook 'forgetful' never signalled completion");
    }

    #[tokio::test]
    async fn test_async_hook_writes_back_on_success() {
        let hook = hook_async("async", |mut request: Request, reply: Reply| async move {
            tokio::task::yield_now().await;
            request.route = "/async".to_string();
            Ok::<_, HookError>((request, reply))
        });

        let mut request = Request::default();
        let mut reply = Reply::new();
        hook.run(&mut request, &mut reply).await.unwrap();
        assert_eq!(request.route, "/async");
    }

    #[tokio::test]
    async fn test_async_hook_failure_leaves_state() {
        let hook = hook_async("async", |mut request: Request, _reply: Reply| async move {
            request.route = "/changed".to_string();
            Err::<(Request, Reply), _>(HookError::failed("async", "boom"))
        });

        let mut request = Request::default();
        let mut reply = Reply::new();
        assert!(hook.run(&mut request, &mut reply).await.is_err());
        assert!(request.route.is_empty());
    }

    #[test]
    fn test_hooks_keep_order_per_phase() {
        let noop = |name: &'static str| hook_fn(name, |_, _| Ok(()));
        let hooks = Hooks::new()
            .add(Phase::PreHandler, noop("first"))
            .add(Phase::PreValidation, noop("validate"))
            .add_all(Phase::PreHandler, [noop("second"), noop("third")]);

        let names: Vec<_> = hooks.get(Phase::PreHandler).iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(hooks.len(), 4);
        assert!(hooks.get(Phase::OnSend).is_empty());
        assert!(format!("{hooks:?}").contains("preValidation"));
    }
}

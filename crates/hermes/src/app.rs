//! One-stop assembly of configuration, dispatcher and server.

use std::fmt;
use std::sync::Arc;

use hermes_config::HermesConfig;
use hermes_core::{ContractNode, DispatchOptions, HandlerNode};
use hermes_dispatch::Dispatcher;
use hermes_server::{Server, ServerConfig, ShutdownSignal};

use crate::error::Result;

type Customize = Box<dyn FnOnce(DispatchOptions) -> DispatchOptions + Send>;

/// An application: a contract, its handlers and the configuration to run
/// them with.
///
/// Options that can be expressed in configuration come from
/// [`HermesConfig::dispatch`]. Code-only options such as hooks and custom
/// error handlers are added with [`App::options`], which sees the
/// configured options first.
///
/// ```rust,ignore
/// let app = App::new(contract, handlers)
///     .config(ConfigLoader::new().with_defaults().with_env_prefix("BLOG").load()?)
///     .options(|options| options.hooks(global_hooks()));
/// app.run().await?;
/// ```
pub struct App {
    contract: ContractNode,
    handlers: HandlerNode,
    config: HermesConfig,
    version: String,
    customize: Option<Customize>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("service", &self.config.service_name)
            .field("version", &self.version)
            .field("customized", &self.customize.is_some())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Creates an application with default configuration.
    #[must_use]
    pub fn new(contract: ContractNode, handlers: HandlerNode) -> Self {
        Self {
            contract,
            handlers,
            config: HermesConfig::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            customize: None,
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn config(mut self, config: HermesConfig) -> Self {
        self.config = config;
        self
    }

    /// Version reported by the health endpoint.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Adjusts the dispatch options derived from configuration.
    #[must_use]
    pub fn options<F>(mut self, customize: F) -> Self
    where
        F: FnOnce(DispatchOptions) -> DispatchOptions + Send + 'static,
    {
        self.customize = Some(Box::new(customize));
        self
    }

    /// The configuration in effect.
    #[must_use]
    pub fn configuration(&self) -> &HermesConfig {
        &self.config
    }

    /// Binds the trees into a dispatcher without starting anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or binding fails.
    pub fn dispatcher(self) -> Result<Dispatcher> {
        self.into_parts().map(|(dispatcher, _, _)| dispatcher)
    }

    /// Binds the trees and wraps the dispatcher in a server.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or binding fails.
    pub fn server(self) -> Result<Server> {
        let (dispatcher, config, version) = self.into_parts()?;
        let server = Server::new(ServerConfig::from(&config.server), Arc::new(dispatcher))
            .with_service(config.service_name, version);
        Ok(server)
    }

    /// Installs telemetry, then serves until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage of start-up fails or the server stops
    /// with an error.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Installs telemetry, then serves until `shutdown` is triggered.
    ///
    /// # Errors
    ///
    /// See [`App::run`].
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<()> {
        hermes_telemetry::init_telemetry(&self.config.telemetry())?;
        let server = self.server()?;
        tracing::info!(addr = %server.config().http_addr(), "starting");
        server.run_with_shutdown(shutdown).await?;
        Ok(())
    }

    fn into_parts(self) -> Result<(Dispatcher, HermesConfig, String)> {
        self.config.validate()?;

        let mut options = self.config.dispatch.to_options();
        if let Some(customize) = self.customize {
            options = customize(options);
        }

        let dispatcher = Dispatcher::new(self.contract, self.handlers, options)?;
        Ok((dispatcher, self.config, self.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use hermes_config::DispatchSection;
    use hermes_core::{handler, Endpoint, Group, HandlerResponse, HandlerResult, Request};

    async fn noop(_request: Request) -> HandlerResult {
        Ok(HandlerResponse::empty(http::StatusCode::OK))
    }

    fn trees() -> (ContractNode, HandlerNode) {
        let contract: ContractNode = Group::new()
            .prefix("/v1")
            .leaf("ping", Endpoint::get("/ping").build())
            .into();
        let handlers: HandlerNode = Group::new().leaf("ping", handler(noop)).into();
        (contract, handlers)
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    #[test]
    fn test_dispatcher_uses_configured_options() {
        let (contract, handlers) = trees();
        let config = HermesConfig::builder()
            .dispatch(DispatchSection {
                response_validation: true,
                json_query: true,
                ..DispatchSection::default()
            })
            .build();

        let dispatcher = App::new(contract, handlers).config(config).dispatcher().unwrap();

        assert!(dispatcher.options().response_validation);
        assert!(dispatcher.options().json_query);
        assert_eq!(dispatcher.routes().len(), 1);
    }

    #[test]
    fn test_customize_sees_configured_options() {
        let (contract, handlers) = trees();
        let config = HermesConfig::builder()
            .dispatch(DispatchSection {
                json_query: true,
                ..DispatchSection::default()
            })
            .build();

        let dispatcher = App::new(contract, handlers)
            .config(config)
            .options(|options| {
                assert!(options.json_query);
                options.response_validation(true)
            })
            .dispatcher()
            .unwrap();

        assert!(dispatcher.options().response_validation);
        assert!(dispatcher.options().json_query);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (contract, handlers) = trees();
        let mut config = HermesConfig::default();
        config.server.http_addr = "not an address".to_string();

        let error = App::new(contract, handlers).config(config).server().unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn test_binding_error_surfaces() {
        let (contract, _) = trees();
        let handlers: HandlerNode = Group::new().into();

        let error = App::new(contract, handlers).dispatcher().unwrap_err();
        assert!(matches!(error, Error::Binding(_)));
        assert!(error.to_string().contains("ping"));
    }

    #[test]
    fn test_server_carries_service_name() {
        let (contract, handlers) = trees();
        let config = HermesConfig::builder().service_name("blog").build();

        let server = App::new(contract, handlers)
            .config(config)
            .version("2.0.0")
            .server()
            .unwrap();
        assert_eq!(server.dispatcher().routes().len(), 1);
    }
}

//! Contract definitions.
//!
//! An [`Endpoint`] declares one operation: method, path template, optional
//! schemas for each input location, and the response expected for each status
//! code. Endpoints are arranged into a [`ContractNode`] tree whose groups may
//! carry path prefixes.
//!
//! # Example
//!
//! ```
//! use hermes_core::contract::{ContractNode, Endpoint, ResponseSpec};
//! use hermes_core::shape::Shape;
//! use hermes_core::tree::Group;
//! use http::StatusCode;
//!
//! let get_post = Endpoint::get("/:postId")
//!     .path_params(Shape::object([("postId", Shape::string())]))
//!     .response(StatusCode::OK, ResponseSpec::new(Shape::object([("id", Shape::string())])))
//!     .summary("Fetch a single post")
//!     .build();
//!
//! let contract: ContractNode = Group::new()
//!     .prefix("/v1")
//!     .group("posts", Group::new().prefix("/posts").leaf("getPost", get_post))
//!     .into();
//!
//! assert_eq!(contract.leaf_count(), 1);
//! ```

use std::sync::Arc;

use http::{Method, StatusCode};
use indexmap::IndexMap;

use crate::schema::{Schema, SchemaRef};
use crate::tree::Tree;

/// A contract tree: endpoints grouped under optional prefixes.
pub type ContractNode = Tree<Endpoint>;

/// Expected response for one status code.
#[derive(Debug, Clone)]
pub struct ResponseSpec {
    schema: Option<SchemaRef>,
    content_type: Option<String>,
    empty: bool,
}

impl ResponseSpec {
    /// A structured (JSON) response validated against `schema`.
    #[must_use]
    pub fn new(schema: impl Schema + 'static) -> Self {
        Self::from_ref(Arc::new(schema))
    }

    /// A structured response using an already shared schema.
    #[must_use]
    pub fn from_ref(schema: SchemaRef) -> Self {
        Self {
            schema: Some(schema),
            content_type: None,
            empty: false,
        }
    }

    /// A response emitted verbatim with an explicit content type.
    #[must_use]
    pub fn with_content_type(schema: impl Schema + 'static, content_type: impl Into<String>) -> Self {
        Self {
            schema: Some(Arc::new(schema)),
            content_type: Some(content_type.into()),
            empty: false,
        }
    }

    /// A response that carries no body, such as `204 No Content`.
    #[must_use]
    pub fn no_body() -> Self {
        Self {
            schema: None,
            content_type: None,
            empty: true,
        }
    }

    /// Returns the body schema, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&SchemaRef> {
        self.schema.as_ref()
    }

    /// Returns the explicit content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns true when the body uses the default structured encoding.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        self.content_type.is_none() && !self.empty
    }

    /// Returns true when the response has no body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.empty
    }
}

/// One declared operation.
#[derive(Debug, Clone)]
pub struct Endpoint {
    method: Method,
    path: String,
    path_params: Option<SchemaRef>,
    query: Option<SchemaRef>,
    headers: Option<SchemaRef>,
    body: Option<SchemaRef>,
    responses: IndexMap<StatusCode, ResponseSpec>,
    summary: Option<String>,
    description: Option<String>,
    deprecated: bool,
}

impl Endpoint {
    /// Starts building an endpoint.
    #[must_use]
    pub fn builder(method: Method, path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(method, path)
    }

    /// Starts building a GET endpoint.
    #[must_use]
    pub fn get(path: impl Into<String>) -> EndpointBuilder {
        Self::builder(Method::GET, path)
    }

    /// Starts building a POST endpoint.
    #[must_use]
    pub fn post(path: impl Into<String>) -> EndpointBuilder {
        Self::builder(Method::POST, path)
    }

    /// Starts building a PUT endpoint.
    #[must_use]
    pub fn put(path: impl Into<String>) -> EndpointBuilder {
        Self::builder(Method::PUT, path)
    }

    /// Starts building a PATCH endpoint.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> EndpointBuilder {
        Self::builder(Method::PATCH, path)
    }

    /// Starts building a DELETE endpoint.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> EndpointBuilder {
        Self::builder(Method::DELETE, path)
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template relative to enclosing groups.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the path parameter schema.
    #[must_use]
    pub fn path_params_schema(&self) -> Option<&SchemaRef> {
        self.path_params.as_ref()
    }

    /// Returns the query schema.
    #[must_use]
    pub fn query_schema(&self) -> Option<&SchemaRef> {
        self.query.as_ref()
    }

    /// Returns the header schema.
    #[must_use]
    pub fn headers_schema(&self) -> Option<&SchemaRef> {
        self.headers.as_ref()
    }

    /// Returns the body schema.
    #[must_use]
    pub fn body_schema(&self) -> Option<&SchemaRef> {
        self.body.as_ref()
    }

    /// Returns the response declared for `status`.
    #[must_use]
    pub fn response_for(&self, status: StatusCode) -> Option<&ResponseSpec> {
        self.responses.get(&status)
    }

    /// Iterates over declared responses in declaration order.
    pub fn responses(&self) -> impl Iterator<Item = (StatusCode, &ResponseSpec)> {
        self.responses.iter().map(|(status, spec)| (*status, spec))
    }

    /// Returns the short summary.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns the long description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns true if the endpoint is marked deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }
}

/// Builder for [`Endpoint`].
#[derive(Debug)]
pub struct EndpointBuilder {
    endpoint: Endpoint,
}

impl EndpointBuilder {
    /// Creates a builder for `method` and `path`.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint {
                method,
                path: path.into(),
                path_params: None,
                query: None,
                headers: None,
                body: None,
                responses: IndexMap::new(),
                summary: None,
                description: None,
                deprecated: false,
            },
        }
    }

    /// Sets the path parameter schema.
    #[must_use]
    pub fn path_params(mut self, schema: impl Schema + 'static) -> Self {
        self.endpoint.path_params = Some(Arc::new(schema));
        self
    }

    /// Sets the query schema.
    #[must_use]
    pub fn query(mut self, schema: impl Schema + 'static) -> Self {
        self.endpoint.query = Some(Arc::new(schema));
        self
    }

    /// Sets the header schema. Header names are matched in lower case.
    #[must_use]
    pub fn headers(mut self, schema: impl Schema + 'static) -> Self {
        self.endpoint.headers = Some(Arc::new(schema));
        self
    }

    /// Sets the body schema.
    #[must_use]
    pub fn body(mut self, schema: impl Schema + 'static) -> Self {
        self.endpoint.body = Some(Arc::new(schema));
        self
    }

    /// Sets the body schema from a shared handle.
    #[must_use]
    pub fn body_ref(mut self, schema: SchemaRef) -> Self {
        self.endpoint.body = Some(schema);
        self
    }

    /// Declares the response for `status`.
    #[must_use]
    pub fn response(mut self, status: StatusCode, spec: ResponseSpec) -> Self {
        self.endpoint.responses.insert(status, spec);
        self
    }

    /// Sets the summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.endpoint.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.endpoint.description = Some(description.into());
        self
    }

    /// Marks the endpoint deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.endpoint.deprecated = true;
        self
    }

    /// Finishes the endpoint.
    #[must_use]
    pub fn build(self) -> Endpoint {
        self.endpoint
    }
}

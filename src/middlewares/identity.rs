use crate::error::AppError;
use crate::services::GUEST_IDENTITY;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

pub const IDENTITY_HEADER: &str = "x-user-email";
const MAX_IDENTITY_LEN: usize = 320;

/// Client-supplied opaque identity. Unverified: anyone can send any value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity(pub String);

impl UserIdentity {
    pub fn guest() -> Self {
        UserIdentity(GUEST_IDENTITY.to_string())
    }

    pub fn is_guest(&self) -> bool {
        self.0 == GUEST_IDENTITY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absent or blank header falls back to the shared guest identity.
    pub fn from_header(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::guest()),
            Some(v) if v.len() > MAX_IDENTITY_LEN => Err(AppError::ValidationError(format!(
                "{IDENTITY_HEADER} must be at most {MAX_IDENTITY_LEN} bytes"
            ))),
            Some(v) if v.chars().any(char::is_control) => Err(AppError::ValidationError(
                format!("{IDENTITY_HEADER} contains invalid characters"),
            )),
            Some(v) => Ok(UserIdentity(v.to_string())),
        }
    }
}

/// Identity placed in request extensions by [`IdentityMiddleware`].
pub fn get_identity_from_request(req: &HttpRequest) -> UserIdentity {
    req.extensions()
        .get::<UserIdentity>()
        .cloned()
        .unwrap_or_else(UserIdentity::guest)
}

/// Reads the identity header and stores a [`UserIdentity`] in the request
/// extensions for the handlers behind it.
pub struct IdentityMiddleware;

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService { service }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight carries no identity
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let header = req
            .headers()
            .get(IDENTITY_HEADER)
            .map(|v| v.to_str().map_err(|_| ()));
        let identity = match header {
            Some(Err(())) => Err(AppError::ValidationError(format!(
                "{IDENTITY_HEADER} must be visible ASCII"
            ))),
            Some(Ok(value)) => UserIdentity::from_header(Some(value)),
            None => UserIdentity::from_header(None),
        };

        match identity {
            Ok(identity) => {
                if identity.is_guest() {
                    log::debug!("No identity on {}, using guest quota", req.path());
                }
                req.extensions_mut().insert(identity);
                Box::pin(self.service.call(req))
            }
            Err(error) => Box::pin(async move { Err(error.into()) }),
        }
    }
}

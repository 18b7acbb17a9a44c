use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::Future;
use futures::task::{Context, Poll};
use glam::Vec3;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower::util::BoxService;
use tower::{BoxError, Service, ServiceBuilder};

use super::pather::{Pather, PatherKind};
use crate::error::PathingError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathRequest {
    pub from: Vec3,
    pub to: Vec3,
}

pub type BoxPathService = BoxService<PathRequest, Vec<Vec3>, BoxError>;

/// Adapts a [`Pather`] to a tower service.
#[derive(Clone)]
pub struct PatherService {
    inner: Arc<dyn Pather>,
}

impl PatherService {
    pub fn new(inner: Arc<dyn Pather>) -> Self {
        Self { inner }
    }
}

impl Service<PathRequest> for PatherService {
    type Response = Vec<Vec3>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: PathRequest) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move {
            let route = inner.find_route(req.from, req.to).await?;
            Ok(route)
        })
    }
}

pub struct PatherServiceBuilder {
    pather: Arc<dyn Pather>,
    timeout: Option<Duration>,
}

impl PatherServiceBuilder {
    pub fn new(pather: Arc<dyn Pather>) -> Self {
        Self {
            pather,
            timeout: None,
        }
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn kind(&self) -> PatherKind {
        self.pather.kind()
    }

    pub fn build(self) -> BoxPathService {
        let service = ServiceBuilder::new()
            .option_layer(self.timeout.map(TimeoutLayer::new))
            .service(PatherService::new(self.pather));

        BoxService::new(service)
    }
}

/// Recover the pathing error from a boxed service error.
pub fn into_pathing_error(err: BoxError) -> PathingError {
    if err.is::<Elapsed>() {
        return PathingError::Timeout;
    }
    match err.downcast::<PathingError>() {
        Ok(err) => *err,
        Err(other) => PathingError::Service(other.to_string()),
    }
}

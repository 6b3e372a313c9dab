//! End-to-end tests driving the router through `tower::ServiceExt::oneshot`.

mod helpers;
mod rate_limit_test;

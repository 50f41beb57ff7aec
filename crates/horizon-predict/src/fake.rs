//! Closure-backed fakes for the runner and fetcher ports.
//!
//! Each fake forwards its call to a reactor closure, so tests decide the
//! outcome of every external call.

use std::time::Duration;

use horizon_core::TuningFetchHook;

use crate::error::{FetchError, RunError};
use crate::fetcher::Fetcher;
use crate::predictor::BoxFuture;
use crate::runner::Runner;

type RunReactor = dyn Fn(&str, &str, Duration) -> Result<String, RunError> + Send + Sync;
type FetchReactor = dyn Fn(&TuningFetchHook, &str) -> Result<String, FetchError> + Send + Sync;

/// Runner whose result comes from a reactor closure.
pub struct FakeRunner {
    reactor: Box<RunReactor>,
}

impl FakeRunner {
    pub fn new<F>(reactor: F) -> Self
    where
        F: Fn(&str, &str, Duration) -> Result<String, RunError> + Send + Sync + 'static,
    {
        Self {
            reactor: Box::new(reactor),
        }
    }
}

impl Runner for FakeRunner {
    fn run_algorithm_with_value<'a>(
        &'a self,
        algorithm_path: &'a str,
        value: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<String, RunError>> {
        let result = (self.reactor)(algorithm_path, value, timeout);
        Box::pin(async move { result })
    }
}

/// Fetcher whose result comes from a reactor closure.
pub struct FakeFetcher {
    reactor: Box<FetchReactor>,
}

impl FakeFetcher {
    pub fn new<F>(reactor: F) -> Self
    where
        F: Fn(&TuningFetchHook, &str) -> Result<String, FetchError> + Send + Sync + 'static,
    {
        Self {
            reactor: Box::new(reactor),
        }
    }
}

impl Fetcher for FakeFetcher {
    fn fetch<'a>(
        &'a self,
        hook: &'a TuningFetchHook,
        value: &'a str,
    ) -> BoxFuture<'a, Result<String, FetchError>> {
        let result = (self.reactor)(hook, value);
        Box::pin(async move { result })
    }
}

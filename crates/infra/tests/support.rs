//! Shared helpers for network integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use wiremock::MockServer;

use syncline_common::{RetryPolicy, RetryRunner};
use syncline_core::{PeopleLookup, PersonMatch};
use syncline_domain::Result;
use syncline_infra::graph::{GraphClient, StaticTokenProvider, TimezoneResolver};

/// Graph client pointed at a wiremock server.
pub fn graph_client(server: &MockServer) -> Arc<GraphClient> {
    Arc::new(
        GraphClient::with_base_url(server.uri(), Arc::new(StaticTokenProvider::new("test-token")))
            .expect("client builds"),
    )
}

pub fn timezone_resolver(client: Arc<GraphClient>) -> Arc<TimezoneResolver> {
    Arc::new(TimezoneResolver::new(client))
}

/// Retry runner with millisecond delays so retry paths finish quickly.
pub fn fast_retry() -> RetryRunner {
    RetryRunner::new(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        jitter: 0.0,
    })
}

/// People lookup that resolves every name to `<name>@directory.test`.
pub struct FakeDirectory;

#[async_trait]
impl PeopleLookup for FakeDirectory {
    async fn search_by_name(&self, name: &str) -> Result<Option<PersonMatch>> {
        Ok(Some(PersonMatch {
            address: format!("{}@directory.test", name.to_lowercase().replace(' ', ".")),
            display_name: name.to_string(),
        }))
    }
}

//! Network reachability probe.

use std::time::Duration;

/// A captive-portal style endpoint that answers 204 without a body.
const PROBE_URL: &str = "https://www.gstatic.com/generate_204";

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether the network looks reachable right now.
///
/// Any HTTP response counts as online, even an error status: the question
/// is reachability, not the probe endpoint's health.
pub async fn is_online(client: &reqwest::Client) -> bool {
    probe(client, PROBE_URL).await
}

pub(crate) async fn probe(client: &reqwest::Client, url: &str) -> bool {
    match client.head(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(error = %e, "connectivity probe failed");
            false
        }
    }
}

/// Content-server endpoint probing and selection.
use anyhow::Result;

/// Default content-server candidates, probed in order.
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://cdn.cometlauncher.org/",
    "https://cdn-eu.cometlauncher.org/",
];

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("No content server is reachable ({probed} candidates probed)")]
    AllUnreachable { probed: usize },
}

/// Probes candidate content-server base URLs and remembers the first one
/// that answers. Candidates found unreachable are dropped from the working
/// set, so later calls in the same run never re-probe them.
pub struct EndpointSelector {
    candidates: Vec<String>,
    client: reqwest::Client,
    selected: Option<String>,
}

impl EndpointSelector {
    pub fn new(candidates: &[&str], client: reqwest::Client) -> Self {
        Self {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            client,
            selected: None,
        }
    }

    /// Return the first reachable base URL, probing in candidate order.
    ///
    /// The result is memoized for the lifetime of the selector; unreachable
    /// candidates are removed as they fail. Exhausting every candidate is a
    /// typed error rather than a silent fallback URL.
    pub async fn select(&mut self) -> Result<String, EndpointError> {
        if let Some(ref url) = self.selected {
            return Ok(url.clone());
        }

        let probed = self.candidates.len();
        while let Some(candidate) = self.candidates.first().cloned() {
            match self.client.get(&candidate).send().await {
                Ok(response) => {
                    log::debug!(
                        "Server {} responded with status {}",
                        candidate,
                        response.status()
                    );
                    self.selected = Some(candidate.clone());
                    return Ok(candidate);
                }
                Err(e) => {
                    log::info!("Server {} is not accessible: {}", candidate, e);
                    self.candidates.retain(|c| c != &candidate);
                }
            }
        }

        Err(EndpointError::AllUnreachable { probed })
    }

    /// Candidates still considered reachable (or not yet probed).
    pub fn remaining(&self) -> &[String] {
        &self.candidates
    }
}

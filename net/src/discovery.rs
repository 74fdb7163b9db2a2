//! Service discovery client: resolves a dataset/environment pair against a
//! loaded registry and fails over across the matching nodes.
//!
//! No RPC backend — spec.md §6 explicitly scopes this to the
//! interface-level client over a registry already in hand (CSV file or
//! env-var loaded), not a live discovery service.

use vexdb_core::error::{DiscoveryError, Error};

use crate::config::ConnectOptions;
use crate::registry::RegistryEntry;
use crate::session::SyncSession;

pub struct DiscoveryClient {
    entries: Vec<RegistryEntry>,
}

impl DiscoveryClient {
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        DiscoveryClient { entries }
    }

    /// All registry rows for `dataset` in `env`, in file order — the
    /// failover order `connect` tries them in.
    pub fn resolve(&self, dataset: &str, env: &str) -> Vec<&RegistryEntry> {
        self.entries.iter().filter(|e| e.dataset == dataset && e.env == env).collect()
    }

    fn connect_options_for(entry: &RegistryEntry, user: Option<&str>, password: Option<&str>) -> ConnectOptions {
        let mut opts = ConnectOptions::new(entry.host.clone(), entry.port);
        if let Some(u) = user {
            opts = opts.user(u);
        }
        if let Some(p) = password {
            opts = opts.password(p);
        }
        opts
    }

    /// Connect to the first reachable node for `dataset`/`env`, trying each
    /// matching registry row in order until one succeeds.
    pub fn connect(&self, dataset: &str, env: &str, user: Option<&str>, password: Option<&str>) -> Result<SyncSession, Error> {
        let candidates = self.resolve(dataset, env);
        if candidates.is_empty() {
            return Err(DiscoveryError::ServiceNotFound(format!("{dataset}@{env}")).into());
        }
        let mut last_err = None;
        for entry in candidates {
            let opts = Self::connect_options_for(entry, user, password);
            match SyncSession::connect(opts) {
                Ok(session) => return Ok(session),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.expect("at least one candidate attempted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(dataset: &str, env: &str, host: &str) -> RegistryEntry {
        RegistryEntry {
            dataset: dataset.into(),
            cluster: "c".into(),
            dbtype: "vexdb".into(),
            node: "n".into(),
            host: host.into(),
            port: 5010,
            port_env: None,
            env: env.into(),
        }
    }

    #[test]
    fn resolve_filters_by_dataset_and_env() {
        let client = DiscoveryClient::new(vec![
            entry("trades", "prod", "a.internal"),
            entry("trades", "staging", "b.internal"),
            entry("quotes", "prod", "c.internal"),
        ]);
        let matches = client.resolve("trades", "prod");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].host, "a.internal");
    }

    #[test]
    fn connect_reports_service_not_found_for_unknown_dataset() {
        let client = DiscoveryClient::new(vec![]);
        assert!(matches!(client.connect("missing", "prod", None, None), Err(Error::Discovery(DiscoveryError::ServiceNotFound(_)))));
    }
}

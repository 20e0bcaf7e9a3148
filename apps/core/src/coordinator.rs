use crate::catalog::{Catalog, CatalogError, CatalogSource};
use crate::catalog_store::{CatalogConnector, SqliteConnector};
use crate::config::{Config, ReconnectPolicy};
use crate::extract::extract;
use crate::model::{QueryResult, SearchToken};

/// What one clipboard event turned into.
#[derive(Debug)]
pub enum RoundOutcome {
    /// The coordinator is paused; nothing was looked at.
    Disabled,
    /// No usable token could be extracted.
    Rejected,
    Completed {
        token: SearchToken,
        results: Vec<QueryResult>,
        failures: Vec<CatalogError>,
    },
}

impl RoundOutcome {
    pub fn results(&self) -> &[QueryResult] {
        match self {
            Self::Completed { results, .. } => results,
            _ => &[],
        }
    }

    pub fn into_results(self) -> Vec<QueryResult> {
        match self {
            Self::Completed { results, .. } => results,
            _ => Vec::new(),
        }
    }
}

/// Result of flipping the enable flag.
#[derive(Debug)]
pub struct Activation {
    pub enabled: bool,
    pub reconnect_failures: Vec<CatalogError>,
}

/// Fans one token out over every connected catalog, in declaration order.
pub struct QueryCoordinator {
    catalogs: Vec<Catalog>,
    connector: Box<dyn CatalogConnector>,
    policy: ReconnectPolicy,
    enabled: bool,
}

impl QueryCoordinator {
    pub fn new(sources: Vec<CatalogSource>, connector: Box<dyn CatalogConnector>) -> Self {
        Self {
            catalogs: sources.into_iter().map(Catalog::new).collect(),
            connector,
            policy: ReconnectPolicy::default(),
            enabled: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.catalog_sources(), Box::new(SqliteConnector))
            .with_policy(config.reconnect_policy)
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn catalogs(&self) -> &[Catalog] {
        &self.catalogs
    }

    pub fn active_count(&self) -> usize {
        self.catalogs.iter().filter(|c| c.is_connected()).count()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Tries every catalog that has no live connection; one failure never stops the rest.
    pub fn connect_missing(&mut self) -> Vec<CatalogError> {
        let connector = self.connector.as_ref();
        let mut failures = Vec::new();
        for catalog in self.catalogs.iter_mut().filter(|c| !c.is_connected()) {
            if let Err(error) = catalog.connect(connector) {
                tracing::error!(%error, "catalog connection failed");
                failures.push(error);
            }
        }
        tracing::info!(
            "active catalogs: {} / {}",
            self.active_count(),
            self.catalogs.len()
        );
        failures
    }

    /// Sets the enable flag; going from disabled to enabled reconnects missing catalogs.
    pub fn set_enabled(&mut self, enabled: bool) -> Activation {
        let reactivated = enabled && !self.enabled;
        self.enabled = enabled;
        let reconnect_failures = if reactivated {
            self.connect_missing()
        } else {
            Vec::new()
        };
        Activation {
            enabled,
            reconnect_failures,
        }
    }

    pub fn toggle(&mut self) -> Activation {
        self.set_enabled(!self.enabled)
    }

    pub fn run(&mut self, raw: &str) -> Vec<QueryResult> {
        self.run_round(raw).into_results()
    }

    pub fn run_round(&mut self, raw: &str) -> RoundOutcome {
        if !self.enabled {
            return RoundOutcome::Disabled;
        }

        let Some(token) = extract(raw) else {
            tracing::debug!("clipboard text rejected");
            return RoundOutcome::Rejected;
        };

        let mut failures = Vec::new();
        if self.policy == ReconnectPolicy::OnQuery {
            failures.extend(self.connect_missing());
        }

        let mut results = Vec::new();
        for catalog in self.catalogs.iter_mut() {
            if !catalog.is_connected() {
                continue;
            }
            match catalog.search(&token) {
                Ok(result) => results.push(result),
                Err(error) => {
                    tracing::error!(%error, "catalog query failed");
                    catalog.disconnect();
                    failures.push(error);
                }
            }
        }

        RoundOutcome::Completed {
            token,
            results,
            failures,
        }
    }

    /// Drops every live connection.
    pub fn shutdown(&mut self) {
        for catalog in &mut self.catalogs {
            catalog.disconnect();
        }
    }
}

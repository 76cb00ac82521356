use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;

use domain::{
    Alarm, BayesModel, Candidate, CycleStatus, EngineConfig, LogicalEngine, RootCauseStrategy,
};
use infrastructure::{load_alarms, TenantRegistry, TopologyHandle};

/// Outcome of one analysis cycle on one network.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub tenant: String,
    pub network: String,
    /// Topology generation the cycle ran against.
    pub generation: u64,
    pub status: CycleStatus,
    pub candidates: Vec<Candidate>,
    /// Ranking from the Bayesian strategy, when a model is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative: Option<Vec<Candidate>>,
    /// Set when the topology file changed but could not be loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_error: Option<String>,
}

/// Runs analysis cycles for one tenant network.
///
/// Owns its topology handle and engine settings; nothing is shared with
/// other services except the read-only Bayesian model.
pub struct AnalysisService {
    tenant: String,
    network: String,
    topology: TopologyHandle,
    config: EngineConfig,
    bayes: Option<Arc<BayesModel>>,
}

impl AnalysisService {
    pub fn new(tenant: &str, network: &str, topology: TopologyHandle, config: EngineConfig) -> Result<Self> {
        config.validate().context("Invalid engine configuration")?;
        Ok(Self {
            tenant: tenant.to_string(),
            network: network.to_string(),
            topology,
            config,
            bayes: None,
        })
    }

    pub fn open(registry: &TenantRegistry, tenant: &str, network: &str, config: EngineConfig) -> Result<Self> {
        let path = registry.topology_path(tenant, network).with_context(|| {
            format!(
                "No topology file for {tenant}/{network} under {}",
                registry.network_dir(tenant, network).display()
            )
        })?;
        let topology = TopologyHandle::open(&path)
            .with_context(|| format!("Failed to open topology for {tenant}/{network}"))?;
        Self::new(tenant, network, topology, config)
    }

    pub fn with_bayes(mut self, model: Arc<BayesModel>) -> Self {
        self.bayes = Some(model);
        self
    }

    pub fn topology(&self) -> &TopologyHandle {
        &self.topology
    }

    /// Pick up topology edits, then analyze `alarms` against one snapshot.
    pub fn run_cycle(&self, alarms: &[Alarm]) -> Result<CycleReport> {
        let reload_error = match self.topology.reload_if_changed() {
            Ok(_) => None,
            Err(err) => Some(format!("{err:#}")),
        };

        let (snapshot, generation) = self.topology.versioned_snapshot();
        let engine = LogicalEngine::new(snapshot, self.config.clone())?;

        let candidates = engine.analyze(alarms);
        let status = CycleStatus::assess(&candidates, &self.config);
        let alternative = self.bayes.as_ref().map(|model| model.rank(alarms));

        tracing::info!(
            tenant = self.tenant.as_str(),
            network = self.network.as_str(),
            generation,
            status = %status,
            "cycle complete"
        );

        Ok(CycleReport {
            tenant: self.tenant.clone(),
            network: self.network.clone(),
            generation,
            status,
            candidates,
            alternative,
            reload_error,
        })
    }
}

/// Result for one network of a fleet-wide run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FleetEntry {
    Report(CycleReport),
    Failed {
        tenant: String,
        network: String,
        error: String,
    },
}

impl FleetEntry {
    pub fn key(&self) -> (&str, &str) {
        match self {
            FleetEntry::Report(r) => (r.tenant.as_str(), r.network.as_str()),
            FleetEntry::Failed { tenant, network, .. } => (tenant.as_str(), network.as_str()),
        }
    }
}

/// Analyze every tenant network once, each on its own blocking task.
///
/// Alarms come from the network's `alarms.*` file; a network without one is
/// analyzed as a quiet cycle. Entries are sorted by tenant, then network.
pub async fn analyze_fleet(
    registry: TenantRegistry,
    config: EngineConfig,
    bayes: Option<Arc<BayesModel>>,
) -> Result<Vec<FleetEntry>> {
    let mut tasks = JoinSet::new();

    for tenant in registry.list_tenants()? {
        for network in registry.list_networks(&tenant)? {
            let registry = registry.clone();
            let config = config.clone();
            let bayes = bayes.clone();
            let tenant = tenant.clone();
            tasks.spawn_blocking(move || {
                match analyze_network(&registry, &tenant, &network, config, bayes) {
                    Ok(report) => FleetEntry::Report(report),
                    Err(err) => {
                        tracing::warn!(tenant = tenant.as_str(), network = network.as_str(), error = %format!("{err:#}"), "network analysis failed");
                        FleetEntry::Failed {
                            tenant,
                            network,
                            error: format!("{err:#}"),
                        }
                    }
                }
            });
        }
    }

    let mut entries = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        entries.push(joined.context("Analysis task panicked")?);
    }
    entries.sort_by(|a, b| a.key().cmp(&b.key()));
    Ok(entries)
}

fn analyze_network(
    registry: &TenantRegistry,
    tenant: &str,
    network: &str,
    config: EngineConfig,
    bayes: Option<Arc<BayesModel>>,
) -> Result<CycleReport> {
    let mut service = AnalysisService::open(registry, tenant, network, config)?;
    if let Some(model) = bayes {
        service = service.with_bayes(model);
    }
    let alarms = match registry.alarms_path(tenant, network) {
        Some(path) => load_alarms(&path)?,
        None => Vec::new(),
    };
    service.run_cycle(&alarms)
}

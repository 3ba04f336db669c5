//! CLI runner - executes commands

use crate::auth::TokenProvider;
use crate::cli::commands::{Cli, Commands};
use crate::config::{Credentials, PipelineConfig};
use crate::error::{Error, Result};
use crate::fetch::DailyStatisticsFetcher;
use crate::http::{HttpClient, HttpClientConfig};
use crate::pipeline::{run_extract, run_full};
use crate::state::StateStore;
use crate::store::Warehouse;
use crate::transform::{run_transform, PlaceholderResolver};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Extract { refresh } => self.extract(&config, *refresh).await,
            Commands::Transform => self.transform(&config),
            Commands::Run { refresh } => self.run_full(&config, *refresh).await,
            Commands::ShowConfig => Self::show_config(&config),
        }
    }

    /// Load the pipeline configuration. Extraction commands validate it
    /// before any network call; `transform` and `show-config` work on
    /// partial configurations.
    fn load_config(&self) -> Result<PipelineConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Configuration file not specified (use -c flag)"))?;
        PipelineConfig::from_file(path)
    }

    fn warehouse(&self, config: &PipelineConfig) -> Result<Warehouse> {
        let path = self
            .cli
            .database
            .clone()
            .unwrap_or_else(|| config.warehouse.database_path.clone().into());
        Warehouse::open(path)
    }

    fn state_store(&self, config: &PipelineConfig) -> StateStore {
        match self.cli.state.as_ref().or(config.state_path.as_ref()) {
            Some(path) => StateStore::at(path),
            None => StateStore::in_memory(),
        }
    }

    fn fetcher(&self, config: &PipelineConfig) -> Result<DailyStatisticsFetcher> {
        let credentials = Credentials::from_env()?;
        let provider = TokenProvider::new(
            config.api.token_url.clone(),
            credentials,
            config.api.scope.clone(),
        );
        let client = HttpClient::with_config(
            HttpClientConfig::with_base_url(config.api.base_url.clone())
                .timeout(Duration::from_secs(config.api.timeout_seconds)),
        )
        .with_token_provider(Arc::new(provider));
        Ok(DailyStatisticsFetcher::new(
            client,
            config.source.page_limit,
        ))
    }

    async fn extract(&self, config: &PipelineConfig, refresh: bool) -> Result<()> {
        config.validate()?;
        let warehouse = self.warehouse(config)?;
        let fetcher = self.fetcher(config)?;
        let state_store = self.state_store(config);

        let report = run_extract(
            &fetcher,
            &config.source,
            &warehouse,
            &config.warehouse.bronze_table,
            &state_store,
            refresh,
        )
        .await?;

        info!(
            "Extract done: {} records written (load {:?})",
            report.records_written, report.load_id
        );
        Ok(())
    }

    fn transform(&self, config: &PipelineConfig) -> Result<()> {
        let warehouse = self.warehouse(config)?;
        let report = run_transform(
            &warehouse,
            &config.warehouse.bronze_table,
            &config.warehouse.silver_table,
            &PlaceholderResolver,
        )?;
        info!(
            "Transform done: {} observations written ({} date failures)",
            report.rows_written, report.date_parse_failures
        );
        Ok(())
    }

    async fn run_full(&self, config: &PipelineConfig, refresh: bool) -> Result<()> {
        config.validate()?;
        let warehouse = self.warehouse(config)?;
        let fetcher = self.fetcher(config)?;
        let state_store = self.state_store(config);

        let report = run_full(
            &fetcher,
            &config.source,
            &warehouse,
            &config.warehouse.bronze_table,
            &config.warehouse.silver_table,
            &state_store,
            &PlaceholderResolver,
            refresh,
        )
        .await?;

        info!(
            "Run done: {} records extracted, {} observations written",
            report.extract.records_written, report.transform.rows_written
        );
        Ok(())
    }

    fn show_config(config: &PipelineConfig) -> Result<()> {
        // Credentials come from the environment and are never part of the
        // printed configuration
        println!("{}", serde_yaml::to_string(config)?);
        Ok(())
    }
}

use anyhow::{bail, Context, Result};
use bkpipe::config::{load_document, Config, OutputFormat};
use bkpipe::{PipelineDefinition, PipelineReconciler, PipelineState, Token};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::output;

#[derive(Parser)]
#[command(name = "bkpipe")]
#[command(author, version, about = "Buildkite pipeline reconciler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./bkpipe.toml or the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, env = "BUILDKITE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, global = true, env = "BUILDKITE_ORGANIZATION")]
    organization: Option<String>,

    /// Where the observed pipeline state is kept between runs
    #[arg(short, long, global = true, default_value = "bkpipe.state.json")]
    state: PathBuf,

    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the pipeline described by a definition file
    Create {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Refresh the state from Buildkite
    Read,
    /// Apply a definition file to the existing pipeline
    Update {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete the pipeline and forget its state
    Delete,
    /// Start tracking an existing pipeline by its GraphQL ID
    Import { id: String },
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(token) = &self.token {
            config.buildkite.token = Some(token.clone());
        }
        if let Some(organization) = &self.organization {
            config.buildkite.organization = Some(organization.clone());
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        config.output.pretty |= self.pretty;

        Ok(config)
    }

    fn load_definition(path: &Path) -> Result<PipelineDefinition> {
        let definition: PipelineDefinition = load_document(path)?;

        let missing = definition.missing_fields();
        if !missing.is_empty() {
            bail!(
                "{} is missing required fields: {}",
                path.display(),
                missing.join(", ")
            );
        }

        Ok(definition)
    }

    pub async fn execute(&self) -> Result<()> {
        let config = self.load_config()?;

        let token = config
            .buildkite
            .token
            .as_deref()
            .map(Token::from)
            .context("No Buildkite API token; set BUILDKITE_TOKEN or buildkite.token")?;

        let reconciler = PipelineReconciler::from_config(&config.buildkite, &token)?;

        let mut state = PipelineState::load(&self.state)
            .with_context(|| format!("Failed to load state: {}", self.state.display()))?;

        let result = match &self.command {
            Commands::Create { file } => {
                let definition = Self::load_definition(file)?;
                if state.id().is_ok() {
                    bail!(
                        "{} already tracks a pipeline; use `update` or remove the state file",
                        self.state.display()
                    );
                }
                reconciler.create(&definition, &mut state).await
            }
            Commands::Read => reconciler.read(&mut state).await,
            Commands::Update { file } => {
                let definition = Self::load_definition(file)?;
                reconciler.update(&definition, &mut state).await
            }
            Commands::Delete => {
                reconciler.delete(&state).await?;
                if self.state.exists() {
                    std::fs::remove_file(&self.state).with_context(|| {
                        format!("Failed to remove state: {}", self.state.display())
                    })?;
                }
                info!("Pipeline deleted");
                eprintln!("{}", output::bright_green("Pipeline deleted"));
                return Ok(());
            }
            Commands::Import { id } => reconciler.import(id, &mut state).await,
        };

        // Saved even on failure: a half-created pipeline must stay tracked.
        state
            .save(&self.state)
            .with_context(|| format!("Failed to save state: {}", self.state.display()))?;

        if let Err(err) = result {
            if err.is_not_found() {
                warn!("Pipeline no longer exists on Buildkite");
            }
            return Err(err.into());
        }

        output::print_state(&state, config.output.format, config.output.pretty)
    }
}

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ghmirror::catalog::{self, CatalogRequest};
use ghmirror::credentials::{resolve_authorization, sources_from_config};
use ghmirror::output::stdout_is_terminal;
use ghmirror::repository::format_record;
use ghmirror::search::{self, SearchOptions};
use ghmirror::{retire, Config, GitClient, GitHubClient, MirrorLayout, SyncEngine};

#[derive(Parser)]
#[command(name = "ghmirror")]
#[command(about = "Mirror all repositories of a GitHub user or organization")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// User- or organization name (defaults to the authenticated user)
    #[arg(value_name = "USER_OR_ORG")]
    name: Option<String>,

    /// Repository path
    #[arg(short, long, value_name = "PATH", global = true)]
    path: Option<String>,

    /// Include archived repositories
    #[arg(long, global = true)]
    archived: bool,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all repositories
    List {
        /// Show raw repository values
        #[arg(long)]
        raw: bool,

        /// Output format of each repository, e.g. "%(name)s %(ssh_url)s"
        #[arg(short, long, value_name = "FORMAT", default_value = "%(clone_url)s")]
        format: String,

        /// Show only this repository
        #[arg(value_name = "REPO")]
        repo: Option<String>,
    },

    /// Fetch all repositories, then abandon vanished ones
    Fetch,

    /// Abandon archived or deleted repositories
    Abandon,

    /// Grep in all repositories
    Grep {
        /// Git ref (defaults to main, master or HEAD)
        #[arg(long = "ref", value_name = "REF")]
        reference: Option<String>,

        /// Extended regular expression
        #[arg(value_name = "PATTERN")]
        pattern: String,

        #[arg(value_name = "FILE")]
        files: Vec<String>,
    },

    /// Find files in all repositories
    LsFiles {
        /// Git ref (defaults to main, master or HEAD)
        #[arg(long = "ref", value_name = "REF")]
        reference: Option<String>,

        #[arg(value_name = "FILE")]
        files: Vec<String>,
    },

    /// Write the effective configuration to the config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    init_logging(cli.verbose)?;
    debug!("Starting ghmirror v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match (&command, cli.config.as_deref()) {
        // init may target a file that does not exist yet
        (Commands::Init, Some(path)) if !path.exists() => {
            let mut config = Config::default();
            config.expand_paths()?;
            config
        }
        (_, path) => load_config(path)?,
    };
    if let Some(path) = &cli.path {
        config.override_mirror_root(path)?;
    }

    let context = CommandContext {
        config,
        name: cli.name,
        include_archived: cli.archived,
    };

    match command {
        Commands::List {
            raw,
            format,
            repo,
        } => cmd_list(&context, raw, &format, repo).await,
        Commands::Fetch => cmd_fetch(&context).await,
        Commands::Abandon => cmd_abandon(&context).await,
        Commands::Grep {
            reference,
            pattern,
            files,
        } => cmd_grep(&context, reference, &pattern, files).await,
        Commands::LsFiles { reference, files } => cmd_ls_files(&context, reference, files).await,
        Commands::Init => cmd_init(&context.config, cli.config.as_deref()),
    }
}

/// Initialize logging based on verbosity level; logs go to stderr
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}

/// Settings every command works from
struct CommandContext {
    config: Config,
    name: Option<String>,
    include_archived: bool,
}

impl CommandContext {
    /// Resolve credentials and build the API client
    fn github_client(&self) -> Result<GitHubClient> {
        let sources = sources_from_config(&self.config.auth);
        let authorization =
            resolve_authorization(&sources).context("Failed to obtain GitHub authorization")?;

        GitHubClient::new(&self.config.github, authorization)
            .context("Failed to create GitHub client")
    }

    fn catalog_request(&self, repository: Option<String>) -> CatalogRequest {
        CatalogRequest {
            owner: self.name.clone(),
            repository,
            include_archived: self.include_archived,
        }
    }

    fn layout(&self, owner: &str) -> MirrorLayout {
        MirrorLayout::new(&self.config.mirror_root, owner)
    }

    /// Layout for commands that only read the mirror tree
    async fn local_layout(&self) -> Result<MirrorLayout> {
        let owner = match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => {
                let client = self.github_client()?;
                catalog::resolve_owner(&client, None)
                    .await
                    .context("Failed to determine the authenticated user")?
            }
        };
        Ok(self.layout(&owner))
    }

    fn git(&self) -> GitClient {
        GitClient::new(&self.config.sync.git_program)
    }
}

/// List all repositories
async fn cmd_list(
    context: &CommandContext,
    raw: bool,
    format: &str,
    repo: Option<String>,
) -> Result<()> {
    let client = context.github_client()?;
    let catalog = catalog::resolve(&client, &context.catalog_request(repo))
        .await
        .context("Failed to list repositories")?;

    for record in &catalog.repositories {
        if raw {
            println!("{}", record.name);
            println!("{}", serde_json::to_string_pretty(&record.raw())?);
        } else {
            println!("{}", format_record(format, record)?);
        }
    }

    Ok(())
}

/// Fetch all repositories, then abandon the ones no longer listed
async fn cmd_fetch(context: &CommandContext) -> Result<()> {
    let client = context.github_client()?;
    let catalog = catalog::resolve(&client, &context.catalog_request(None))
        .await
        .context("Failed to list repositories")?;
    let layout = context.layout(&catalog.owner);

    let engine = SyncEngine::new(Arc::new(context.git()), context.config.sync.max_parallel)
        .with_highlight(stdout_is_terminal());
    let summary = engine
        .synchronize(&catalog, &layout)
        .await
        .with_context(|| format!("Failed to prepare {}", layout.current().display()))?;

    info!(
        "{} repositories: {} cloned, {} fetched",
        summary.total_repositories, summary.cloned, summary.fetched
    );

    // Same catalog snapshot, no second listing
    retire::retire(&catalog, &layout).context("Failed to abandon repositories")?;

    Ok(())
}

/// Abandon archived or deleted repositories
async fn cmd_abandon(context: &CommandContext) -> Result<()> {
    let client = context.github_client()?;
    let catalog = catalog::resolve(&client, &context.catalog_request(None))
        .await
        .context("Failed to list repositories")?;
    let layout = context.layout(&catalog.owner);

    retire::retire(&catalog, &layout).context("Failed to abandon repositories")?;

    Ok(())
}

/// Grep in all repositories
async fn cmd_grep(
    context: &CommandContext,
    reference: Option<String>,
    pattern: &str,
    files: Vec<String>,
) -> Result<()> {
    let layout = context.local_layout().await?;
    let options = SearchOptions {
        reference,
        files,
        color: stdout_is_terminal(),
    };

    search::grep(&context.git(), &layout, pattern, &options, |line| {
        println!("{}", line)
    })
    .await
    .context("Failed to grep repositories")?;

    Ok(())
}

/// Find files in all repositories
async fn cmd_ls_files(
    context: &CommandContext,
    reference: Option<String>,
    files: Vec<String>,
) -> Result<()> {
    let layout = context.local_layout().await?;
    let options = SearchOptions {
        reference,
        files,
        color: stdout_is_terminal(),
    };

    search::ls_files(&context.git(), &layout, &options, |line| println!("{}", line))
        .await
        .context("Failed to list files")?;

    Ok(())
}

/// Save the effective configuration
fn cmd_init(config: &Config, config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path()?,
    };

    config.save(&path)?;
    println!("Configuration saved to: {}", path.display());

    Ok(())
}

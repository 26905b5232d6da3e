mod cli;
mod error;

use crate::cli::{Cli, Command, RemoteArgs};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use gallery_config::Config;
use gallery_store::backend::{DryRunBackend, GitHubBackend};
use gallery_store::{Credential, Repository, StoreHandle, Url};
use gallery_upload::{Candidate, Catalog, Collection, Context, PendingManifest, UploadRequest, upload};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress goes to stdout; logs go to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Upload {
            event,
            dry_run,
            remote,
            files,
        } => upload_photos(&config, remote, event, files, dry_run).await,
        Command::Events { remote } => list_events(&config, remote).await,
        Command::Manifest { event, remote } => show_manifest(&config, remote, event).await,
    }
}

/// Connection details after merging flags over configuration.
struct Remote {
    repository: String,
    branch: String,
    credential: Credential,
}

impl Remote {
    fn resolve(config: &Config, args: RemoteArgs) -> Self {
        Self {
            repository: args.repo.or_else(|| config.repository.clone()).unwrap_or_default(),
            branch: args.branch.unwrap_or_else(|| config.branch.clone()),
            credential: Credential::new(args.token.unwrap_or_default()),
        }
    }

    /// For read-only commands; uploads go through full request validation.
    fn require(&self) -> Result<Repository> {
        if self.credential.is_empty() {
            exn::bail!(ErrorKind::Usage("token required (--token or GALLERY_TOKEN)".to_string()));
        }
        self.repository.parse::<Repository>().or_raise(|| ErrorKind::Usage("repository must be owner/repo".to_string()))
    }
}

fn connect(config: &Config, dry_run: bool) -> Result<StoreHandle> {
    let github: StoreHandle = Arc::new(GitHubBackend::new("github", &config.api_url).or_raise(|| ErrorKind::Store)?);
    Ok(if dry_run { Arc::new(DryRunBackend::new(github)) } else { github })
}

fn context(config: &Config) -> Result<Context> {
    let site_url = match &config.site_url {
        Some(url) => Some(Url::parse(url).or_raise(|| ErrorKind::Usage(format!("invalid site_url: {url}")))?),
        None => None,
    };
    Ok(Context::new(&config.photos_dir).with_site_url(site_url))
}

async fn load_catalog(
    config: &Config,
    store: &StoreHandle,
    credential: &Credential,
    repository: &Repository,
    branch: &str,
) -> Result<Option<Catalog>> {
    let Some(path) = &config.catalog else {
        return Ok(None);
    };
    let catalog = Catalog::load(store, credential, repository, branch, path).await.or_raise(|| ErrorKind::Upload)?;
    if catalog.is_none() {
        tracing::warn!(%path, "Event catalog not found, event ids will not be checked");
    }
    Ok(catalog)
}

async fn upload_photos(
    config: &Config,
    remote: RemoteArgs,
    event: String,
    files: Vec<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let remote = Remote::resolve(config, remote);
    let mut candidates = Vec::with_capacity(files.len());
    for path in &files {
        candidates.push(Candidate::from_path(path).await.or_raise(|| ErrorKind::Upload)?);
    }
    let request = UploadRequest {
        repository: remote.repository,
        branch: remote.branch,
        event_id: event,
        credential: remote.credential,
        files: candidates,
    };

    // Reject bad input before the catalog read; the catalog check itself
    // happens again inside the batch.
    let mut ctx = context(config)?;
    let collection = request.validate(&ctx).or_raise(|| ErrorKind::Upload)?;
    let store = connect(config, dry_run)?;
    ctx.catalog = load_catalog(config, &store, &request.credential, &collection.repository, &collection.branch).await?;

    let mut events = Box::pin(upload(&store, &ctx, request));
    while let Some(event) = events.next().await {
        let event = event.or_raise(|| ErrorKind::Upload)?;
        println!("{event}");
    }
    if dry_run {
        println!("Dry run: nothing was written.");
    }
    Ok(())
}

async fn list_events(config: &Config, remote: RemoteArgs) -> Result<()> {
    let remote = Remote::resolve(config, remote);
    let repository = remote.require()?;
    let store = connect(config, false)?;
    let Some(catalog) = load_catalog(config, &store, &remote.credential, &repository, &remote.branch).await? else {
        exn::bail!(ErrorKind::Usage("no event catalog configured or found".to_string()));
    };
    for event in catalog.events() {
        println!("{}\t{}", event.id, event.title);
    }
    Ok(())
}

async fn show_manifest(config: &Config, remote: RemoteArgs, event: String) -> Result<()> {
    let remote = Remote::resolve(config, remote);
    let collection = Collection {
        repository: remote.require()?,
        branch: remote.branch,
        event_id: event,
    };
    let store = connect(config, false)?;
    let ctx = context(config)?;
    let pending =
        PendingManifest::load(&store, &remote.credential, &collection, &ctx).await.or_raise(|| ErrorKind::Upload)?;

    if !pending.exists() {
        println!("{} does not exist yet", pending.path());
        return Ok(());
    }
    let manifest = pending.manifest();
    println!("{} ({} photos)", pending.path(), manifest.len());
    for entry in manifest.entries() {
        let src = entry.get("src").and_then(|src| src.as_str()).unwrap_or("<no src>");
        let name = entry.get("originalName").and_then(|name| name.as_str()).unwrap_or("");
        println!("  {src}\t{name}");
    }
    if let Some(url) = ctx.view_url(&collection.event_id) {
        println!("View: {url}");
    }
    Ok(())
}

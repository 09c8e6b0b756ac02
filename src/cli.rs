//! Command-line interface.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser as ClapParser, Subcommand};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use url::Url;

use crate::config::{load_settings, Settings};
use crate::hash::{hash_url, HashKey};
use crate::models::{Request, RequestSummary};
use crate::parsers::{Cancellation, ContentDispatcher, GzipParser, ParseError, Parser};
use crate::repository::{DieselRowStore, RequestStore};

#[derive(ClapParser, Debug)]
#[command(name = "frontier", version, about = "Inspect and edit a crawl frontier")]
pub struct Cli {
    /// Data directory (overrides the config file)
    #[arg(long, global = true, env = "FRONTIER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the identity hash of a URL
    Hash {
        url: String,
    },

    /// Queue a URL
    Push {
        url: String,

        /// URL of the page that linked here
        #[arg(long)]
        referrer: Option<String>,

        /// Anchor text or title
        #[arg(long)]
        name: Option<String>,

        /// Crawl profile handle
        #[arg(long)]
        profile: Option<String>,

        /// Peer that asked for this crawl
        #[arg(long)]
        initiator: Option<String>,

        #[arg(long, default_value_t = 0)]
        depth: u32,

        /// Expected content size in bytes
        #[arg(long, default_value_t = 0)]
        size: u64,
    },

    /// Show a queued request
    Show {
        hash: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List queued requests in key order
    List {
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,

        /// Print as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Remove a queued request
    Remove {
        hash: String,
    },

    /// Inflate a gzip file and report what is inside
    Gunzip {
        file: PathBuf,

        /// MIME type the file was served with
        #[arg(long, default_value = "application/gzip")]
        mime: String,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings().await;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }

    match cli.command {
        Commands::Hash { url } => {
            let url = parse_url(&url)?;
            println!("{}", hash_url(&url));
        }
        Commands::Push {
            url,
            referrer,
            name,
            profile,
            initiator,
            depth,
            size,
        } => {
            let url = parse_url(&url)?;
            let referrer = referrer.as_deref().map(parse_url).transpose()?;
            let initiator = initiator.as_deref().map(parse_key).transpose()?;
            let mut request = Request::new(url)
                .with_referrer(referrer.as_ref().map(hash_url))
                .with_appearance_date(Utc::now())
                .with_depth(depth)
                .with_size(size);
            if let Some(initiator) = initiator {
                request = request.with_initiator(initiator.as_bytes());
            }
            if let Some(name) = name {
                request = request.with_name(name);
            }
            if let Some(profile) = profile {
                if profile.len() != crate::HASH_LENGTH {
                    bail!("profile handle must be {} bytes: {}", crate::HASH_LENGTH, profile);
                }
                request = request.with_profile_handle(profile);
            }

            let store = open_store(&settings).await?;
            store.put(&request).await?;
            info!("Queued {}", request.url());
            println!("{}", request.url_hash());
        }
        Commands::Show { hash, json } => {
            let key = parse_key(&hash)?;
            let store = open_store(&settings).await?;
            let request = store
                .get(&key)
                .await?
                .ok_or_else(|| anyhow!("no request with hash {}", key))?;
            print_request(&request, json)?;
        }
        Commands::List { limit, json } => {
            let store = open_store(&settings).await?;
            let requests = store.list(limit).await?;
            if requests.is_empty() && !json {
                println!("Frontier is empty");
            }
            for request in &requests {
                if json {
                    println!("{}", serde_json::to_string(&RequestSummary::from(request))?);
                } else {
                    println!("{}  {}", request.url_hash(), request.url());
                }
            }
        }
        Commands::Remove { hash } => {
            let key = parse_key(&hash)?;
            let store = open_store(&settings).await?;
            if !store.remove(&key).await? {
                bail!("no request with hash {}", key);
            }
            println!("Removed {}", key);
        }
        Commands::Gunzip { file, mime } => {
            let report = gunzip(&settings, file, mime).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn parse_url(s: &str) -> Result<Url> {
    Url::parse(s).with_context(|| format!("invalid URL: {}", s))
}

fn parse_key(s: &str) -> Result<HashKey> {
    HashKey::parse(s).ok_or_else(|| anyhow!("hash must be {} bytes: {}", crate::HASH_LENGTH, s))
}

async fn open_store(settings: &Settings) -> Result<RequestStore<DieselRowStore>> {
    settings
        .ensure_directories()
        .with_context(|| format!("creating {}", settings.data_dir.display()))?;
    let rows = DieselRowStore::open(&settings.database_path()).await?;
    Ok(RequestStore::new(rows))
}

fn print_request(request: &Request, json: bool) -> Result<()> {
    let summary = RequestSummary::from(request);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("hash:       {}", summary.url_hash);
    println!("url:        {}", summary.url);
    if !summary.name.is_empty() {
        println!("name:       {}", summary.name);
    }
    if let Some(ref referrer) = summary.referrer {
        println!("referrer:   {}", referrer);
    }
    if let Some(ref initiator) = summary.initiator {
        println!("initiator:  {}", initiator);
    }
    if let Some(date) = summary.appearance_date {
        println!("appeared:   {}", date.to_rfc3339());
    }
    if let Some(ref profile) = summary.profile_handle {
        println!("profile:    {}", profile);
    }
    println!("depth:      {}", summary.depth);
    println!("size:       {}", summary.size);
    println!("flags:      {}", summary.flags);
    Ok(())
}

/// What a gzip file turned out to contain.
#[derive(Debug, serde::Serialize)]
pub struct InflatedReport {
    pub mime_type: Option<String>,
    pub size: u64,
    pub sha256: String,
}

/// Dispatcher that describes the inflated file instead of parsing it.
pub struct ReportDispatcher;

impl ContentDispatcher for ReportDispatcher {
    type Output = InflatedReport;

    fn parse_file(
        &self,
        location: &Url,
        mime_type: Option<&str>,
        path: &Path,
        cancel: &Cancellation,
    ) -> Result<InflatedReport, ParseError> {
        let mut file = File::open(path).map_err(|e| ParseError::content(location, e))?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        let mut size = 0u64;
        loop {
            cancel.check()?;
            let n = file
                .read(&mut buf)
                .map_err(|e| ParseError::content(location, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            size += n as u64;
        }

        Ok(InflatedReport {
            mime_type: mime_type.map(str::to_string),
            size,
            sha256: hex::encode(hasher.finalize()),
        })
    }
}

async fn gunzip(settings: &Settings, file: PathBuf, mime: String) -> Result<InflatedReport> {
    let path = file
        .canonicalize()
        .with_context(|| format!("reading {}", file.display()))?;
    let location =
        Url::from_file_path(&path).map_err(|_| anyhow!("not a file path: {}", path.display()))?;

    let mut parser =
        GzipParser::new(ReportDispatcher).with_max_inflated_bytes(settings.max_inflated_bytes);
    if let Some(ref dir) = settings.temp_dir {
        parser = parser.with_temp_dir(dir);
    }

    let cancel = Cancellation::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let report = tokio::task::spawn_blocking(move || {
        let mut source = File::open(&path)?;
        parser
            .parse(&location, &mime, None, &mut source, &cancel)
            .map_err(anyhow::Error::from)
    })
    .await??;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_cli_parses_push() {
        let cli = Cli::try_parse_from([
            "frontier",
            "push",
            "https://example.com/",
            "--depth",
            "3",
            "--name",
            "Home",
        ])
        .unwrap();
        match cli.command {
            Commands::Push {
                url, depth, name, ..
            } => {
                assert_eq!(url, "https://example.com/");
                assert_eq!(depth, 3);
                assert_eq!(name.as_deref(), Some("Home"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_key_rejects_wrong_length() {
        assert!(parse_key("short").is_err());
        assert!(parse_key("abcdefghijkl").is_ok());
    }

    #[tokio::test]
    async fn test_gunzip_reports_inner_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"plain notes").unwrap();
        std::fs::write(&file, encoder.finish().unwrap()).unwrap();

        let mut settings = Settings::with_data_dir(dir.path().to_path_buf());
        settings.temp_dir = Some(dir.path().join("tmp"));
        settings.ensure_directories().unwrap();

        let report = gunzip(&settings, file, "application/gzip".to_string())
            .await
            .unwrap();
        assert_eq!(report.size, 11);
        assert_eq!(report.sha256, hex::encode(Sha256::digest(b"plain notes")));
        assert!(report.mime_type.is_none());
        assert_eq!(
            std::fs::read_dir(dir.path().join("tmp")).unwrap().count(),
            0
        );
    }
}

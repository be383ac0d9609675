use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

const DEFAULT_SOURCE: &str = "days.csv";
const DEFAULT_DELIMITER: char = ',';

/// Import schedule days from a spreadsheet export into the days API.
#[derive(Parser, Debug, Default)]
#[command(name = "days-import", version, about)]
pub struct Args {
    /// Delimited file with a header row
    #[arg(env = "DAYS_CSV_PATH")]
    pub source: Option<PathBuf>,

    /// Days endpoint, e.g. http://localhost:3001/api/days
    #[arg(long, env = "DAYS_API_URL")]
    pub endpoint: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "DAYS_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// YAML file with any of: endpoint, token, source_path, delimiter, timeout_secs
    #[arg(long, env = "DAYS_IMPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Field delimiter of the source file
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Per-request timeout; without it a request waits indefinitely
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Transform and print payloads without sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Exit non-zero when any row was rejected or failed
    #[arg(long)]
    pub strict: bool,
}

/// Settings read from the optional YAML file. Anything set on the command
/// line or in the environment wins.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub source_path: Option<PathBuf>,
    pub delimiter: Option<char>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Where to send days and with what credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub endpoint: Url,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub source_path: PathBuf,
    pub delimiter: u8,
    /// `None` only for dry runs.
    pub target: Option<Target>,
    pub timeout: Option<Duration>,
    pub dry_run: bool,
    pub strict: bool,
}

impl ImportConfig {
    /// Read the config file named in `args` (if any) and merge.
    pub fn resolve(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Arguments (which already include the environment) over file over defaults.
    pub fn merge(args: Args, file: FileConfig) -> Result<Self> {
        let source_path = args
            .source
            .or(file.source_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE));

        let delimiter = args
            .delimiter
            .or(file.delimiter)
            .unwrap_or(DEFAULT_DELIMITER);
        if !delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character, got {:?}", delimiter);
        }

        let endpoint = args.endpoint.or(file.endpoint);
        let token = args.token.or(file.token);
        let target = match (endpoint, token) {
            (Some(endpoint), Some(token)) => Some(Target {
                endpoint: parse_endpoint(&endpoint)?,
                token,
            }),
            _ if args.dry_run => None,
            (None, _) => bail!("no endpoint configured (--endpoint, DAYS_API_URL or config file)"),
            (_, None) => bail!("no token configured (--token, DAYS_API_TOKEN or config file)"),
        };

        Ok(Self {
            source_path,
            delimiter: delimiter as u8,
            target,
            timeout: args.timeout_secs.or(file.timeout_secs).map(Duration::from_secs),
            dry_run: args.dry_run,
            strict: args.strict,
        })
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid endpoint URL `{}`", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("endpoint must be http or https, got `{}`", other),
    }
}

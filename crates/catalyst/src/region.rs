//! region discovery
//!
//! [RegionResolver] asks a list of [RegionSource]s in order and takes the first non-empty
//! answer. The default chain is
//! 1. the `AWS_DEFAULT_REGION` environment variable ([EnvRegion])
//! 2. the region configured for the SDK [Session] ([SessionRegion])
//! 3. the EC2 instance identity document ([InstanceMetadata])
//!
//! Sources never fail. Anything that goes wrong is logged and counts as "no region".
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const REGION_ENV: &str = "AWS_DEFAULT_REGION";
pub const METADATA_URL: &str = "http://169.254.169.254/latest/dynamic/instance-identity/document";
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_millis(1000);

pub trait RegionSource {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn region(&self) -> Option<String>;
}

/// Something that knows the region an SDK client would default to
pub trait Session {
    fn region_name(&self) -> Option<String>;
}

pub struct RegionResolver {
    sources: Vec<Box<dyn RegionSource>>,
}

impl RegionResolver {
    /// Default chain: environment, `session`, instance metadata
    pub fn new(session: impl Session + 'static, metadata_timeout: Duration) -> Self {
        let mut sources: Vec<Box<dyn RegionSource>> = vec![
            Box::new(EnvRegion::default()),
            Box::new(SessionRegion::new(session)),
        ];

        match InstanceMetadata::new(metadata_timeout) {
            Ok(metadata) => sources.push(Box::new(metadata)),
            Err(error) => tracing::warn!(%error, "instance metadata lookup disabled"),
        }

        Self { sources }
    }

    pub fn from_sources(sources: Vec<Box<dyn RegionSource>>) -> Self {
        Self { sources }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn resolve(&self) -> Option<String> {
        for source in &self.sources {
            match source.region().filter(|region| !region.is_empty()) {
                Some(region) => {
                    tracing::debug!(source = source.name(), %region, "region resolved");
                    return Some(region);
                }
                None => tracing::trace!(source = source.name(), "no region"),
            }
        }

        None
    }
}

/// Resolve a region or fail, for callers that cannot continue without one
pub fn require_region(resolver: &RegionResolver) -> Result<String, RegionError> {
    resolver.resolve().ok_or(RegionError::NotFound)
}

#[derive(thiserror::Error, Debug)]
pub enum RegionError {
    #[error("Unable to determine region (set AWS_DEFAULT_REGION or configure a profile region)")]
    NotFound,
}

#[derive(Debug, derive_new::new)]
pub struct EnvRegion {
    var: String,
}

impl Default for EnvRegion {
    fn default() -> Self {
        Self::new(REGION_ENV.to_string())
    }
}

impl RegionSource for EnvRegion {
    fn name(&self) -> &'static str {
        "env"
    }

    fn region(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

#[derive(derive_new::new)]
pub struct SessionRegion<S> {
    session: S,
}

impl<S: Session> RegionSource for SessionRegion<S> {
    fn name(&self) -> &'static str {
        "session"
    }

    fn region(&self) -> Option<String> {
        self.session.region_name()
    }
}

/// [Session] backed by the shared AWS config file
///
/// Reads the `region` key of the selected profile. `[default]` and `[profile NAME]`
/// section headers are recognized, everything else in the file is ignored.
#[derive(Debug, Clone)]
pub struct ProfileSession {
    config_file: Option<PathBuf>,
    profile: String,
}

impl ProfileSession {
    pub fn new(config_file: impl Into<PathBuf>, profile: impl Into<String>) -> Self {
        Self {
            config_file: Some(config_file.into()),
            profile: profile.into(),
        }
    }

    /// Honors `AWS_CONFIG_FILE` and `AWS_PROFILE`, falls back to `~/.aws/config`
    pub fn from_env() -> Self {
        let config_file = std::env::var_os("AWS_CONFIG_FILE")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".aws").join("config"))
            });
        let profile = std::env::var("AWS_PROFILE").unwrap_or_else(|_| "default".to_string());

        Self {
            config_file,
            profile,
        }
    }
}

impl Session for ProfileSession {
    fn region_name(&self) -> Option<String> {
        let config_file = self.config_file.as_ref()?;
        match std::fs::read_to_string(config_file) {
            Ok(contents) => profile_region(&contents, &self.profile),
            Err(error) => {
                tracing::debug!(path=%config_file.display(), %error, "config file not readable");
                None
            }
        }
    }
}

fn profile_region(contents: &str, profile: &str) -> Option<String> {
    let named = format!("profile {profile}");
    let mut selected = false;

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        // indented lines belong to a nested section such as `s3 =`
        if raw.starts_with(char::is_whitespace) {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let header = header.trim();
            selected = header == named || (profile == "default" && header == "default");
            continue;
        }

        if !selected {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == "region" && !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }
    }

    None
}

/// Plain text HTTP GET
pub trait MetadataClient {
    fn get_text(&self, url: &str) -> Result<String, MetadataError>;
}

impl MetadataClient for reqwest::blocking::Client {
    fn get_text(&self, url: &str) -> Result<String, MetadataError> {
        let response = self.get(url).send()?.error_for_status()?;
        Ok(response.text()?)
    }
}

/// Region from the EC2 instance identity document
pub struct InstanceMetadata<M = reqwest::blocking::Client> {
    client: M,
    url: String,
}

impl InstanceMetadata {
    pub fn new(timeout: Duration) -> Result<Self, MetadataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(client, METADATA_URL))
    }
}

impl<M: MetadataClient> InstanceMetadata<M> {
    pub fn with_client(client: M, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn fetch(&self) -> Result<String, MetadataError> {
        #[derive(Deserialize)]
        struct IdentityDocument {
            region: Option<String>,
        }

        let text = self.client.get_text(&self.url)?;
        let document: IdentityDocument = serde_json::from_str(&text)?;
        document.region.ok_or(MetadataError::MissingRegion)
    }
}

impl<M: MetadataClient> RegionSource for InstanceMetadata<M> {
    fn name(&self) -> &'static str {
        "instance-metadata"
    }

    fn region(&self) -> Option<String> {
        match self.fetch() {
            Ok(region) => Some(region),
            Err(error) => {
                tracing::debug!(url = %self.url, %error, "instance metadata lookup failed");
                None
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error("Metadata request failed")]
    Http(#[from] reqwest::Error),
    #[error("Metadata response is not valid json")]
    Parse(#[from] serde_json::Error),
    #[error("Metadata response has no region")]
    MissingRegion,
}

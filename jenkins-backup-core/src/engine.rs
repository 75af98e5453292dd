/*!
Ties collection, packaging, reading and reconciliation together behind the
engine type callers actually drive.
*/

use std::path::{Path, PathBuf};

use tracing::info;

use crate::archive;
use crate::collector::Collector;
use crate::config::ServerConfig;
use crate::gateway::{Gateway, HttpGateway};
use crate::metadata::Snapshot;
use crate::restore::{OverwritePolicy, Reconciler, RestoreReport};
use crate::Result;

/// Options for one backup invocation.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Base name for the produced archive, `<base>-<unixTimestamp>.tar.gz`
    pub base_name: String,
    /// Directory the archive is published into
    pub output_dir: PathBuf,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            base_name: archive::DEFAULT_ARCHIVE_BASE.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Backup/restore engine bound to one server gateway.
pub struct BackupEngine<G: Gateway> {
    gateway: G,
    created_by: String,
    server_address: String,
    server_port: u16,
}

impl BackupEngine<HttpGateway> {
    /// Engine talking to a live server over HTTP.
    pub fn connect(config: &ServerConfig) -> Result<Self> {
        config.validate()?;
        let gateway = HttpGateway::new(config)?;
        Ok(Self::new(
            gateway,
            &config.username,
            &config.host,
            config.port,
        ))
    }
}

impl<G: Gateway> BackupEngine<G> {
    pub fn new(gateway: G, created_by: &str, server_address: &str, server_port: u16) -> Self {
        Self {
            gateway,
            created_by: created_by.to_string(),
            server_address: server_address.to_string(),
            server_port,
        }
    }

    /// Snapshot the server and publish exactly one archive, returning its
    /// path. Fails without leaving a partial archive behind.
    pub fn backup(&self, options: &BackupOptions) -> Result<PathBuf> {
        info!(
            server = self.server_address.as_str(),
            "creating a backup of Jenkins configuration"
        );
        let (snapshot, store) = Collector::new(&self.gateway).collect(
            &self.created_by,
            &self.server_address,
            self.server_port,
        )?;
        let path = archive::pack(&snapshot, &store, &options.output_dir, &options.base_name)?;
        info!(archive = %path.display(), "backup complete");
        Ok(path)
    }

    /// Replay an archive against the server under the given policy.
    pub fn restore(&self, archive_path: &Path, policy: OverwritePolicy) -> Result<RestoreReport> {
        info!(archive = %archive_path.display(), "restoring backup to Jenkins");
        let (snapshot, store) = archive::read(archive_path)?;
        Reconciler::new(&self.gateway).restore(&snapshot, &store, policy)
    }
}

/// Snapshot metadata from an archive, without touching any server.
pub fn inspect_archive(archive_path: &Path) -> Result<Snapshot> {
    let (snapshot, _) = archive::read(archive_path)?;
    Ok(snapshot)
}

/*!
# Jenkins configuration backup core

Snapshots the configuration state of a Jenkins server (job definitions,
view definitions, and view-to-job membership) into a portable tar.gz
archive, and replays such an archive against the same or a different server.

The interesting part is view membership: a view's members are partly driven
by its `includeRegex` and partly added by hand. At capture time the engine
records only the members the regex does not account for; at restore time the
regex is handed back to the target server, which repopulates the matched
members itself once the jobs exist. Jobs are therefore always restored
before views.

Restore is idempotent under the default (no-overwrite) policy: items that
already exist are skipped, and a second run performs no mutations at all.
It is not transactional; a failure aborts the run where it stands.

## Usage

```no_run
use jenkins_backup_core::{BackupEngine, BackupOptions, OverwritePolicy, ServerConfig};

let config = ServerConfig::new("jenkins.example.com", "admin", "secret");
let engine = BackupEngine::connect(&config)?;

// Snapshot the server into ./jenkins-<timestamp>.tar.gz
let archive = engine.backup(&BackupOptions::default())?;

// Replay it; existing items are skipped unless overwrite is enabled
let report = engine.restore(&archive, OverwritePolicy::default())?;
println!("applied {}, skipped {}", report.applied(), report.skipped());
# Ok::<(), jenkins_backup_core::BackupError>(())
```
*/

pub mod archive;
pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod metadata;
pub mod restore;
pub mod store;
pub mod views;

pub use config::ServerConfig;
pub use engine::{inspect_archive, BackupEngine, BackupOptions};
pub use error::{BackupError, Result};
pub use gateway::{Gateway, HttpGateway, ViewCreateSpec};
pub use metadata::{JobManifest, Snapshot, ViewRecord, DEFAULT_VIEW};
pub use restore::{ItemOutcome, Outcome, OverwritePolicy, RestoreReport};
pub use store::{DocKind, DocumentStore};

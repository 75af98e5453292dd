/*!
Snapshot model and its YAML serialization.

A [`Snapshot`] is the replayable description of one server's configuration
state: the ordered job listing plus a reconstruction recipe per view. It is
built once per backup, immutable afterwards, and round-trips through the
`metadata.yml` archive entry unchanged.
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Name of the implicit default view every Jenkins server provides.
///
/// It is never captured into a snapshot and never created on restore.
pub const DEFAULT_VIEW: &str = "All";

/// Version of this tool, recorded in every snapshot for audit purposes.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The unit of backup and restore.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Capture instant; also drives the archive file name
    pub timestamp: DateTime<Utc>,

    /// User the capture ran as (informational, not validated on restore)
    pub created_by: String,

    /// Server the capture ran against (informational)
    pub server_address: String,

    /// Port the capture ran against (informational)
    pub server_port: u16,

    /// Tool version that produced the snapshot (informational)
    pub tool_version: String,

    /// Ordered job listing as the server returned it at capture time
    pub jobs: JobManifest,

    /// Reconstruction recipe per non-default view
    pub views: Vec<ViewRecord>,
}

/// Job names in server listing order.
///
/// The count is redundant with the list length but persisted anyway so a
/// partial reader can learn the total without the full list.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct JobManifest {
    pub count: usize,
    pub names: Vec<String>,
}

impl JobManifest {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            count: names.len(),
            names,
        }
    }
}

/// Everything needed to recreate one view on a target server.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ViewRecord {
    /// View name, unique within a snapshot
    pub name: String,

    /// `<filterQueue>` attribute; `None` when the server's document omits the
    /// tag, so the target can apply its own default on restore
    pub filter_queue: Option<String>,

    /// `<filterExecutors>` attribute, same absence semantics
    pub filter_executors: Option<String>,

    /// `<includeRegex>` inclusion pattern; the target server auto-populates
    /// members matching it once the view is created
    pub regex: Option<String>,

    /// Members not implied by the regex, frozen at capture time. These are
    /// the ones that must be added manually on restore.
    pub explicit_jobs: Vec<String>,
}

impl Snapshot {
    /// Start a snapshot with the given provenance, captured now.
    pub fn new<C, A>(created_by: C, server_address: A, server_port: u16) -> Self
    where
        C: Into<String>,
        A: Into<String>,
    {
        Self {
            timestamp: Utc::now(),
            created_by: created_by.into(),
            server_address: server_address.into(),
            server_port,
            tool_version: TOOL_VERSION.to_string(),
            jobs: JobManifest::default(),
            views: Vec::new(),
        }
    }

    /// Serialize to the archive's metadata format. Field order follows the
    /// struct declaration, so the output is stable across runs.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Inverse of [`Snapshot::to_yaml`].
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// File name the archive for this snapshot is published under.
    pub fn archive_file_name(&self, base_name: &str) -> String {
        format!("{base_name}-{}.tar.gz", self.timestamp.timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new("admin", "jenkins.example.com", 8080);
        snapshot.jobs = JobManifest::new(vec!["build".to_string(), "deploy".to_string()]);
        snapshot.views.push(ViewRecord {
            name: "releases".to_string(),
            filter_queue: Some("true".to_string()),
            filter_executors: None,
            regex: Some("^dep".to_string()),
            explicit_jobs: vec!["build".to_string()],
        });
        snapshot
    }

    #[test]
    fn test_yaml_roundtrip() {
        let snapshot = sample_snapshot();
        let yaml = snapshot.to_yaml().unwrap();
        let restored = Snapshot::from_yaml(&yaml).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_yaml_is_stable() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.to_yaml().unwrap(), snapshot.to_yaml().unwrap());
    }

    #[test]
    fn test_absent_attributes_stay_absent() {
        let snapshot = sample_snapshot();
        let yaml = snapshot.to_yaml().unwrap();
        let restored = Snapshot::from_yaml(&yaml).unwrap();

        // filter_executors was never present in the view's document; it must
        // come back as None, not as an empty or false value.
        assert_eq!(restored.views[0].filter_executors, None);
        assert_eq!(restored.views[0].filter_queue.as_deref(), Some("true"));
    }

    #[test]
    fn test_job_manifest_count_matches_names() {
        let manifest = JobManifest::new(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(manifest.count, 3);
    }

    #[test]
    fn test_archive_file_name() {
        let snapshot = sample_snapshot();
        let name = snapshot.archive_file_name("jenkins");
        assert!(name.starts_with("jenkins-"));
        assert!(name.ends_with(".tar.gz"));
        assert!(name.contains(&snapshot.timestamp.timestamp().to_string()));
    }
}

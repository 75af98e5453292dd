/*!
Replays a snapshot against a target server under an overwrite policy.

Jobs are fully restored before any view is touched, so a view's include
regex finds its matching jobs already present when the target evaluates it.
Restore is not transactional: the first gateway failure aborts the run and
leaves the target in whatever partially-restored state it reached. Operators
re-run with overwrite enabled to converge.
*/

use tracing::info;

use crate::gateway::{Gateway, ViewCreateSpec};
use crate::metadata::{Snapshot, DEFAULT_VIEW};
use crate::store::{DocKind, DocumentStore};
use crate::{BackupError, Result};

/// Which existing items a restore is allowed to replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverwritePolicy {
    pub jobs: bool,
    pub views: bool,
}

/// Terminal state of one job or view during restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Did not exist on the target; created from the snapshot
    Created,
    /// Existed and overwrite was enabled; deleted then recreated
    Replaced,
    /// Existed and overwrite was disabled; left untouched
    Skipped,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::Replaced => write!(f, "replaced"),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Outcome of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub kind: DocKind,
    pub name: String,
    pub outcome: Outcome,
}

/// What a restore run did, item by item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    pub items: Vec<ItemOutcome>,
    pub memberships_added: usize,
}

impl RestoreReport {
    /// Items created or replaced.
    pub fn applied(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.outcome != Outcome::Skipped)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.outcome == Outcome::Skipped)
            .count()
    }

    fn record(&mut self, kind: DocKind, name: &str, outcome: Outcome) {
        self.items.push(ItemOutcome {
            kind,
            name: name.to_string(),
            outcome,
        });
    }
}

/// Replays a snapshot through a gateway.
pub struct Reconciler<'a, G: Gateway> {
    gateway: &'a G,
}

impl<'a, G: Gateway> Reconciler<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    pub fn restore(
        &self,
        snapshot: &Snapshot,
        store: &DocumentStore,
        policy: OverwritePolicy,
    ) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();
        self.restore_jobs(snapshot, store, policy, &mut report)?;
        self.restore_views(snapshot, policy, &mut report)?;
        info!(
            applied = report.applied(),
            skipped = report.skipped(),
            memberships = report.memberships_added,
            "restore complete"
        );
        Ok(report)
    }

    fn restore_jobs(
        &self,
        snapshot: &Snapshot,
        store: &DocumentStore,
        policy: OverwritePolicy,
        report: &mut RestoreReport,
    ) -> Result<()> {
        // Existence is checked against one listing taken up front, not
        // re-queried per item.
        let current = self.gateway.list_jobs()?;
        for job in &snapshot.jobs.names {
            let exists = current.iter().any(|j| j == job);
            if exists && !policy.jobs {
                info!(job = job.as_str(), "job already exists, skipping");
                report.record(DocKind::Job, job, Outcome::Skipped);
                continue;
            }

            let document = store.get(DocKind::Job, job).ok_or_else(|| {
                BackupError::archive_corrupt(format!("missing document for job '{job}'"))
            })?;
            if exists {
                info!(job = job.as_str(), "removing existing job before recreating");
                self.gateway.delete_job(job)?;
            }
            info!(job = job.as_str(), "creating job");
            self.gateway.create_job(job, document)?;
            report.record(
                DocKind::Job,
                job,
                if exists { Outcome::Replaced } else { Outcome::Created },
            );
        }
        Ok(())
    }

    fn restore_views(
        &self,
        snapshot: &Snapshot,
        policy: OverwritePolicy,
        report: &mut RestoreReport,
    ) -> Result<()> {
        let current = self.gateway.list_views()?;
        for view in &snapshot.views {
            // Never touched, even if a snapshot somehow carries it.
            if view.name == DEFAULT_VIEW {
                continue;
            }

            let exists = current.iter().any(|v| v == &view.name);
            if exists && !policy.views {
                info!(view = view.name.as_str(), "view already exists, skipping");
                report.record(DocKind::View, &view.name, Outcome::Skipped);
                continue;
            }

            if exists {
                info!(
                    view = view.name.as_str(),
                    "removing existing view before recreating"
                );
                self.gateway.delete_view(&view.name)?;
            }
            info!(view = view.name.as_str(), "creating view");
            self.gateway.create_view(&ViewCreateSpec::from(view))?;

            // Regex-matched members are left to the server; only the
            // explicitly-added ones are replayed, in stored order.
            for job in &view.explicit_jobs {
                info!(
                    view = view.name.as_str(),
                    job = job.as_str(),
                    "adding job to view"
                );
                self.gateway.add_job_to_view(&view.name, job)?;
                report.memberships_added += 1;
            }
            report.record(
                DocKind::View,
                &view.name,
                if exists { Outcome::Replaced } else { Outcome::Created },
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;
    use crate::metadata::{JobManifest, ViewRecord};
    use mockall::Sequence;

    fn scenario_snapshot() -> (Snapshot, DocumentStore) {
        let mut snapshot = Snapshot::new("admin", "jenkins.example.com", 8080);
        snapshot.jobs = JobManifest::new(vec!["build".to_string(), "deploy".to_string()]);
        snapshot.views.push(ViewRecord {
            name: "releases".to_string(),
            filter_queue: None,
            filter_executors: None,
            regex: Some("^dep".to_string()),
            explicit_jobs: vec!["build".to_string()],
        });

        let mut store = DocumentStore::new();
        store.insert(DocKind::Job, "build", "<project>build</project>");
        store.insert(DocKind::Job, "deploy", "<project>deploy</project>");
        store.insert(DocKind::View, "releases", "<hudson.model.ListView/>");
        (snapshot, store)
    }

    #[test]
    fn test_restore_onto_empty_target() {
        let (snapshot, store) = scenario_snapshot();
        let mut gateway = MockGateway::new();
        let mut seq = Sequence::new();

        gateway.expect_list_jobs().times(1).returning(|| Ok(vec![]));
        // Both job creates happen before any view operation.
        gateway
            .expect_create_job()
            .withf(|name, _| name == "build")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        gateway
            .expect_create_job()
            .withf(|name, _| name == "deploy")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        gateway.expect_list_views().times(1).returning(|| Ok(vec!["All".to_string()]));
        gateway
            .expect_create_view()
            .withf(|spec| spec.name == "releases" && spec.regex.as_deref() == Some("^dep"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        // Only the explicit member is added; deploy is the regex's problem.
        gateway
            .expect_add_job_to_view()
            .withf(|view, job| view == "releases" && job == "build")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let report = Reconciler::new(&gateway)
            .restore(&snapshot, &store, OverwritePolicy::default())
            .unwrap();

        assert_eq!(report.applied(), 3);
        assert_eq!(report.skipped(), 0);
        assert_eq!(report.memberships_added, 1);
    }

    #[test]
    fn test_existing_items_are_skipped_without_overwrite() {
        let (snapshot, store) = scenario_snapshot();
        let mut gateway = MockGateway::new();

        gateway
            .expect_list_jobs()
            .returning(|| Ok(vec!["build".to_string(), "deploy".to_string()]));
        gateway
            .expect_list_views()
            .returning(|| Ok(vec!["All".to_string(), "releases".to_string()]));
        // No create/delete/add expectations: any such call fails the test.

        let report = Reconciler::new(&gateway)
            .restore(&snapshot, &store, OverwritePolicy::default())
            .unwrap();

        assert_eq!(report.applied(), 0);
        assert_eq!(report.skipped(), 3);
        assert_eq!(report.memberships_added, 0);
        assert!(report.items.iter().all(|i| i.outcome == Outcome::Skipped));
    }

    #[test]
    fn test_overwrite_deletes_then_recreates() {
        let (snapshot, store) = scenario_snapshot();
        let mut gateway = MockGateway::new();
        let mut seq = Sequence::new();

        gateway
            .expect_list_jobs()
            .returning(|| Ok(vec!["build".to_string()]));
        gateway
            .expect_delete_job()
            .withf(|name| name == "build")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        gateway
            .expect_create_job()
            .withf(|name, xml| name == "build" && xml == "<project>build</project>")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        // deploy does not exist: created without a preceding delete.
        gateway
            .expect_create_job()
            .withf(|name, _| name == "deploy")
            .times(1)
            .returning(|_, _| Ok(()));
        gateway
            .expect_list_views()
            .returning(|| Ok(vec!["releases".to_string()]));
        gateway
            .expect_delete_view()
            .withf(|name| name == "releases")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        gateway
            .expect_create_view()
            .withf(|spec| spec.name == "releases")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        gateway
            .expect_add_job_to_view()
            .returning(|_, _| Ok(()));

        let report = Reconciler::new(&gateway)
            .restore(
                &snapshot,
                &store,
                OverwritePolicy {
                    jobs: true,
                    views: true,
                },
            )
            .unwrap();

        assert_eq!(report.applied(), 3);
        let build = report.items.iter().find(|i| i.name == "build").unwrap();
        assert_eq!(build.outcome, Outcome::Replaced);
        let deploy = report.items.iter().find(|i| i.name == "deploy").unwrap();
        assert_eq!(deploy.outcome, Outcome::Created);
    }

    #[test]
    fn test_skipped_view_gets_no_membership_additions() {
        let (snapshot, store) = scenario_snapshot();
        let mut gateway = MockGateway::new();

        gateway.expect_list_jobs().returning(|| Ok(vec![]));
        gateway
            .expect_create_job()
            .times(2)
            .returning(|_, _| Ok(()));
        gateway
            .expect_list_views()
            .returning(|| Ok(vec!["releases".to_string()]));
        // add_job_to_view not expected: skipped views keep their members.

        let report = Reconciler::new(&gateway)
            .restore(&snapshot, &store, OverwritePolicy::default())
            .unwrap();

        assert_eq!(report.memberships_added, 0);
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn test_default_view_is_never_created() {
        let (mut snapshot, store) = scenario_snapshot();
        snapshot.views.push(ViewRecord {
            name: DEFAULT_VIEW.to_string(),
            ..ViewRecord::default()
        });
        let mut gateway = MockGateway::new();

        gateway.expect_list_jobs().returning(|| Ok(vec![]));
        gateway
            .expect_create_job()
            .times(2)
            .returning(|_, _| Ok(()));
        gateway.expect_list_views().returning(|| Ok(vec![]));
        gateway
            .expect_create_view()
            .withf(|spec| spec.name == "releases")
            .times(1)
            .returning(|_| Ok(()));
        gateway
            .expect_add_job_to_view()
            .returning(|_, _| Ok(()));

        let report = Reconciler::new(&gateway)
            .restore(&snapshot, &store, OverwritePolicy::default())
            .unwrap();

        assert!(report.items.iter().all(|i| i.name != DEFAULT_VIEW));
    }

    #[test]
    fn test_create_failure_aborts_restore() {
        let (snapshot, store) = scenario_snapshot();
        let mut gateway = MockGateway::new();

        gateway.expect_list_jobs().returning(|| Ok(vec![]));
        gateway
            .expect_create_job()
            .withf(|name, _| name == "build")
            .returning(|name, _| {
                Err(BackupError::create_failed(
                    DocKind::Job,
                    name,
                    "server returned 500",
                ))
            });
        // Nothing after the failing create may run.

        let result = Reconciler::new(&gateway).restore(&snapshot, &store, OverwritePolicy::default());
        assert!(matches!(result, Err(BackupError::ItemCreateFailed { .. })));
    }
}

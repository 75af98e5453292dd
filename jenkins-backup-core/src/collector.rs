/*!
Walks a live server and derives a replayable snapshot from it.
*/

use tracing::{debug, info};

use crate::gateway::Gateway;
use crate::metadata::{JobManifest, Snapshot, ViewRecord, DEFAULT_VIEW};
use crate::store::{DocKind, DocumentStore};
use crate::views::{self, ViewAttributes};
use crate::Result;

/// Captures the configuration state of a live server.
///
/// Collection is fail-fast: any per-item fetch error aborts the whole walk,
/// since a partial snapshot is worse than no snapshot. The walk only reads;
/// server state is never mutated.
pub struct Collector<'a, G: Gateway> {
    gateway: &'a G,
}

impl<'a, G: Gateway> Collector<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Produce a snapshot plus the raw documents backing it.
    ///
    /// Jobs keep the server's listing order. The default view is never
    /// captured. Each view's explicit member set is computed here, once,
    /// from the membership and regex as they are right now.
    pub fn collect(
        &self,
        created_by: &str,
        server_address: &str,
        server_port: u16,
    ) -> Result<(Snapshot, DocumentStore)> {
        let mut snapshot = Snapshot::new(created_by, server_address, server_port);
        let mut store = DocumentStore::new();

        let jobs = self.gateway.list_jobs()?;
        info!(count = jobs.len(), "collecting job configurations");
        for job in &jobs {
            debug!(job = job.as_str(), "obtaining configuration");
            let xml = self.gateway.job_config(job)?;
            store.insert(DocKind::Job, job.as_str(), xml);
        }
        snapshot.jobs = JobManifest::new(jobs);

        for view in self.gateway.list_views()? {
            if view == DEFAULT_VIEW {
                continue;
            }
            debug!(view = view.as_str(), "obtaining configuration");
            let xml = self.gateway.view_config(&view)?;
            let members = self.gateway.view_jobs(&view)?;

            let attrs = ViewAttributes::from_config_xml(&xml);
            let explicit = views::explicit_jobs(&members, attrs.regex.as_deref())?;

            store.insert(DocKind::View, view.as_str(), xml);
            snapshot.views.push(ViewRecord {
                name: view,
                filter_queue: attrs.filter_queue,
                filter_executors: attrs.filter_executors,
                regex: attrs.regex,
                explicit_jobs: explicit,
            });
        }

        info!(
            jobs = snapshot.jobs.count,
            views = snapshot.views.len(),
            "collection complete"
        );
        Ok((snapshot, store))
    }
}

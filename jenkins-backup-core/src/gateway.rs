/*!
Capability interface for job/view CRUD against one Jenkins instance, plus the
HTTP adapter that implements it over the remote access API.

The backup and restore engines only ever talk to a [`Gateway`]; tests swap in
mocks, production uses [`HttpGateway`].
*/

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::config::ServerConfig;
use crate::metadata::ViewRecord;
use crate::store::DocKind;
use crate::{BackupError, Result};

/// Everything the snapshot and restore engines need from a Jenkins server.
#[cfg_attr(test, mockall::automock)]
pub trait Gateway {
    /// All job names, in the server's listing order.
    fn list_jobs(&self) -> Result<Vec<String>>;

    /// Raw `config.xml` of one job.
    fn job_config(&self, name: &str) -> Result<String>;

    /// Create a job from a raw configuration document.
    fn create_job(&self, name: &str, config_xml: &str) -> Result<()>;

    fn delete_job(&self, name: &str) -> Result<()>;

    /// All view names, in the server's listing order (includes the default
    /// view; callers are responsible for skipping it).
    fn list_views(&self) -> Result<Vec<String>>;

    /// Raw `config.xml` of one view.
    fn view_config(&self, name: &str) -> Result<String>;

    /// Names of the jobs currently shown in one view.
    fn view_jobs(&self, name: &str) -> Result<Vec<String>>;

    /// Create a list view with the given attributes.
    fn create_view(&self, spec: &ViewCreateSpec) -> Result<()>;

    fn delete_view(&self, name: &str) -> Result<()>;

    /// Add one job to a view's explicit member list.
    fn add_job_to_view(&self, view: &str, job: &str) -> Result<()>;
}

/// Parameters for creating a list view.
///
/// Absent attributes are not sent at all, so the server picks its own
/// defaults for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewCreateSpec {
    pub name: String,
    pub filter_queue: Option<String>,
    pub filter_executors: Option<String>,
    pub regex: Option<String>,
}

impl From<&ViewRecord> for ViewCreateSpec {
    fn from(record: &ViewRecord) -> Self {
        Self {
            name: record.name.clone(),
            filter_queue: record.filter_queue.clone(),
            filter_executors: record.filter_executors.clone(),
            regex: record.regex.clone(),
        }
    }
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize, Default)]
struct ApiListing {
    #[serde(default)]
    jobs: Vec<Named>,
    #[serde(default)]
    views: Vec<Named>,
}

/// Gateway adapter speaking the Jenkins HTTP remote access API with basic
/// auth.
pub struct HttpGateway {
    client: Client,
    base: Url,
    username: String,
    password: String,
}

impl HttpGateway {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url())
            .map_err(|e| BackupError::config(format!("invalid server address: {e}")))?;
        Ok(Self {
            client: Client::new(),
            base,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .map_err(|e| BackupError::gateway_unavailable(e.to_string()))
    }

    fn member_add_url(&self, view: &str, job: &str) -> Url {
        let mut url = self.endpoint(&["view", view, "addJobToView"]);
        url.query_pairs_mut().append_pair("name", job);
        url
    }

    /// Shared `/api/json` listing of top-level jobs and views.
    fn listing(&self) -> Result<ApiListing> {
        let mut url = self.endpoint(&["api", "json"]);
        url.set_query(Some("tree=jobs[name],views[name]"));
        let response = self.send(self.client.get(url))?;
        if !response.status().is_success() {
            return Err(BackupError::gateway_unavailable(format!(
                "listing request returned {}",
                response.status()
            )));
        }
        response
            .json()
            .map_err(|e| BackupError::gateway_unavailable(format!("unparsable listing: {e}")))
    }
}

fn status_reason(response: &Response) -> String {
    format!("server returned {}", response.status())
}

impl Gateway for HttpGateway {
    fn list_jobs(&self) -> Result<Vec<String>> {
        Ok(self.listing()?.jobs.into_iter().map(|j| j.name).collect())
    }

    fn job_config(&self, name: &str) -> Result<String> {
        debug!(job = name, "fetching job configuration");
        let url = self.endpoint(&["job", name, "config.xml"]);
        let response = self.send(self.client.get(url))?;
        if !response.status().is_success() {
            return Err(BackupError::fetch_failed(
                DocKind::Job,
                name,
                status_reason(&response),
            ));
        }
        response
            .text()
            .map_err(|e| BackupError::fetch_failed(DocKind::Job, name, e.to_string()))
    }

    fn create_job(&self, name: &str, config_xml: &str) -> Result<()> {
        let mut url = self.endpoint(&["createItem"]);
        url.query_pairs_mut().append_pair("name", name);
        let response = self.send(
            self.client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/xml")
                .body(config_xml.to_string()),
        )?;
        if !response.status().is_success() {
            return Err(BackupError::create_failed(
                DocKind::Job,
                name,
                status_reason(&response),
            ));
        }
        Ok(())
    }

    fn delete_job(&self, name: &str) -> Result<()> {
        let url = self.endpoint(&["job", name, "doDelete"]);
        let response = self.send(self.client.post(url))?;
        if !response.status().is_success() {
            return Err(BackupError::delete_failed(
                DocKind::Job,
                name,
                status_reason(&response),
            ));
        }
        Ok(())
    }

    fn list_views(&self) -> Result<Vec<String>> {
        Ok(self.listing()?.views.into_iter().map(|v| v.name).collect())
    }

    fn view_config(&self, name: &str) -> Result<String> {
        debug!(view = name, "fetching view configuration");
        let url = self.endpoint(&["view", name, "config.xml"]);
        let response = self.send(self.client.get(url))?;
        if !response.status().is_success() {
            return Err(BackupError::fetch_failed(
                DocKind::View,
                name,
                status_reason(&response),
            ));
        }
        response
            .text()
            .map_err(|e| BackupError::fetch_failed(DocKind::View, name, e.to_string()))
    }

    fn view_jobs(&self, name: &str) -> Result<Vec<String>> {
        let mut url = self.endpoint(&["view", name, "api", "json"]);
        url.set_query(Some("tree=jobs[name]"));
        let response = self.send(self.client.get(url))?;
        if !response.status().is_success() {
            return Err(BackupError::fetch_failed(
                DocKind::View,
                name,
                status_reason(&response),
            ));
        }
        let listing: ApiListing = response
            .json()
            .map_err(|e| BackupError::fetch_failed(DocKind::View, name, e.to_string()))?;
        Ok(listing.jobs.into_iter().map(|j| j.name).collect())
    }

    fn create_view(&self, spec: &ViewCreateSpec) -> Result<()> {
        let mut url = self.endpoint(&["createView"]);
        url.query_pairs_mut().append_pair("name", &spec.name);

        // Only attributes present in the snapshot are sent; the server
        // defaults the rest.
        let mut payload = serde_json::json!({
            "name": spec.name,
            "mode": "hudson.model.ListView",
        });
        if let Some(value) = &spec.filter_queue {
            payload["filterQueue"] = serde_json::json!(value);
        }
        if let Some(value) = &spec.filter_executors {
            payload["filterExecutors"] = serde_json::json!(value);
        }
        if let Some(value) = &spec.regex {
            payload["includeRegex"] = serde_json::json!(value);
        }
        let payload = payload.to_string();

        // Stapler reads `name` and `mode` from the flat form fields and the
        // rest of the configuration from the mirrored `json` parameter, so
        // both representations have to be sent.
        let form: Vec<(&str, &str)> = vec![
            ("name", spec.name.as_str()),
            ("mode", "hudson.model.ListView"),
            ("json", payload.as_str()),
        ];
        let response = self.send(self.client.post(url).form(&form))?;
        if !response.status().is_success() {
            return Err(BackupError::create_failed(
                DocKind::View,
                &spec.name,
                status_reason(&response),
            ));
        }
        Ok(())
    }

    fn delete_view(&self, name: &str) -> Result<()> {
        let url = self.endpoint(&["view", name, "doDelete"]);
        let response = self.send(self.client.post(url))?;
        if !response.status().is_success() {
            return Err(BackupError::delete_failed(
                DocKind::View,
                name,
                status_reason(&response),
            ));
        }
        Ok(())
    }

    fn add_job_to_view(&self, view: &str, job: &str) -> Result<()> {
        let url = self.member_add_url(view, job);
        let response = self.send(self.client.post(url))?;
        if !response.status().is_success() {
            return Err(BackupError::create_failed(
                DocKind::View,
                view,
                format!("could not add job '{job}': {}", status_reason(&response)),
            ));
        }
        Ok(())
    }
}

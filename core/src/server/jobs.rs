//! Workspace execution: the transformation job API and the data services.

use serde_json::Value;

use super::FmeServer;
use crate::error::Result;
use crate::http::{segment, HttpMethod, HttpRequest, Payload};

impl FmeServer {
    /// Queue a job. `params` is the JSON job request, e.g.
    /// `{"publishedParameters": [{"name": "MAX", "value": 3}]}`.
    pub fn build_submit_job(&self, repository: &str, workspace: &str, params: &Value) -> Result<HttpRequest> {
        self.job_request("submit", repository, workspace, params)
    }

    /// Run a job and wait for its outcome on the server side.
    pub fn build_transact_job(&self, repository: &str, workspace: &str, params: &Value) -> Result<HttpRequest> {
        self.job_request("transact", repository, workspace, params)
    }

    pub fn build_job(&self, id: u64) -> HttpRequest {
        let url = self.rest_url(&format!("transformations/jobs/id/{id}"), &[]);
        self.request(HttpMethod::Get, url)
    }

    pub fn build_job_result(&self, id: u64) -> HttpRequest {
        let url = self.rest_url(&format!("transformations/jobs/id/{id}/result"), &[]);
        self.request(HttpMethod::Get, url)
    }

    pub fn build_cancel_job(&self, id: u64) -> HttpRequest {
        let url = self.rest_url(&format!("transformations/jobs/running/{id}"), &[]);
        self.request(HttpMethod::Delete, url)
    }

    /// Run a workspace through the Data Download service. The service is
    /// asked to answer in the configured format instead of redirecting.
    pub fn build_run_data_download(&self, repository: &str, workspace: &str, params: &[(&str, &str)]) -> HttpRequest {
        let format = self.config.format.as_str();
        let mut pairs = params.to_vec();
        pairs.push(("opt_responseformat", format));
        pairs.push(("opt_showresult", "false"));
        pairs.push(("token", self.config.token.as_str()));
        let url = self.service_url("fmedatadownload", &workspace_path(repository, workspace));
        self.request(HttpMethod::Post, url).payload(Payload::form(&pairs))
    }

    /// Run a workspace through the Data Streaming service; the response is
    /// whatever the workspace writes.
    pub fn build_run_data_streaming(&self, repository: &str, workspace: &str, params: &[(&str, &str)]) -> HttpRequest {
        let mut pairs = params.to_vec();
        pairs.push(("token", self.config.token.as_str()));
        let url = self.service_url("fmedatastreaming", &workspace_path(repository, workspace));
        self.request(HttpMethod::Post, url)
            .accept("*/*")
            .payload(Payload::form(&pairs))
    }

    fn job_request(&self, kind: &str, repository: &str, workspace: &str, params: &Value) -> Result<HttpRequest> {
        let url = self.rest_url(
            &format!("transformations/{kind}/{}", workspace_path(repository, workspace)),
            &[],
        );
        Ok(self.request(HttpMethod::Post, url).payload(Payload::json(params)?))
    }

    try_dispatch_methods! {
        /// The response carries the queued job's `id`.
        submit_job => build_submit_job(repository: &str, workspace: &str, params: &Value);
        transact_job => build_transact_job(repository: &str, workspace: &str, params: &Value);
    }

    dispatch_methods! {
        job => build_job(id: u64);
        job_result => build_job_result(id: u64);
        cancel_job => build_cancel_job(id: u64);
        run_data_download => build_run_data_download(repository: &str, workspace: &str, params: &[(&str, &str)]);
        run_data_streaming => build_run_data_streaming(repository: &str, workspace: &str, params: &[(&str, &str)]);
    }
}

pub(super) fn workspace_path(repository: &str, workspace: &str) -> String {
    format!("{}/{}", segment(repository), segment(workspace))
}

#[cfg(test)]
mod tests {
    use super::super::tests::server;
    use crate::http::{HttpMethod, Payload, FORM_URLENCODED, JSON};
    use serde_json::json;

    #[test]
    fn submit_job_posts_json_body() {
        let req = server()
            .build_submit_job("Samples", "austinApartments.fmw", &json!({"a": 1}))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.url,
            "http://example.org/fmerest/v2/transformations/submit/Samples/austinApartments.fmw?fmetoken=T1"
        );
        assert_eq!(req.header_value("content-type"), Some(JSON));
        assert_eq!(req.body, Some(Payload::Json(r#"{"a":1}"#.to_string())));
    }

    #[test]
    fn transact_job_uses_transact_path() {
        let req = server().build_transact_job("Samples", "a.fmw", &json!({})).unwrap();
        assert!(req
            .url
            .starts_with("http://example.org/fmerest/v2/transformations/transact/Samples/a.fmw?"));
    }

    #[test]
    fn job_status_result_and_cancel() {
        let s = server();
        assert_eq!(
            s.build_job(42).url,
            "http://example.org/fmerest/v2/transformations/jobs/id/42?fmetoken=T1"
        );
        assert!(s.build_job_result(42).url.contains("/transformations/jobs/id/42/result?"));
        let cancel = s.build_cancel_job(42);
        assert_eq!(cancel.method, HttpMethod::Delete);
        assert!(cancel.url.contains("/transformations/jobs/running/42?"));
    }

    #[test]
    fn data_download_posts_form_with_service_options() {
        let req = server().build_run_data_download("Samples", "a b.fmw", &[("COORDSYS", "LL84")]);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://example.org/fmedatadownload/Samples/a%20b.fmw");
        assert_eq!(req.header_value("content-type"), Some(FORM_URLENCODED));
        assert_eq!(
            req.body,
            Some(Payload::Form(
                "COORDSYS=LL84&opt_responseformat=json&opt_showresult=false&token=T1".to_string()
            ))
        );
    }

    #[test]
    fn data_streaming_accepts_any_content() {
        let req = server().build_run_data_streaming("Samples", "a.fmw", &[]);
        assert_eq!(req.url, "http://example.org/fmedatastreaming/Samples/a.fmw");
        assert_eq!(req.header_value("accept"), Some("*/*"));
        assert_eq!(req.body, Some(Payload::Form("token=T1".to_string())));
    }
}

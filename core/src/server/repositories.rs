//! Repository and workspace introspection.

use super::FmeServer;
use crate::http::{segment, HttpMethod, HttpRequest};

impl FmeServer {
    pub fn build_repositories(&self) -> HttpRequest {
        let url = self.rest_url("repositories", &[("detail", self.detail())]);
        self.request(HttpMethod::Get, url)
    }

    pub fn build_repository(&self, repository: &str) -> HttpRequest {
        let url = self.rest_url(&format!("repositories/{}", segment(repository)), &[]);
        self.request(HttpMethod::Get, url)
    }

    /// Items of a repository, optionally filtered by item type
    /// (`WORKSPACE`, `CUSTOM_FORMAT`, `TEMPLATE`, ...).
    pub fn build_repository_items(&self, repository: &str, item_type: Option<&str>) -> HttpRequest {
        let mut params = vec![("detail", self.detail())];
        if let Some(item_type) = item_type {
            params.push(("type", item_type));
        }
        let url = self.rest_url(&format!("repositories/{}/items", segment(repository)), &params);
        self.request(HttpMethod::Get, url)
    }

    pub fn build_workspace(&self, repository: &str, workspace: &str) -> HttpRequest {
        let url = self.rest_url(
            &format!("repositories/{}/items/{}", segment(repository), segment(workspace)),
            &[("detail", self.detail())],
        );
        self.request(HttpMethod::Get, url)
    }

    pub fn build_workspace_parameters(&self, repository: &str, workspace: &str) -> HttpRequest {
        let url = self.rest_url(
            &format!(
                "repositories/{}/items/{}/parameters",
                segment(repository),
                segment(workspace)
            ),
            &[],
        );
        self.request(HttpMethod::Get, url)
    }

    pub fn build_workspace_parameter(&self, repository: &str, workspace: &str, parameter: &str) -> HttpRequest {
        let url = self.rest_url(
            &format!(
                "repositories/{}/items/{}/parameters/{}",
                segment(repository),
                segment(workspace),
                segment(parameter)
            ),
            &[],
        );
        self.request(HttpMethod::Get, url)
    }

    /// Build, version and license information about the server.
    pub fn build_server_info(&self) -> HttpRequest {
        let url = self.rest_url("info", &[]);
        self.request(HttpMethod::Get, url)
    }

    dispatch_methods! {
        /// List all repositories.
        repositories => build_repositories();
        repository => build_repository(repository: &str);
        repository_items => build_repository_items(repository: &str, item_type: Option<&str>);
        workspace => build_workspace(repository: &str, workspace: &str);
        /// Published parameters of a workspace.
        workspace_parameters => build_workspace_parameters(repository: &str, workspace: &str);
        workspace_parameter => build_workspace_parameter(repository: &str, workspace: &str, parameter: &str);
        server_info => build_server_info();
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::server;
    use crate::http::HttpMethod;

    #[test]
    fn repositories_lists_with_detail_and_token() {
        let req = server().build_repositories();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://example.org/fmerest/v2/repositories?detail=high&fmetoken=T1"
        );
        assert!(req.body.is_none());
        assert_eq!(req.header_value("accept"), Some("application/json"));
    }

    #[test]
    fn repository_items_filters_by_type() {
        let s = server();
        assert_eq!(
            s.build_repository_items("Samples", Some("WORKSPACE")).url,
            "http://example.org/fmerest/v2/repositories/Samples/items?detail=high&type=WORKSPACE&fmetoken=T1"
        );
        assert_eq!(
            s.build_repository_items("Samples", None).url,
            "http://example.org/fmerest/v2/repositories/Samples/items?detail=high&fmetoken=T1"
        );
    }

    #[test]
    fn workspace_names_are_escaped() {
        let req = server().build_workspace_parameters("My Repo", "austin dl.fmw");
        assert_eq!(
            req.url,
            "http://example.org/fmerest/v2/repositories/My%20Repo/items/austin%20dl.fmw/parameters?fmetoken=T1"
        );
    }

    #[test]
    fn single_parameter_and_workspace_details() {
        let s = server();
        assert_eq!(
            s.build_workspace_parameter("Samples", "a.fmw", "FORMAT").url,
            "http://example.org/fmerest/v2/repositories/Samples/items/a.fmw/parameters/FORMAT?fmetoken=T1"
        );
        assert_eq!(
            s.build_workspace("Samples", "a.fmw").url,
            "http://example.org/fmerest/v2/repositories/Samples/items/a.fmw?detail=high&fmetoken=T1"
        );
        assert_eq!(s.build_server_info().url, "http://example.org/fmerest/v2/info?fmetoken=T1");
    }
}

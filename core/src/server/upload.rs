//! Data Upload service: upload sessions and file transfer into a session.

use bytes::Bytes;

use super::jobs::workspace_path;
use super::FmeServer;
use crate::http::{attachment, query, HttpMethod, HttpRequest, Payload};
use crate::response::Response;

impl FmeServer {
    /// Open an upload session for a workspace. The session id is in the
    /// response at `serviceResponse.session`; see [`session_id`].
    pub fn build_data_upload_session(&self, repository: &str, workspace: &str) -> HttpRequest {
        let url = self.service_url("fmedataupload", &workspace_path(repository, workspace));
        let body = Payload::form(&[
            ("opt_extractarchive", "false"),
            ("opt_pathlevel", "3"),
            ("opt_fullpath", "true"),
            ("token", self.config.token.as_str()),
        ]);
        self.request(HttpMethod::Post, url).payload(body)
    }

    /// Upload one file into an existing session.
    pub fn build_upload_file(
        &self,
        repository: &str,
        workspace: &str,
        session: &str,
        file_name: &str,
        contents: Bytes,
    ) -> HttpRequest {
        let url = format!(
            "{}?{}",
            self.service_url("fmedataupload", &workspace_path(repository, workspace)),
            query(&[
                ("opt_namespace", session),
                ("opt_fullpath", "true"),
                ("token", self.config.token.as_str()),
            ])
        );
        self.request(HttpMethod::Post, url)
            .header("content-disposition", attachment(file_name))
            .payload(Payload::Binary(contents))
    }

    dispatch_methods! {
        /// Pass the response to [`session_id`] to get the session.
        data_upload_session => build_data_upload_session(repository: &str, workspace: &str);
        upload_file => build_upload_file(repository: &str, workspace: &str, session: &str, file_name: &str, contents: Bytes);
    }
}

/// Session id from a data upload response, if present.
pub fn session_id(response: &Response) -> Option<String> {
    response
        .as_json()?
        .pointer("/serviceResponse/session")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::super::tests::server;
    use super::*;
    use crate::http::OCTET_STREAM;
    use serde_json::json;

    #[test]
    fn session_request_posts_upload_options() {
        let req = server().build_data_upload_session("Samples", "a.fmw");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://example.org/fmedataupload/Samples/a.fmw");
        assert_eq!(
            req.body,
            Some(Payload::Form(
                "opt_extractarchive=false&opt_pathlevel=3&opt_fullpath=true&token=T1".to_string()
            ))
        );
    }

    #[test]
    fn upload_file_sends_binary_attachment() {
        let req = server().build_upload_file("Samples", "a.fmw", "s-1", "in put.csv", Bytes::from_static(b"x,y"));
        assert_eq!(
            req.url,
            "http://example.org/fmedataupload/Samples/a.fmw?opt_namespace=s-1&opt_fullpath=true&token=T1"
        );
        assert_eq!(req.header_value("content-type"), Some(OCTET_STREAM));
        assert_eq!(
            req.header_value("content-disposition"),
            Some("attachment; filename=\"in put.csv\"")
        );
        assert_eq!(req.body, Some(Payload::Binary(Bytes::from_static(b"x,y"))));
    }

    #[test]
    fn session_id_reads_service_response() {
        let r = Response::Json(json!({"serviceResponse": {"session": "abc", "files": {}}}));
        assert_eq!(session_id(&r), Some("abc".to_string()));
        assert_eq!(session_id(&Response::Text("nope".into())), None);
        assert_eq!(session_id(&Response::Json(json!({}))), None);
    }
}

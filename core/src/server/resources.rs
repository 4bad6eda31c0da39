//! Shared resource files (`FME_SHAREDRESOURCE_DATA` and friends).

use bytes::Bytes;

use super::FmeServer;
use crate::http::{attachment, fs_path, segment, HttpMethod, HttpRequest, Payload, OCTET_STREAM};

/// How an upload treats existing files and missing directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub overwrite: bool,
    pub create_directories: bool,
}

impl FmeServer {
    pub fn build_resource_connections(&self) -> HttpRequest {
        let url = self.rest_url("resources/connections", &[]);
        self.request(HttpMethod::Get, url)
    }

    /// Directory listing or file details, `depth` levels deep.
    pub fn build_resource_details(&self, resource: &str, path: &str, depth: u32) -> HttpRequest {
        let depth = depth.to_string();
        let url = self.filesys_url(resource, path, &[("depth", depth.as_str()), ("detail", self.detail())]);
        self.request(HttpMethod::Get, url)
    }

    pub fn build_download_resource(&self, resource: &str, path: &str) -> HttpRequest {
        let url = self.filesys_url(resource, path, &[("accept", "contents")]);
        self.request(HttpMethod::Get, url).accept(OCTET_STREAM)
    }

    pub fn build_delete_resource(&self, resource: &str, path: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, self.filesys_url(resource, path, &[]))
    }

    /// Create directory `name` inside `path`.
    pub fn build_create_resource_directory(&self, resource: &str, path: &str, name: &str) -> HttpRequest {
        self.request(HttpMethod::Post, self.filesys_url(resource, path, &[]))
            .payload(Payload::form(&[("directoryname", name), ("type", "DIR")]))
    }

    /// Upload `contents` as `file_name` into directory `path`.
    pub fn build_upload_resource(
        &self,
        resource: &str,
        path: &str,
        file_name: &str,
        contents: Bytes,
        options: UploadOptions,
    ) -> HttpRequest {
        let url = self.filesys_url(
            resource,
            path,
            &[
                ("createDirectories", flag(options.create_directories)),
                ("overwrite", flag(options.overwrite)),
            ],
        );
        self.request(HttpMethod::Post, url)
            .header("content-disposition", attachment(file_name))
            .payload(Payload::Binary(contents))
    }

    fn filesys_url(&self, resource: &str, path: &str, params: &[(&str, &str)]) -> String {
        let path = fs_path(path);
        let location = if path.is_empty() {
            format!("resources/connections/{}/filesys", segment(resource))
        } else {
            format!("resources/connections/{}/filesys/{path}", segment(resource))
        };
        self.rest_url(&location, params)
    }

    dispatch_methods! {
        resource_connections => build_resource_connections();
        resource_details => build_resource_details(resource: &str, path: &str, depth: u32);
        /// The file contents arrive as `Response::Text` or `Response::Binary`
        /// (or `Json` when the file itself is JSON).
        download_resource => build_download_resource(resource: &str, path: &str);
        delete_resource => build_delete_resource(resource: &str, path: &str);
        create_resource_directory => build_create_resource_directory(resource: &str, path: &str, name: &str);
        upload_resource => build_upload_resource(resource: &str, path: &str, file_name: &str, contents: Bytes, options: UploadOptions);
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

//! Schedule management. Schedules are addressed by category and name.

use serde_json::Value;

use super::FmeServer;
use crate::error::Result;
use crate::http::{segment, HttpMethod, HttpRequest, Payload};

impl FmeServer {
    pub fn build_schedules(&self) -> HttpRequest {
        let url = self.rest_url("schedules", &[]);
        self.request(HttpMethod::Get, url)
    }

    pub fn build_schedule(&self, category: &str, name: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.schedule_url(category, name, ""))
    }

    pub fn build_create_schedule(&self, schedule: &Value) -> Result<HttpRequest> {
        let url = self.rest_url("schedules", &[]);
        Ok(self.request(HttpMethod::Post, url).payload(Payload::json(schedule)?))
    }

    pub fn build_replace_schedule(&self, category: &str, name: &str, schedule: &Value) -> Result<HttpRequest> {
        Ok(self
            .request(HttpMethod::Put, self.schedule_url(category, name, ""))
            .payload(Payload::json(schedule)?))
    }

    pub fn build_delete_schedule(&self, category: &str, name: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, self.schedule_url(category, name, ""))
    }

    pub fn build_set_schedule_enabled(&self, category: &str, name: &str, enabled: bool) -> HttpRequest {
        let value = if enabled { "true" } else { "false" };
        self.request(HttpMethod::Put, self.schedule_url(category, name, "/enabled"))
            .payload(Payload::form(&[("value", value)]))
    }

    fn schedule_url(&self, category: &str, name: &str, suffix: &str) -> String {
        self.rest_url(
            &format!("schedules/{}/{}{suffix}", segment(category), segment(name)),
            &[],
        )
    }

    dispatch_methods! {
        schedules => build_schedules();
        schedule => build_schedule(category: &str, name: &str);
        /// A 204 from the server arrives as `Response::Deleted`.
        delete_schedule => build_delete_schedule(category: &str, name: &str);
        set_schedule_enabled => build_set_schedule_enabled(category: &str, name: &str, enabled: bool);
    }

    try_dispatch_methods! {
        create_schedule => build_create_schedule(schedule: &Value);
        replace_schedule => build_replace_schedule(category: &str, name: &str, schedule: &Value);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::server;
    use crate::http::{HttpMethod, Payload, FORM_URLENCODED, JSON};
    use serde_json::json;

    #[test]
    fn schedule_crud_paths() {
        let s = server();
        assert_eq!(s.build_schedules().url, "http://example.org/fmerest/v2/schedules?fmetoken=T1");
        assert_eq!(
            s.build_schedule("Nightly", "clean up").url,
            "http://example.org/fmerest/v2/schedules/Nightly/clean%20up?fmetoken=T1"
        );
        let delete = s.build_delete_schedule("Nightly", "clean up");
        assert_eq!(delete.method, HttpMethod::Delete);
        assert!(delete.body.is_none());
    }

    #[test]
    fn create_and_replace_send_json() {
        let s = server();
        let schedule = json!({"category": "Nightly", "name": "n1", "enabled": true});
        let create = s.build_create_schedule(&schedule).unwrap();
        assert_eq!(create.method, HttpMethod::Post);
        assert_eq!(create.header_value("content-type"), Some(JSON));

        let replace = s.build_replace_schedule("Nightly", "n1", &schedule).unwrap();
        assert_eq!(replace.method, HttpMethod::Put);
        assert_eq!(
            replace.url,
            "http://example.org/fmerest/v2/schedules/Nightly/n1?fmetoken=T1"
        );
        let Some(Payload::Json(body)) = replace.body else {
            panic!("expected json body");
        };
        assert_eq!(serde_json::from_str::<serde_json::Value>(&body).unwrap(), schedule);
    }

    #[test]
    fn enabling_a_schedule_puts_a_form_value() {
        let req = server().build_set_schedule_enabled("Nightly", "n1", false);
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(
            req.url,
            "http://example.org/fmerest/v2/schedules/Nightly/n1/enabled?fmetoken=T1"
        );
        assert_eq!(req.header_value("content-type"), Some(FORM_URLENCODED));
        assert_eq!(req.body, Some(Payload::Form("value=false".to_string())));
    }
}

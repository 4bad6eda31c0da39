//! Notification service: topics, publications and subscriptions.

use serde_json::Value;

use super::FmeServer;
use crate::error::Result;
use crate::http::{segment, HttpMethod, HttpRequest, Payload};

const TOPICS: &str = "notifications/topics";
const PUBLICATIONS: &str = "notifications/publications";
const SUBSCRIPTIONS: &str = "notifications/subscriptions";

impl FmeServer {
    pub fn build_topics(&self) -> HttpRequest {
        self.list(TOPICS)
    }

    pub fn build_topic(&self, topic: &str) -> HttpRequest {
        self.entry(HttpMethod::Get, TOPICS, topic)
    }

    pub fn build_create_topic(&self, topic: &Value) -> Result<HttpRequest> {
        self.create(TOPICS, topic)
    }

    pub fn build_delete_topic(&self, topic: &str) -> HttpRequest {
        self.entry(HttpMethod::Delete, TOPICS, topic)
    }

    /// Publish a plain-text message to a topic. The server answers 202.
    pub fn build_publish_message(&self, topic: &str, message: &str) -> HttpRequest {
        let url = self.rest_url(&format!("{TOPICS}/{}/message/publish", segment(topic)), &[]);
        self.request(HttpMethod::Post, url)
            .payload(Payload::Text(message.to_string()))
    }

    pub fn build_publications(&self) -> HttpRequest {
        self.list(PUBLICATIONS)
    }

    pub fn build_publication(&self, name: &str) -> HttpRequest {
        self.entry(HttpMethod::Get, PUBLICATIONS, name)
    }

    pub fn build_create_publication(&self, publication: &Value) -> Result<HttpRequest> {
        self.create(PUBLICATIONS, publication)
    }

    pub fn build_update_publication(&self, name: &str, publication: &Value) -> Result<HttpRequest> {
        self.update(PUBLICATIONS, name, publication)
    }

    pub fn build_delete_publication(&self, name: &str) -> HttpRequest {
        self.entry(HttpMethod::Delete, PUBLICATIONS, name)
    }

    pub fn build_subscriptions(&self) -> HttpRequest {
        self.list(SUBSCRIPTIONS)
    }

    pub fn build_subscription(&self, name: &str) -> HttpRequest {
        self.entry(HttpMethod::Get, SUBSCRIPTIONS, name)
    }

    pub fn build_create_subscription(&self, subscription: &Value) -> Result<HttpRequest> {
        self.create(SUBSCRIPTIONS, subscription)
    }

    pub fn build_update_subscription(&self, name: &str, subscription: &Value) -> Result<HttpRequest> {
        self.update(SUBSCRIPTIONS, name, subscription)
    }

    pub fn build_delete_subscription(&self, name: &str) -> HttpRequest {
        self.entry(HttpMethod::Delete, SUBSCRIPTIONS, name)
    }

    fn list(&self, collection: &str) -> HttpRequest {
        let url = self.rest_url(collection, &[]);
        self.request(HttpMethod::Get, url)
    }

    fn entry(&self, method: HttpMethod, collection: &str, name: &str) -> HttpRequest {
        let url = self.rest_url(&format!("{collection}/{}", segment(name)), &[]);
        self.request(method, url)
    }

    fn create(&self, collection: &str, body: &Value) -> Result<HttpRequest> {
        let url = self.rest_url(collection, &[]);
        Ok(self.request(HttpMethod::Post, url).payload(Payload::json(body)?))
    }

    fn update(&self, collection: &str, name: &str, body: &Value) -> Result<HttpRequest> {
        Ok(self
            .entry(HttpMethod::Put, collection, name)
            .payload(Payload::json(body)?))
    }

    dispatch_methods! {
        topics => build_topics();
        topic => build_topic(topic: &str);
        delete_topic => build_delete_topic(topic: &str);
        /// A 202 from the server arrives as `Response::Accepted`.
        publish_message => build_publish_message(topic: &str, message: &str);
        publications => build_publications();
        publication => build_publication(name: &str);
        delete_publication => build_delete_publication(name: &str);
        subscriptions => build_subscriptions();
        subscription => build_subscription(name: &str);
        delete_subscription => build_delete_subscription(name: &str);
    }

    try_dispatch_methods! {
        create_topic => build_create_topic(topic: &Value);
        create_publication => build_create_publication(publication: &Value);
        update_publication => build_update_publication(name: &str, publication: &Value);
        create_subscription => build_create_subscription(subscription: &Value);
        update_subscription => build_update_subscription(name: &str, subscription: &Value);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::server;
    use crate::http::{HttpMethod, Payload, JSON, TEXT};
    use serde_json::json;

    #[test]
    fn publish_sends_plain_text() {
        let req = server().build_publish_message("SAMPLE_TOPIC", "hello {world}");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.url,
            "http://example.org/fmerest/v2/notifications/topics/SAMPLE_TOPIC/message/publish?fmetoken=T1"
        );
        assert_eq!(req.header_value("content-type"), Some(TEXT));
        assert_eq!(req.body, Some(Payload::Text("hello {world}".to_string())));
    }

    #[test]
    fn topic_entries() {
        let s = server();
        assert_eq!(
            s.build_topics().url,
            "http://example.org/fmerest/v2/notifications/topics?fmetoken=T1"
        );
        assert_eq!(
            s.build_topic("a b").url,
            "http://example.org/fmerest/v2/notifications/topics/a%20b?fmetoken=T1"
        );
        assert_eq!(s.build_delete_topic("t").method, HttpMethod::Delete);
        let create = s.build_create_topic(&json!({"name": "t"})).unwrap();
        assert_eq!(create.method, HttpMethod::Post);
        assert_eq!(create.header_value("content-type"), Some(JSON));
    }

    #[test]
    fn publication_and_subscription_updates_use_put_json() {
        let s = server();
        let body = json!({"name": "p1", "topics": ["T"]});
        let publication = s.build_update_publication("p1", &body).unwrap();
        assert_eq!(publication.method, HttpMethod::Put);
        assert_eq!(
            publication.url,
            "http://example.org/fmerest/v2/notifications/publications/p1?fmetoken=T1"
        );
        assert_eq!(publication.header_value("content-type"), Some(JSON));

        let subscription = s.build_update_subscription("s1", &body).unwrap();
        assert_eq!(
            subscription.url,
            "http://example.org/fmerest/v2/notifications/subscriptions/s1?fmetoken=T1"
        );
    }

    #[test]
    fn collection_listing_and_deletes() {
        let s = server();
        assert!(s.build_publications().url.contains("/notifications/publications?"));
        assert!(s.build_subscriptions().url.contains("/notifications/subscriptions?"));
        assert_eq!(s.build_delete_publication("p").method, HttpMethod::Delete);
        assert_eq!(s.build_delete_subscription("s").method, HttpMethod::Delete);
        assert_eq!(s.build_subscription("s").method, HttpMethod::Get);
        assert!(s.build_create_subscription(&json!({"name": "s"})).is_ok());
        assert!(s.build_create_publication(&json!({"name": "p"})).is_ok());
        assert_eq!(s.build_publication("p").method, HttpMethod::Get);
    }
}

//! Token service. It lives under `{base}/fmetoken/` rather than the REST
//! API and authenticates with user name and password instead of a token.

use super::FmeServer;
use crate::http::{HttpMethod, HttpRequest, Payload};

/// Unit of a token's `expiration`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Second => "second",
            TimeUnit::Minute => "minute",
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::Week => "week",
            TimeUnit::Month => "month",
            TimeUnit::Year => "year",
        }
    }
}

impl FmeServer {
    /// Issue a new token valid for `expiration` units.
    pub fn build_generate_token(&self, user: &str, password: &str, expiration: u32, unit: TimeUnit) -> HttpRequest {
        let expiration = expiration.to_string();
        let body = Payload::form(&[
            ("user", user),
            ("password", password),
            ("expiration", expiration.as_str()),
            ("timeunit", unit.as_str()),
        ]);
        self.request(HttpMethod::Post, self.service_url("fmetoken", "generate"))
            .payload(body)
    }

    /// Look up the user's current token.
    pub fn build_view_token(&self, user: &str, password: &str) -> HttpRequest {
        let body = Payload::form(&[("user", user), ("password", password)]);
        self.request(HttpMethod::Post, self.service_url("fmetoken", "view"))
            .payload(body)
    }

    dispatch_methods! {
        /// The token service answers with the bare token, which arrives as
        /// `Response::Text` unless a JSON format was negotiated.
        generate_token => build_generate_token(user: &str, password: &str, expiration: u32, unit: TimeUnit);
        view_token => build_view_token(user: &str, password: &str);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::server;
    use super::*;
    use crate::http::FORM_URLENCODED;

    #[test]
    fn generate_token_posts_credentials_as_form() {
        let req = server().build_generate_token("admin", "p&ss", 2, TimeUnit::Hour);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://example.org/fmetoken/generate");
        assert!(!req.url.contains("fmetoken="));
        assert_eq!(req.header_value("content-type"), Some(FORM_URLENCODED));
        assert_eq!(
            req.body,
            Some(Payload::Form(
                "user=admin&password=p%26ss&expiration=2&timeunit=hour".to_string()
            ))
        );
    }

    #[test]
    fn view_token_uses_view_endpoint() {
        let req = server().build_view_token("admin", "pw");
        assert_eq!(req.url, "http://example.org/fmetoken/view");
        assert_eq!(req.body, Some(Payload::Form("user=admin&password=pw".to_string())));
    }
}

//! Named routes and absolute URLs for outgoing links.

use domain::services::invitation::JOIN_ROUTE;
use domain::services::LinkGenerator;
use reqwest::Url;
use std::collections::HashMap;

/// Origin used only to let `Url` encode paths and queries.
const ENCODING_ORIGIN: &str = "http://localhost";

/// Resolves route names to paths under a public base URL.
#[derive(Debug, Clone)]
pub struct RouteLinks {
    base_url: String,
    routes: HashMap<String, String>,
}

impl RouteLinks {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            routes: HashMap::new(),
        }
    }

    /// Links for the invitation workflow: the join page lives at `join_path`.
    pub fn for_invites(base_url: impl Into<String>, join_path: &str) -> Self {
        Self::new(base_url).with_route(JOIN_ROUTE, join_path)
    }

    pub fn with_route(mut self, name: &str, path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        self.routes.insert(name.to_string(), path);
        self
    }

    fn path_for(&self, route: &str) -> String {
        self.routes
            .get(route)
            .cloned()
            .unwrap_or_else(|| format!("/{}", route.replace('.', "/")))
    }
}

impl LinkGenerator for RouteLinks {
    /// Site-relative link with percent-encoded query parameters.
    fn link_for(&self, route: &str, params: &[(&str, &str)]) -> String {
        let path = self.path_for(route);
        let mut url = match Url::parse(ENCODING_ORIGIN).and_then(|base| base.join(&path)) {
            Ok(url) => url,
            Err(_) => return path,
        };

        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter().copied());
        }

        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    }

    fn to_absolute(&self, url: &str) -> String {
        if Url::parse(url).is_ok() {
            return url.to_string();
        }
        if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_link() {
        let links = RouteLinks::for_invites("https://cloud.example.com/", "/invite/join");
        let link = links.link_for(JOIN_ROUTE, &[("username", "bob"), ("token", "abc123")]);
        assert_eq!(link, "/invite/join?username=bob&token=abc123");
        assert_eq!(
            links.to_absolute(&link),
            "https://cloud.example.com/invite/join?username=bob&token=abc123"
        );
    }

    #[test]
    fn test_query_values_are_encoded() {
        let links = RouteLinks::for_invites("https://cloud.example.com", "invite/join");
        let link = links.link_for(JOIN_ROUTE, &[("username", "first last@x"), ("token", "a&b")]);
        assert_eq!(link, "/invite/join?username=first+last%40x&token=a%26b");
    }

    #[test]
    fn test_base_url_with_sub_path() {
        let links = RouteLinks::for_invites("https://example.com/cloud", "/invite/join");
        let link = links.link_for(JOIN_ROUTE, &[]);
        assert_eq!(links.to_absolute(&link), "https://example.com/cloud/invite/join");
    }

    #[test]
    fn test_unknown_route_maps_dots_to_segments() {
        let links = RouteLinks::new("https://cloud.example.com");
        assert_eq!(links.link_for("settings.personal", &[]), "/settings/personal");
    }

    #[test]
    fn test_absolute_url_unchanged() {
        let links = RouteLinks::new("https://cloud.example.com");
        assert_eq!(
            links.to_absolute("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }
}

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::JiraConfig;
use crate::error::{NotifyError, Result};

/// Issues requested per search page.
const SEARCH_PAGE_SIZE: usize = 100;

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_address: String,
}

/// A favourite filter: its name and JQL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFilter {
    pub name: String,
    pub jql: String,
}

#[derive(Debug, Deserialize)]
struct RawFilter {
    name: String,
    #[serde(default)]
    jql: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    issues: Vec<Value>,
}

/// REST API v2 client authenticated with basic auth.
#[derive(Debug, Clone)]
pub struct JiraClient {
    server: String,
    username: String,
    api_token: String,
    client: reqwest::Client,
}

impl JiraClient {
    /// Build a client from validated credentials.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] when a credential is missing and
    /// [`NotifyError::Http`] when the HTTP client cannot be built.
    pub fn new(config: &JiraConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            server: config.server.trim_end_matches('/').to_owned(),
            username: config.username.clone(),
            api_token: config.api_token.clone(),
            client,
        })
    }

    /// Server base URL without trailing slash.
    pub fn server(&self) -> &str {
        &self.server
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{path}", self.server);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| NotifyError::Jira {
                status: e.status().map_or(0, |s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(NotifyError::Jira {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// The account the credentials belong to.
    pub async fn myself(&self) -> Result<JiraUser> {
        let value = self.get_json("/rest/api/2/myself", &[]).await?;
        let user: JiraUser = serde_json::from_value(value)?;
        info!("logged in as {} <{}>", user.display_name, user.email_address);
        Ok(user)
    }

    /// Favourite filters in server order. A repeated name keeps its first
    /// position and takes the later query.
    pub async fn favourite_filters(&self) -> Result<Vec<SavedFilter>> {
        let value = self.get_json("/rest/api/2/filter/favourite", &[]).await?;
        let raw: Vec<RawFilter> = serde_json::from_value(value)?;

        let mut filters: Vec<SavedFilter> = Vec::with_capacity(raw.len());
        for RawFilter { name, jql } in raw {
            match filters.iter_mut().find(|f| f.name == name) {
                Some(existing) => existing.jql = jql,
                None => filters.push(SavedFilter { name, jql }),
            }
        }
        Ok(filters)
    }

    /// Field definitions, as returned by the server.
    pub async fn fields(&self) -> Result<Vec<Value>> {
        let value = self.get_json("/rest/api/2/field", &[]).await?;
        match value {
            Value::Array(fields) => Ok(fields),
            other => Err(NotifyError::Jira {
                status: 200,
                message: format!("expected a field list, got {other}"),
            }),
        }
    }

    /// Every issue matching `jql`, reading page after page.
    pub async fn search_issues(&self, jql: &str) -> Result<Vec<Value>> {
        let mut issues: Vec<Value> = Vec::new();

        loop {
            let query = [
                ("jql", jql.to_owned()),
                ("startAt", issues.len().to_string()),
                ("maxResults", SEARCH_PAGE_SIZE.to_string()),
            ];
            let page: SearchPage =
                serde_json::from_value(self.get_json("/rest/api/2/search", &query).await?)?;

            let received = page.issues.len();
            issues.extend(page.issues);
            debug!("fetched {} of {} issues", issues.len(), page.total);

            if received == 0 || issues.len() >= page.total {
                break;
            }
        }

        info!("search returned {} issues", issues.len());
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> JiraClient {
        JiraClient::new(&JiraConfig {
            server: format!("{}/", server.uri()),
            username: "me@example.com".into(),
            api_token: "token".into(),
            ..JiraConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = JiraClient::new(&JiraConfig::default()).unwrap_err();
        assert!(err.to_string().contains("jira.server"));
    }

    #[tokio::test]
    async fn myself_sends_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/myself"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"displayName": "Li Lei", "emailAddress": "li@example.com"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let user = client_for(&server).myself().await.unwrap();
        assert_eq!(user.display_name, "Li Lei");
        assert_eq!(user.email_address, "li@example.com");
    }

    #[tokio::test]
    async fn error_status_carries_response_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = client_for(&server).myself().await.unwrap_err();
        assert_eq!(err.to_string(), "jira error: 401 - Unauthorized");
    }

    #[tokio::test]
    async fn favourite_filters_keep_order_and_last_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/filter/favourite"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "open bugs", "jql": "status = Open"},
                {"name": "mine", "jql": "assignee = currentUser()"},
                {"name": "open bugs", "jql": "status = Reopened"}
            ])))
            .mount(&server)
            .await;

        let filters = client_for(&server).favourite_filters().await.unwrap();
        assert_eq!(
            filters,
            vec![
                SavedFilter {
                    name: "open bugs".into(),
                    jql: "status = Reopened".into()
                },
                SavedFilter {
                    name: "mine".into(),
                    jql: "assignee = currentUser()".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn search_reads_every_page() {
        let server = MockServer::start().await;
        let first: Vec<Value> = (0..100).map(|i| json!({"key": format!("P-{i}")})).collect();
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"total": 101, "issues": first})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "100"))
            .and(query_param("jql", "project = P"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"total": 101, "issues": [{"key": "P-100"}]}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let issues = client_for(&server).search_issues("project = P").await.unwrap();
        assert_eq!(issues.len(), 101);
        assert_eq!(issues[100]["key"], "P-100");
    }

    #[tokio::test]
    async fn fields_returns_raw_definitions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/field"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!([{"id": "customfield_10041", "name": "Issue Severity"}]),
            ))
            .mount(&server)
            .await;

        let fields = client_for(&server).fields().await.unwrap();
        assert_eq!(fields[0]["name"], "Issue Severity");
    }
}

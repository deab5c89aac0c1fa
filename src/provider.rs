//! App Engine firewall provider: wire model, API trait, REST client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::auth::AccessToken;
use crate::error::{Error, Result};

const API_BASE: &str = "https://appengine.googleapis.com/v1";
const TIMEOUT_SECS: u64 = 30;

/// Ingress rule action.
///
/// The wire form is the provider's uppercase enum; lowercase is accepted on
/// input and used for display, matching the subcommand names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    #[serde(rename = "ALLOW", alias = "allow")]
    Allow,
    #[serde(rename = "DENY", alias = "deny")]
    Deny,
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleAction::Allow => f.write_str("allow"),
            RuleAction::Deny => f.write_str("deny"),
        }
    }
}

/// One ingress firewall rule as the provider stores it.
///
/// `priority` is the rule's unique identifier within an app's rule set. The
/// source range is kept as the provider's exact text; it is never parsed or
/// normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
    #[serde(default)]
    pub priority: i64,
    pub source_range: String,
    pub action: RuleAction,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListIngressRulesResponse {
    #[serde(default)]
    ingress_rules: Vec<FirewallRule>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorStatus,
}

#[derive(Deserialize)]
struct ApiErrorStatus {
    #[serde(default)]
    message: String,
}

/// Operations the reconciler needs from the firewall provider.
#[async_trait]
pub trait FirewallApi: Send + Sync {
    /// Every ingress rule of the app, pagination followed to exhaustion.
    async fn list_ingress_rules(&self, apps_id: &str) -> Result<Vec<FirewallRule>>;

    /// Create one ingress rule; returns the rule as stored.
    async fn create_ingress_rule(&self, apps_id: &str, rule: &FirewallRule)
        -> Result<FirewallRule>;

    /// Delete the ingress rule with the given priority.
    async fn delete_ingress_rule(&self, apps_id: &str, priority: i64) -> Result<()>;
}

/// REST client for the App Engine Admin API.
pub struct AppEngineClient {
    client: Client,
    token: AccessToken,
    base_url: String,
}

impl AppEngineClient {
    /// Create a client that authenticates every call with `token`.
    pub fn new(token: AccessToken) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(format!("fw-updater/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            token,
            base_url: API_BASE.to_string(),
        })
    }

    fn rules_url(&self, apps_id: &str) -> String {
        format!("{}/apps/{}/firewall/ingressRules", self.base_url, apps_id)
    }

    /// Turn a non-success response into [`Error::Api`], preferring the
    /// structured message the provider embeds in its error body.
    async fn check(call: String, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
            _ => body,
        };
        Err(Error::Api {
            call,
            status,
            message,
        })
    }
}

#[async_trait]
impl FirewallApi for AppEngineClient {
    async fn list_ingress_rules(&self, apps_id: &str) -> Result<Vec<FirewallRule>> {
        let mut rules = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.rules_url(apps_id))
                .bearer_auth(self.token.as_str());
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let response =
                Self::check(format!("list_ingress_rules({:?})", apps_id), response).await?;
            let page: ListIngressRulesResponse = response.json().await?;
            rules.extend(page.ingress_rules);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("listed {} ingress rules for {}", rules.len(), apps_id);
        Ok(rules)
    }

    async fn create_ingress_rule(
        &self,
        apps_id: &str,
        rule: &FirewallRule,
    ) -> Result<FirewallRule> {
        let response = self
            .client
            .post(self.rules_url(apps_id))
            .bearer_auth(self.token.as_str())
            .json(rule)
            .send()
            .await?;
        let call = format!(
            "create_ingress_rule({:?}, {} {} {})",
            apps_id, rule.priority, rule.action, rule.source_range
        );
        let response = Self::check(call, response).await?;
        Ok(response.json().await?)
    }

    async fn delete_ingress_rule(&self, apps_id: &str, priority: i64) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.rules_url(apps_id), priority))
            .bearer_auth(self.token.as_str())
            .send()
            .await?;
        Self::check(
            format!("delete_ingress_rule({:?}, {})", apps_id, priority),
            response,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Recording in-memory provider for tests.
    ///
    /// Serves a seeded rule set, records every mutation, and applies it to
    /// the served set so a follow-up list sees the post-run state. Can be
    /// told to fail on a specific priority to exercise abort behavior.
    pub struct RecordingApi {
        pub rules: Mutex<Vec<FirewallRule>>,
        pub created: Mutex<Vec<FirewallRule>>,
        pub deleted: Mutex<Vec<i64>>,
        pub fail_on_priority: Option<i64>,
    }

    impl RecordingApi {
        pub fn new(rules: Vec<FirewallRule>) -> Self {
            Self {
                rules: Mutex::new(rules),
                created: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
                fail_on_priority: None,
            }
        }

        pub fn failing_on(rules: Vec<FirewallRule>, priority: i64) -> Self {
            Self {
                fail_on_priority: Some(priority),
                ..Self::new(rules)
            }
        }

        /// Total mutation calls received.
        pub fn mutation_count(&self) -> usize {
            self.created.lock().unwrap().len() + self.deleted.lock().unwrap().len()
        }

        fn fail_if_marked(&self, call: &str, priority: i64) -> Result<()> {
            if self.fail_on_priority == Some(priority) {
                return Err(Error::Api {
                    call: call.to_string(),
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    message: "injected failure".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl FirewallApi for RecordingApi {
        async fn list_ingress_rules(&self, _apps_id: &str) -> Result<Vec<FirewallRule>> {
            Ok(self.rules.lock().unwrap().clone())
        }

        async fn create_ingress_rule(
            &self,
            _apps_id: &str,
            rule: &FirewallRule,
        ) -> Result<FirewallRule> {
            self.fail_if_marked("create_ingress_rule", rule.priority)?;
            self.created.lock().unwrap().push(rule.clone());
            self.rules.lock().unwrap().push(rule.clone());
            Ok(rule.clone())
        }

        async fn delete_ingress_rule(&self, _apps_id: &str, priority: i64) -> Result<()> {
            self.fail_if_marked("delete_ingress_rule", priority)?;
            self.deleted.lock().unwrap().push(priority);
            self.rules.lock().unwrap().retain(|r| r.priority != priority);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(priority: i64, source_range: &str) -> FirewallRule {
        FirewallRule {
            priority,
            source_range: source_range.to_string(),
            action: RuleAction::Allow,
            description: "by fw-updater".to_string(),
        }
    }

    #[test]
    fn test_action_display_is_lowercase() {
        assert_eq!(RuleAction::Allow.to_string(), "allow");
        assert_eq!(RuleAction::Deny.to_string(), "deny");
    }

    #[test]
    fn test_action_wire_form_is_uppercase() {
        assert_eq!(serde_json::to_string(&RuleAction::Allow).unwrap(), "\"ALLOW\"");
        assert_eq!(serde_json::to_string(&RuleAction::Deny).unwrap(), "\"DENY\"");
    }

    #[test]
    fn test_action_accepts_both_cases() {
        let upper: RuleAction = serde_json::from_str("\"DENY\"").unwrap();
        let lower: RuleAction = serde_json::from_str("\"deny\"").unwrap();
        assert_eq!(upper, RuleAction::Deny);
        assert_eq!(lower, RuleAction::Deny);
    }

    #[test]
    fn test_rule_wire_field_names() {
        let value = serde_json::to_value(rule(8000, "1.2.3.0/24")).unwrap();
        assert_eq!(value["priority"], 8000);
        assert_eq!(value["sourceRange"], "1.2.3.0/24");
        assert_eq!(value["action"], "ALLOW");
        assert_eq!(value["description"], "by fw-updater");
    }

    #[test]
    fn test_rule_deserialize_fills_defaults() {
        let parsed: FirewallRule =
            serde_json::from_str(r#"{"sourceRange": "10.0.0.0/8", "action": "ALLOW"}"#).unwrap();
        assert_eq!(parsed.priority, 0);
        assert_eq!(parsed.description, "");
    }

    #[test]
    fn test_list_response_parsing() {
        // Includes the provider's always-present default rule.
        let body = r#"{
            "ingressRules": [
                {"priority": 8000, "action": "ALLOW", "sourceRange": "1.2.3.0/24", "description": "by fw-updater"},
                {"priority": 2147483647, "action": "ALLOW", "sourceRange": "*", "description": "The default action."}
            ],
            "nextPageToken": "page-2"
        }"#;
        let parsed: ListIngressRulesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.ingress_rules.len(), 2);
        assert_eq!(parsed.ingress_rules[1].priority, 2_147_483_647);
        assert_eq!(parsed.ingress_rules[1].source_range, "*");
        assert_eq!(parsed.next_page_token.as_deref(), Some("page-2"));
    }

    #[test]
    fn test_list_response_without_rules() {
        let parsed: ListIngressRulesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.ingress_rules.is_empty());
        assert!(parsed.next_page_token.is_none());
    }

    #[test]
    fn test_rules_url() {
        let client = AppEngineClient::new(AccessToken::new("t".to_string())).unwrap();
        assert_eq!(
            client.rules_url("my-app"),
            "https://appengine.googleapis.com/v1/apps/my-app/firewall/ingressRules"
        );
    }

    #[tokio::test]
    async fn test_recording_api_tracks_mutations() {
        let api = mock::RecordingApi::new(vec![rule(8000, "1.2.3.0/24")]);

        api.create_ingress_rule("app", &rule(8001, "5.6.7.0/24"))
            .await
            .unwrap();
        api.delete_ingress_rule("app", 8000).await.unwrap();

        let listed = api.list_ingress_rules("app").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].priority, 8001);
        assert_eq!(api.mutation_count(), 2);
    }

    #[tokio::test]
    async fn test_recording_api_injected_failure() {
        let api = mock::RecordingApi::failing_on(vec![rule(8000, "1.2.3.0/24")], 8000);
        let err = api.delete_ingress_rule("app", 8000).await.unwrap_err();
        assert!(err.to_string().contains("HTTP"));
        assert_eq!(api.mutation_count(), 0);
    }
}

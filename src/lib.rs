//! # fw-updater - Static-IP Firewall Updater for App Engine
//!
//! Keeps an App Engine app's ingress firewall in sync with a list of source
//! ranges read from stdin, so the app only answers traffic from known
//! netblocks. A companion resolver walks SPF-style DNS TXT records to
//! produce that list for provider-published netblocks.
//!
//! ## Features
//!
//! - **Minimal Diffs** - Only departed rules are deleted and new ranges created
//! - **Priority Window** - Rules live in a dedicated priority range; nothing outside it is touched
//! - **Collision Safe** - New rules land on free priority slots, foreign rules keep theirs
//! - **Dry-Run** - Report the exact diff without calling the API
//! - **Netblock Resolver** - Recursive `include:`/`ip4:` TXT walk, order preserved
//! - **Ambient Credentials** - Environment token or GCE metadata server, memory zeroed on drop
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       fw-updater                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    ├── fw-updater: allow, deny                              │
//! │    └── netblocks: TXT walk companion                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Auth (zeroize)                                             │
//! │    └── $GOOGLE_OAUTH_ACCESS_TOKEN, then metadata server     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Provider (reqwest + rustls)                                │
//! │    └── App Engine Admin API ingress rules, paginated        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Reconciler (FirewallApi trait)                             │
//! │    ├── plan: windowed diff, priority slot assignment        │
//! │    └── apply: deletions first, then creations               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Resolver (hickory-resolver)                                │
//! │    └── depth-first include:/ip4: TXT chain walk             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use fw_updater::auth::{DefaultTokenProvider, TokenProvider};
//! use fw_updater::provider::{AppEngineClient, FirewallApi, RuleAction};
//! use fw_updater::reconciler::{self, PriorityWindow};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Acquire credentials
//!     let token = DefaultTokenProvider::new()?.access_token().await?;
//!     let client = AppEngineClient::new(token)?;
//!
//!     // Diff the desired ranges against the app's current rules
//!     let existing = client.list_ingress_rules("my-app").await?;
//!     let desired = vec!["203.0.113.0/24".to_string()];
//!     let window = PriorityWindow::new(8000, 8999);
//!     let plan = reconciler::plan(&existing, &desired, window);
//!
//!     // Apply it (dry-run here)
//!     reconciler::apply(&client, "my-app", RuleAction::Allow, "by fw-updater", true, &plan)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`auth`] - Bearer token acquisition (env, metadata server)
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`error`] - Library error type
//! - [`priority`] - Occupied-priority bookkeeping and slot search
//! - [`provider`] - App Engine Admin API client and wire model
//! - [`reconciler`] - Windowed rule diffing and execution
//! - [`resolver`] - Recursive TXT netblock resolution

pub mod auth;
pub mod cli;
pub mod commands;
pub mod error;
pub mod priority;
pub mod provider;
pub mod reconciler;
pub mod resolver;

pub use cli::{Cli, Commands, ResolverCli};
pub use error::{Error, Result};
pub use provider::{FirewallRule, RuleAction};

//! jira-reconcile: drive the Jira resource lifecycle by hand.
//!
//! Each invocation runs one lifecycle call (create, read, delete, import)
//! against one resource and prints the outcome as JSON on stdout.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jira_reconcile::reconciler::{GroupSpec, MembershipSpec, UserSpec};
use jira_reconcile::{CallContext, Identity, Observed, Provider, ProviderConfig, Reconciler};

/// Reconcile Jira users, groups and group memberships
#[derive(Parser, Debug)]
#[command(name = "jira-reconcile", version, about)]
struct Args {
    /// Jira site domain (e.g. example.atlassian.net)
    #[arg(long, env = "JIRA_DOMAIN")]
    domain: String,

    /// Email of the API user
    #[arg(long, env = "JIRA_USER_EMAIL")]
    email: String,

    /// API token of the API user
    #[arg(long, env = "JIRA_TOKEN", hide_env_values = true)]
    token: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    resource: Resource,
}

#[derive(Subcommand, Debug)]
enum Resource {
    /// Jira user, identified by account id
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Jira group, identified by name
    Group {
        #[command(subcommand)]
        command: GroupCommand,
    },
    /// Group membership, identified by `group_name:account_id`
    Membership {
        #[command(subcommand)]
        command: MembershipCommand,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user
    Create {
        #[arg(long)]
        email: String,
    },
    #[command(flatten)]
    Existing(Existing),
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    /// Create a group
    Create {
        #[arg(long)]
        name: String,
    },
    #[command(flatten)]
    Existing(Existing),
}

#[derive(Subcommand, Debug)]
enum MembershipCommand {
    /// Add a user to a group
    Create {
        #[arg(long)]
        group_name: String,
        #[arg(long)]
        account_id: String,
    },
    #[command(flatten)]
    Existing(Existing),
}

/// Calls against an already tracked identity.
#[derive(Subcommand, Debug)]
enum Existing {
    /// Refresh observed state
    Read { id: String },
    /// Delete the resource (already gone is success)
    Delete { id: String },
    /// Start tracking an existing resource
    Import { id: String },
}

enum Call<S> {
    Create(S),
    Existing(Existing),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jira_reconcile=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = ProviderConfig::new(args.domain, args.email, args.token)
        .with_timeout(Duration::from_secs(args.timeout));
    let provider = Provider::configure(config).context("Invalid provider configuration")?;

    // Ctrl-C cancels the in-flight call
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling");
                cancel.cancel();
            }
        });
    }
    let ctx = CallContext::with_cancellation(cancel);

    let output = match args.resource {
        Resource::User { command } => {
            let call = match command {
                UserCommand::Create { email } => Call::Create(UserSpec::new(email)),
                UserCommand::Existing(e) => Call::Existing(e),
            };
            run(&provider.users(), &ctx, call).await?
        }
        Resource::Group { command } => {
            let call = match command {
                GroupCommand::Create { name } => Call::Create(GroupSpec::new(name)),
                GroupCommand::Existing(e) => Call::Existing(e),
            };
            run(&provider.groups(), &ctx, call).await?
        }
        Resource::Membership { command } => {
            let call = match command {
                MembershipCommand::Create {
                    group_name,
                    account_id,
                } => Call::Create(MembershipSpec::new(group_name, account_id)),
                MembershipCommand::Existing(e) => Call::Existing(e),
            };
            run(&provider.memberships(), &ctx, call).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run<R: Reconciler>(
    reconciler: &R,
    ctx: &CallContext,
    call: Call<R::Spec>,
) -> Result<Value> {
    let kind = reconciler.kind();
    match call {
        Call::Create(spec) => match reconciler.create(ctx, &spec).await {
            Ok(created) => Ok(json!({ "id": created.identity, "state": created.state })),
            Err(e) => {
                if let Some(id) = e.created_identity() {
                    error!("{} {} exists in Jira and must be tracked", kind, id);
                }
                Err(e).with_context(|| format!("Failed to create {}", kind))
            }
        },
        Call::Existing(Existing::Read { id }) => {
            let id = Identity::new(id);
            let observed = reconciler
                .read(ctx, &id)
                .await
                .with_context(|| format!("Failed to read {} {}", kind, id))?;
            Ok(observed_json(&id, observed))
        }
        Call::Existing(Existing::Import { id }) => {
            let id = Identity::new(id);
            let observed = reconciler
                .import(ctx, &id)
                .await
                .with_context(|| format!("Failed to import {} {}", kind, id))?;
            Ok(observed_json(&id, observed))
        }
        Call::Existing(Existing::Delete { id }) => {
            let id = Identity::new(id);
            reconciler
                .delete(ctx, &id)
                .await
                .with_context(|| format!("Failed to delete {} {}", kind, id))?;
            Ok(json!({ "id": id, "deleted": true }))
        }
    }
}

fn observed_json(id: &Identity, observed: Observed) -> Value {
    match observed {
        Observed::Present(state) => json!({ "id": id, "state": state }),
        Observed::Absent => json!({ "id": id, "absent": true }),
    }
}

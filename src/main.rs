//! GitLab File node runner
//!
//! Acts as a minimal local host: prints the node description, runs the node
//! over input items, and manages stored GitLab credentials.

use clap::{Parser, Subcommand};
use gitlab_file_node::config::{
    validate_credentials, validate_settings_result, FileCredentialStore, NodeSettings,
};
use gitlab_file_node::credentials::{
    credential_type_description, GitLabCredentials, GITLAB_API_CREDENTIAL,
};
use gitlab_file_node::host::{LocalExecuteContext, NodeExecutionData, NodeType};
use gitlab_file_node::GitLabFile;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

/// GitLab File - fetch repository trees and files from GitLab
#[derive(Parser, Debug)]
#[command(name = "gitlab-file-node")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/gitlab-file-node/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at info level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the node and credential type descriptions as JSON
    Describe,

    /// Execute the node and print its output items as JSON
    Run {
        /// Operation to perform (getTree, getFile)
        #[arg(short, long, default_value = "getTree")]
        operation: String,

        /// Project ID or URL-encoded path (e.g. group/project)
        #[arg(short, long)]
        project_id: String,

        /// Path inside the repository
        #[arg(long, default_value = "")]
        path: String,

        /// Branch, tag or commit (default branch if empty)
        #[arg(short, long = "ref", default_value = "")]
        git_ref: String,

        /// List subdirectories recursively (getTree only)
        #[arg(short, long)]
        recursive: bool,

        /// GitLab host (overrides the stored credential together with --token)
        #[arg(long, env = "GITLAB_HOST", default_value = "")]
        host: String,

        /// GitLab access token
        #[arg(long, env = "GITLAB_TOKEN", default_value = "", hide_env_values = true)]
        token: String,

        /// Stored credential to use when host/token are not given
        #[arg(long, default_value = GITLAB_API_CREDENTIAL)]
        credential: String,

        /// JSON file holding an array of input items (default: one empty item)
        #[arg(long)]
        items: Option<PathBuf>,
    },

    /// Manage stored credentials
    #[command(subcommand)]
    Credential(CredentialCommands),
}

#[derive(Subcommand, Debug)]
enum CredentialCommands {
    /// Add or replace a credential
    Set {
        /// Credential name
        #[arg(default_value = GITLAB_API_CREDENTIAL)]
        name: String,

        /// GitLab host, e.g. https://gitlab.com
        #[arg(long)]
        host: String,

        /// GitLab access token
        #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Show a credential with its token masked
    Show {
        #[arg(default_value = GITLAB_API_CREDENTIAL)]
        name: String,
    },

    /// List stored credential names
    List,

    /// Remove a credential
    Remove { name: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = gitlab_file_node::logging::default_directive(cli.verbose);
    if let Err(e) = gitlab_file_node::logging::init(default_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        if let gitlab_file_node::Error::Node(ref api_error) = e {
            if let Some(ref description) = api_error.description {
                eprintln!("  {}", description);
            }
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> gitlab_file_node::Result<()> {
    let settings = match cli.config {
        Some(ref path) => NodeSettings::load(path)?,
        None => NodeSettings::load_or_default(NodeSettings::default_path())?,
    };
    validate_settings_result(&settings)?;

    let store = FileCredentialStore::new(settings.credentials_path());

    match cli.command {
        Commands::Describe => {
            let node = GitLabFile::new(&settings);
            let description = serde_json::json!({
                "node": node.description(),
                "credentials": [credential_type_description()],
            });
            println!("{}", serde_json::to_string_pretty(&description)?);
            Ok(())
        }
        Commands::Run {
            operation,
            project_id,
            path,
            git_ref,
            recursive,
            host,
            token,
            credential,
            items,
        } => {
            let items = match items {
                Some(ref file) => load_items(file)?,
                None => vec![NodeExecutionData::empty()],
            };

            let node = GitLabFile::new(&settings);
            let description = node.description();

            let mut parameters = Map::new();
            parameters.insert("operation".to_string(), Value::from(operation));
            parameters.insert("projectId".to_string(), Value::from(project_id));
            parameters.insert("filePath".to_string(), Value::from(path));
            parameters.insert("ref".to_string(), Value::from(git_ref));
            parameters.insert("recursive".to_string(), Value::from(recursive));

            let missing = description.missing_required(&parameters);
            if !missing.is_empty() {
                return Err(gitlab_file_node::Error::Config(format!(
                    "Missing required parameter(s): {}",
                    missing.join(", ")
                )));
            }

            let mut ctx = LocalExecuteContext::new(items)
                .with_description(description)
                .with_credential_store(Arc::new(store))
                .select_credential(GITLAB_API_CREDENTIAL, credential)
                .with_parameter("host", host)
                .with_parameter("accessToken", token);
            for (name, value) in parameters {
                ctx = ctx.with_parameter(name, value);
            }

            let output = node.execute(&ctx).await?;
            let main_output: Vec<&NodeExecutionData> = output.iter().flatten().collect();
            println!("{}", serde_json::to_string_pretty(&main_output)?);
            Ok(())
        }
        Commands::Credential(cmd) => handle_credential_command(cmd, &store),
    }
}

/// Read input items from a JSON array; bare values become `{ "json": value }`
fn load_items(path: &Path) -> gitlab_file_node::Result<Vec<NodeExecutionData>> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    let Value::Array(entries) = value else {
        return Err(gitlab_file_node::Error::Config(format!(
            "{} must contain a JSON array of items",
            path.display()
        )));
    };

    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Value::Object(mut object) if object.len() == 1 && object.contains_key("json") => {
                NodeExecutionData::new(object.remove("json").unwrap_or(Value::Null))
            }
            other => NodeExecutionData::new(other),
        })
        .collect())
}

fn handle_credential_command(
    cmd: CredentialCommands,
    store: &FileCredentialStore,
) -> gitlab_file_node::Result<()> {
    match cmd {
        CredentialCommands::Set { name, host, token } => {
            let credentials = GitLabCredentials::new(host.trim(), token.trim());
            validate_credentials(&name, &credentials)?;
            store.set(&name, credentials)?;
            println!("Saved credential '{}' to {}", name, store.path().display());
            Ok(())
        }
        CredentialCommands::Show { name } => match store.load(&name)? {
            Some(credentials) => {
                println!("name:        {}", name);
                println!("host:        {}", credentials.host);
                println!("accessToken: {}", credentials.masked_token());
                Ok(())
            }
            None => Err(gitlab_file_node::Error::Credential(format!(
                "Credential '{}' not found",
                name
            ))),
        },
        CredentialCommands::List => {
            let names = store.names()?;
            if names.is_empty() {
                println!("No credentials stored in {}", store.path().display());
            }
            for name in names {
                println!("{}", name);
            }
            Ok(())
        }
        CredentialCommands::Remove { name } => {
            if store.remove(&name)? {
                println!("Removed credential '{}'", name);
                Ok(())
            } else {
                Err(gitlab_file_node::Error::Credential(format!(
                    "Credential '{}' not found",
                    name
                )))
            }
        }
    }
}

use clap::{Parser, Subcommand};
use clinic_client::ClinicClient;
use clinic_client::config::get_configuration;
use clinic_client::models::Role;
use clinic_client::session::{LoggingNavigator, page_identifier};
use clinic_client::utils::options::select_options;
use dotenvy::dotenv;
use service_core::observability::logging::init_tracing;
use service_core::retry::RetryConfig;
use std::sync::Arc;
use tracing::info;

/// `clinic-client` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "clinic-client",
    about = "Command-line front end for the vet clinic API",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exchange username and password for a session.
    Login {
        username: String,
        /// Falls back to `CLINIC_PASSWORD` when omitted.
        #[arg(long)]
        password: Option<String>,
        /// Backend user type: cliente, funcionario or gerente.
        #[arg(long, default_value = "funcionario")]
        user_type: String,
    },
    /// Drop the persisted session.
    Logout,
    /// Show who the session belongs to.
    Whoami,
    /// Print every item of a collection as JSON lines.
    List {
        /// Collection name, e.g. `pacientes`.
        collection: String,
        #[arg(long)]
        search: Option<String>,
        /// Page path the listing is shown on.
        #[arg(long, default_value = "/dashboard/")]
        page: String,
        /// Re-run the whole aggregation this many times on transient failures.
        #[arg(long, default_value_t = 0)]
        retries: u32,
        /// Print `id<TAB>label` choices instead of raw items.
        #[arg(long)]
        options: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = CliArgs::parse();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "clinic-client",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    let mut client = ClinicClient::from_settings(&configuration, Arc::new(LoggingNavigator)).await?;

    match args.command {
        Command::Login {
            username,
            password,
            user_type,
        } => {
            if client
                .session
                .redirect_if_authenticated("login", &configuration.session.dashboard)
            {
                info!("Already logged in; run logout first to switch users");
                return Ok(());
            }

            let password = match password {
                Some(password) => password,
                None => std::env::var("CLINIC_PASSWORD")
                    .map_err(|_| anyhow::anyhow!("No password given and CLINIC_PASSWORD is unset"))?,
            };

            client
                .login(&username, &password, Role::from_user_type(&user_type))
                .await?;
            info!(
                username = %username,
                destination = %configuration.session.dashboard,
                "Logged in"
            );
        }
        Command::Logout => {
            client.logout().await?;
        }
        Command::Whoami => match client.display_name().await? {
            Some(name) => {
                let role = client
                    .session
                    .current_credential()
                    .map(|credential| credential.role())
                    .unwrap_or_default();
                println!("{} ({})", name, role.user_type());
            }
            None => println!("anonymous"),
        },
        Command::List {
            collection,
            search,
            page,
            retries,
            options,
        } => {
            let page_id = page_identifier(&page);
            let items = if retries == 0 {
                client
                    .fetch_collection(&page_id, &collection, search.as_deref())
                    .await?
            } else {
                client
                    .fetch_collection_with_retry(
                        &page_id,
                        &collection,
                        search.as_deref(),
                        &RetryConfig::with_max_retries(retries),
                    )
                    .await?
            };

            if options {
                for option in select_options(&items) {
                    println!("{}\t{}", option.value, option.label);
                }
            } else {
                for item in &items {
                    println!("{}", serde_json::to_string(item)?);
                }
            }
            info!(collection = %collection, items = items.len(), "Listed collection");
        }
    }

    Ok(())
}

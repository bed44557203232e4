use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use console_core::observability::init_tracing;
use tenant_console::config::get_configuration;
use tenant_console::display::TenantView;
use tenant_console::models::{
    CreateTenantRequest, Helm, HelmValues, Source, TenantResponse, UpdateTenantBody,
};
use tenant_console::services::MutationHooks;
use tenant_console::{TenantClient, TenantQueries};
use tracing::info;

#[derive(Parser)]
#[command(name = "tenant-console", about = "Administer tenants of the deployment service")]
struct Cli {
    /// Tenant service base path; overrides APP_API__BASE_PATH.
    #[arg(long, global = true)]
    base_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all tenants
    List,
    /// Show one tenant
    Get { id: String },
    /// Create a tenant
    Create(SourceArgs),
    /// Replace a tenant's source
    Update {
        id: String,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Delete a tenant
    Delete { id: String },
}

#[derive(Args)]
struct SourceArgs {
    #[arg(long)]
    repo_url: Option<String>,
    #[arg(long)]
    path: Option<String>,
    #[arg(long)]
    target_revision: Option<String>,
    /// Helm values as a JSON object
    #[arg(long)]
    values: Option<String>,
}

impl SourceArgs {
    fn into_source(self) -> anyhow::Result<Source> {
        let values = self
            .values
            .map(|raw| serde_json::from_str::<HelmValues>(&raw))
            .transpose()
            .context("--values must be a JSON object")?;

        Ok(Source {
            repo_url: self.repo_url,
            path: self.path,
            target_revision: self.target_revision,
            helm: values.map(|values| Helm {
                values: Some(values),
            }),
        })
    }
}

fn print_summary(view: &TenantView) {
    println!("{:<24} {:<12} {}", view.id, view.health, view.repo_url.text);
}

fn print_details(view: &TenantView) {
    println!("ID:              {}", view.id);
    println!("Repository URL:  {}", view.repo_url.text);
    println!("Path:            {}", view.path.text);
    println!("Target revision: {}", view.target_revision.text);
    match &view.health_message {
        Some(message) => println!("Health:          {} ({})", view.health, message),
        None => println!("Health:          {}", view.health),
    }
    if let Some(values) = &view.helm_values {
        println!("Helm values:\n{}", values);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    if let Some(base_path) = cli.base_path {
        configuration.api.base_path = Some(base_path);
    }

    init_tracing("tenant-console", &configuration.telemetry)?;

    let client = TenantClient::from_settings(&configuration)?;
    let queries = TenantQueries::new(client);

    match cli.command {
        Command::List => {
            let response = queries.tenants().await?;
            if response.tenants.is_empty() {
                println!("No tenants found");
            }
            for tenant in &response.tenants {
                print_summary(&TenantView::from_tenant(tenant));
            }
        }
        Command::Get { id } => {
            let response = queries.tenant(&id).await?;
            let tenant = response.tenant.unwrap_or_default();
            print_details(&TenantView::from_tenant(&tenant));
        }
        Command::Create(args) => {
            let request = CreateTenantRequest::from(args.into_source()?);
            let hooks = MutationHooks::new().on_success(|response: &TenantResponse| {
                info!(id = ?response.tenant_id(), "Tenant created");
            });
            let response = queries.create_tenant_with(&request, hooks).await?;
            println!("{}", response.tenant_id().unwrap_or_default());
        }
        Command::Update { id, source } => {
            let body = UpdateTenantBody::from(source.into_source()?);
            let response = queries.update_tenant(&id, &body).await?;
            let tenant = response.tenant.unwrap_or_default();
            print_details(&TenantView::from_tenant(&tenant));
        }
        Command::Delete { id } => {
            queries.delete_tenant(&id).await?;
            info!(id = %id, "Tenant deleted");
        }
    }

    Ok(())
}

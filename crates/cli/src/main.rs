use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_core::catalog::ProductCatalog;
use folio_core::domain::UserInputRequest;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "folio_cli")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the percentage allocation for one investor profile.
    Allocate {
        /// Low, Medium or High.
        #[arg(long)]
        risk_tolerance: String,

        /// Short, Moderate or Long.
        #[arg(long)]
        investment_horizon: String,

        #[arg(long)]
        age: i64,

        /// e.g. "Retirement", "Emergency Fund".
        #[arg(long)]
        goal: String,

        /// Also print per-product amounts for this target.
        #[arg(long)]
        target_amount: Option<f64>,
    },

    /// Present value of a percentage share of a target amount.
    Amount {
        #[arg(long)]
        percentage_split: f64,

        #[arg(long)]
        target_amount: f64,

        #[arg(long, allow_hyphen_values = true)]
        annual_return: f64,

        #[arg(long)]
        investment_horizon: String,
    },

    /// Print the product catalog.
    Products,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = folio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args.command, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "command failed");
        return Err(err);
    }
    Ok(())
}

async fn run(command: Command, settings: &folio_core::config::Settings) -> anyhow::Result<()> {
    match command {
        Command::Allocate {
            risk_tolerance,
            investment_horizon,
            age,
            goal,
            target_amount,
        } => {
            let input = UserInputRequest {
                risk_tolerance: Some(risk_tolerance),
                investment_horizon: Some(investment_horizon.clone()),
                age: Some(age),
                goal: Some(goal),
            }
            .into_input()?;

            let source = folio_core::matrix::source::from_settings(settings)?;
            let allocation =
                folio_core::allocation::compute_allocation_with_source(&input, source.as_ref())
                    .await
                    .context("allocation failed")?;

            let output = match target_amount {
                Some(target_amount) => {
                    let catalog = ProductCatalog::load(settings.product_catalog_path()).await?;
                    let products = folio_core::product_allocation::compute_product_allocations(
                        &allocation,
                        target_amount,
                        &investment_horizon,
                        &catalog,
                    )?;
                    serde_json::json!({
                        "allocation": allocation,
                        "productAllocations": products,
                    })
                }
                None => serde_json::to_value(&allocation)?,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Amount {
            percentage_split,
            target_amount,
            annual_return,
            investment_horizon,
        } => {
            let amount = folio_core::amount::compute_amount(
                percentage_split,
                target_amount,
                annual_return,
                &investment_horizon,
            )?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "investmentAmount": amount }))?
            );
        }
        Command::Products => {
            let catalog = ProductCatalog::load(settings.product_catalog_path()).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&catalog.list_products())?
            );
        }
    }
    Ok(())
}

fn init_sentry(settings: &folio_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

use airport_api::password::hash_in_background;
use airport_core::repository::UserRepository;
use airport_core::user::{normalize_email, validate_password, NewUser, UserChanges};
use airport_store::{app_config::Config, PgStore};
use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "create-staff")]
#[command(about = "Create a staff account, or promote an existing one")]
struct Args {
    /// Account email
    #[arg(long)]
    email: String,

    /// Password for a new account; ignored when promoting
    #[arg(long, env = "AIRPORT_STAFF_PASSWORD")]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "create_staff=info,airport_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::load().context("Failed to load config")?;
    let Some(url) = config.database.url.as_deref() else {
        bail!("database.url is not configured; staff accounts need a persistent store");
    };

    let store = PgStore::new(url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    store.migrate().await.context("Failed to run migrations")?;

    let email = normalize_email(&args.email).map_err(|e| anyhow::anyhow!("{}", e))?;

    if let Some(existing) = store.find_user_by_email(&email).await? {
        if existing.is_staff {
            tracing::info!("{} is already staff", existing.email);
            return Ok(());
        }
        let changes = UserChanges { is_staff: Some(true), ..Default::default() };
        store.update_user(existing.id, &changes).await?;
        tracing::info!("Promoted {} to staff", existing.email);
        return Ok(());
    }

    let Some(password) = args.password else {
        bail!("--password is required to create a new account");
    };
    validate_password(&password).map_err(|e| anyhow::anyhow!("{}", e))?;

    let user = store
        .create_user(&NewUser {
            email,
            password_hash: hash_in_background(password).await?,
            is_staff: true,
        })
        .await?;
    tracing::info!("Created staff account {} ({})", user.email, user.id);
    Ok(())
}

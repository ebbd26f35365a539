use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use flimlix_store::models::MovieStatus;
use flimlix_store::{setup_store, StoreConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Flimlix catalog store CLI", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List approved movies (viewer-facing catalog)
    Catalog,
    /// List open moderation requests
    Pending,
    /// Approve a moderation request (admin)
    Approve { request_id: String },
    /// Reject a moderation request (admin)
    Reject { request_id: String },
    /// Grant credits to a user by email (admin)
    Grant { email: String, amount: u32 },
    /// Initialize the store's reference data (categories, settings)
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flimlix_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StoreConfig::from_env();
    info!(
        "🚀 Flimlix store [{} mode]",
        if config.is_remote() { "remote" } else { "local" }
    );
    let store = setup_store(&config).await?;

    match args.command {
        Command::Catalog => {
            let movies = store.get_approved_movies().await?;
            if movies.is_empty() {
                println!("No approved movies yet.");
            }
            for movie in movies {
                println!(
                    "{}  {} ({}), {} views",
                    movie.id, movie.title, movie.release_year, movie.views
                );
            }
        }
        Command::Pending => {
            let requests = store.get_requests().await?;
            let pending: Vec<_> = requests
                .into_iter()
                .filter(|r| !r.status.is_terminal())
                .collect();
            if pending.is_empty() {
                println!("No pending requests.");
            }
            for request in pending {
                println!(
                    "{}  {:?} '{}' by {}",
                    request.id, request.action, request.movie_title, request.creator_name
                );
            }
        }
        Command::Approve { request_id } => {
            store.login_as_admin().await?;
            let request = store.approve_request(&request_id).await?;
            let movie = store.get_movie(&request.movie_id).await?;
            println!(
                "Request {} -> {:?}; movie status: {}",
                request.id,
                request.status,
                movie
                    .map(|m| format!("{:?}", m.status))
                    .unwrap_or_else(|| "gone".to_string())
            );
        }
        Command::Reject { request_id } => {
            store.login_as_admin().await?;
            let request = store.reject_request(&request_id).await?;
            println!("Request {} -> {:?}", request.id, request.status);
        }
        Command::Grant { email, amount } => {
            store.login_as_admin().await?;
            let users = store.get_users().await?;
            let user = users
                .into_iter()
                .find(|u| u.email == email)
                .ok_or_else(|| anyhow::anyhow!("no user with email {email}"))?;
            let updated = store.grant_credits(&user, amount).await?;
            println!("{} now has {} credits", updated.email, updated.credits);
        }
        Command::Seed => {
            // Reading reference collections seeds and persists the defaults
            // on a fresh local store; re-writing settings pins the singleton.
            let categories = store.get_categories().await?;
            let settings = store.get_settings().await;
            store.update_settings(&settings).await?;
            let approved = store
                .get_movies()
                .await?
                .iter()
                .filter(|m| m.status == MovieStatus::Approved)
                .count();
            println!(
                "{} categories, {} approved movies, settings in place",
                categories.len(),
                approved
            );
        }
    }

    Ok(())
}

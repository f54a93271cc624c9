use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::CityId;
use storage::{Storage, DEFAULT_FAVORITES};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/weather.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Loads the default favorite cities into an empty table.
    SeedFavorites,
    ListFavorites,
    AddFavorite {
        city_id: String,
        name: String,
        country: String,
    },
    RemoveFavorite {
        city_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::SeedFavorites => {
            let inserted = storage.seed_favorites(&DEFAULT_FAVORITES).await?;
            println!("seeded {inserted} favorites");
        }
        Command::ListFavorites => {
            for favorite in storage.list_favorites().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    favorite.city_id,
                    favorite.name,
                    favorite.country,
                    favorite.added_at.to_rfc3339()
                );
            }
        }
        Command::AddFavorite {
            city_id,
            name,
            country,
        } => {
            let favorite = storage
                .add_favorite(&CityId(city_id), &name, &country)
                .await?;
            println!("favorite city_id={} added", favorite.city_id);
        }
        Command::RemoveFavorite { city_id } => {
            let removed = storage.remove_favorite(&CityId(city_id.clone())).await?;
            if removed {
                println!("favorite city_id={city_id} removed");
            } else {
                println!("city_id={city_id} was not a favorite");
            }
        }
    }

    Ok(())
}

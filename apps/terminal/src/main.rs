use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    list_controller::PageOutcome, load_city_detail, CitySearch, FavoritesStore, ListController,
    Settings, SettingsStore, WeatherApiClient, WeatherDataSource,
};
use shared::domain::{CityId, ContinentFilter, SortKey};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

mod render;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "WEATHER_SERVER_URL", default_value = "http://127.0.0.1:5000")]
    server_url: String,
    /// Settings file; defaults to the per-user config directory.
    #[arg(long)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive city list: enter loads more, `s <key>` sorts, `f <continent>` filters.
    Browse {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Prints the first pages of the city list.
    Cities {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    Search {
        text: String,
    },
    City {
        id: String,
    },
    /// Adds the city to favorites, or removes it when it already is one.
    Favorite {
        id: String,
    },
    Favorites,
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    #[arg(long, default_value = "name")]
    sort: SortKey,
    #[arg(long)]
    desc: bool,
    #[arg(long, default_value = "all")]
    continent: ContinentFilter,
    #[arg(long)]
    weather: bool,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        temp_unit: Option<String>,
        #[arg(long)]
        wind_unit: Option<String>,
        #[arg(long)]
        theme: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let settings_store = match args.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::new(SettingsStore::default_path()?),
    };
    let settings = settings_store.load();
    let client = WeatherApiClient::new(&args.server_url)?;

    match args.command {
        Command::Browse { list } => browse(client, list, &settings).await?,
        Command::Cities { list, pages } => print_pages(client, list, pages, &settings).await?,
        Command::Search { text } => {
            let search = CitySearch::new(Arc::new(client));
            let found = search.search(&text).await?;
            if found.is_empty() {
                println!("no cities found matching \"{}\"", text.trim());
            } else {
                render::print_header();
                render::print_rows(&found, 0, &settings);
            }
        }
        Command::City { id } => {
            let detail = load_city_detail(&client, &client, &CityId(id)).await?;
            render::print_detail(&detail, &settings);
        }
        Command::Favorite { id } => {
            let city = client.city(&CityId(id)).await?;
            let is_favorite = client.toggle(&city.id, &city.name, &city.country).await?;
            if is_favorite {
                println!("{} added to favorites", city.name);
            } else {
                println!("{} removed from favorites", city.name);
            }
        }
        Command::Favorites => render::print_favorites(&client.list().await?),
        Command::Settings { action } => match action {
            None | Some(SettingsAction::Show) => render::print_settings(&settings),
            Some(SettingsAction::Set {
                temp_unit,
                wind_unit,
                theme,
            }) => {
                let updated = apply_settings(settings, temp_unit, wind_unit, theme)?;
                settings_store.save(&updated)?;
                render::print_settings(&updated);
            }
        },
    }

    Ok(())
}

fn apply_settings(
    mut settings: Settings,
    temp_unit: Option<String>,
    wind_unit: Option<String>,
    theme: Option<String>,
) -> Result<Settings> {
    if let Some(v) = temp_unit {
        settings.temp_unit = v.parse().context("temperature unit")?;
    }
    if let Some(v) = wind_unit {
        settings.wind_unit = v.parse().context("wind unit")?;
    }
    if let Some(v) = theme {
        settings.theme = v.parse().context("theme")?;
    }
    Ok(settings)
}

async fn configured_list(client: WeatherApiClient, args: &ListArgs) -> ListController {
    let list = ListController::new(Arc::new(client.with_weather_annotation(args.weather)));
    list.set_filter(args.continent).await;
    // Selecting the current key flips direction, so only switch when it differs.
    if list.query().await.sort_key != args.sort {
        list.set_sort(args.sort).await;
    }
    if args.desc {
        list.set_sort(args.sort).await;
    }
    list
}

async fn print_pages(
    client: WeatherApiClient,
    args: ListArgs,
    pages: u32,
    settings: &Settings,
) -> Result<()> {
    let list = configured_list(client, &args).await;
    for _ in 0..pages {
        if list.request_next_page().await? == PageOutcome::Skipped {
            break;
        }
    }
    render::print_header();
    render::print_rows(&list.results().await, 0, settings);
    if list.has_more().await {
        println!("… more cities available");
    }
    Ok(())
}

/// Prints whatever the last load added. A first page replaces the list, so
/// it is printed from the top.
async fn show_new_rows(
    list: &ListController,
    printed: &mut usize,
    outcome: PageOutcome,
    settings: &Settings,
) {
    let PageOutcome::Loaded { page, .. } = outcome else {
        return;
    };
    let rows = list.results().await;
    if page == 1 {
        *printed = 0;
        render::print_header();
    }
    render::print_rows(&rows, *printed, settings);
    *printed = rows.len();
    list.on_rows_rendered(rows.len()).await;
    if !list.has_more().await {
        println!("(end of list)");
    }
}

async fn browse(client: WeatherApiClient, args: ListArgs, settings: &Settings) -> Result<()> {
    let list = configured_list(client, &args).await;
    let mut printed = 0;

    match list.on_last_row_visible().await {
        Ok(outcome) => show_new_rows(&list, &mut printed, outcome, settings).await,
        Err(err) => println!("error: {err}"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let result = match verb {
            "" | "n" | "more" => list.request_next_page().await,
            "r" | "refresh" => {
                list.refresh().await;
                list.request_next_page().await
            }
            "s" | "sort" => match rest.parse::<SortKey>() {
                Ok(key) => {
                    list.set_sort(key).await;
                    list.request_next_page().await
                }
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            },
            "f" | "filter" => match rest.parse::<ContinentFilter>() {
                Ok(continent) => {
                    list.set_filter(continent).await;
                    list.request_next_page().await
                }
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            },
            "q" | "quit" => break,
            other => {
                println!("unknown command '{other}' (enter, s <key>, f <continent>, r, q)");
                continue;
            }
        };

        match result {
            Ok(outcome) => show_new_rows(&list, &mut printed, outcome, settings).await,
            Err(err) => {
                warn!(error = %err, "page load failed");
                println!("error: {err} (press enter to try again)");
            }
        }
    }
    Ok(())
}

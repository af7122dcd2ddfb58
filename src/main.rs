//! NFL prediction CLI
//!
//! Imports nflverse datasets into SQLite, builds the transformed tables,
//! trains the boosted win classifier, and predicts single games.

use clap::{Parser, Subcommand};
use gridiron::{Config, Result};

#[derive(Parser)]
#[command(name = "gridiron")]
#[command(about = "NFL statistics ingestion and game outcome prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every upstream dataset and load it into the store
    Import {
        /// Season range override, e.g. 2020-2024
        #[arg(long)]
        seasons: Option<String>,
    },
    /// Build the transformed tables the model consumes
    Transform,
    /// Train the win classifier and save the model
    Train,
    /// Predict a single game
    Predict {
        /// Home team abbreviation
        home: String,
        /// Away team abbreviation
        away: String,
        /// Week of the game
        #[arg(long, default_value = "1")]
        week: u32,
    },
    /// Show store contents
    Status,
    /// Initialize a new project with default config
    Init,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Import { seasons } => commands::import(&config, seasons),
        Commands::Transform => commands::transform(&config),
        Commands::Train => commands::train(&config),
        Commands::Predict { home, away, week } => commands::predict(&config, &home, &away, week),
        Commands::Status => commands::status(&config),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use gridiron::data::{loader, Dataset, Provider, Store};
    use gridiron::features::build_training_data;
    use gridiron::predict::{Matchup, Predictor};
    use gridiron::training::{save_model, GbmTrainer};
    use gridiron::GridironError;

    pub fn import(config: &Config, seasons: Option<String>) -> Result<()> {
        let seasons = match seasons {
            Some(text) => parse_seasons(&text)?,
            None => config.provider.seasons(),
        };

        let mut store = Store::open(&config.data.database_path)?;
        let provider = Provider::new()?;

        for dataset in Dataset::ALL {
            let table = match provider.fetch(dataset, &seasons) {
                Ok(table) => table,
                Err(e) => {
                    log::warn!("Skipping {}: {}", dataset, e);
                    continue;
                }
            };
            loader::load(&mut store, &table, dataset.table_name())?;
        }

        println!("\nList of tables:\n");
        for name in store.table_names()? {
            println!("{}", name);
        }
        Ok(())
    }

    pub fn transform(config: &Config) -> Result<()> {
        let mut store = Store::open(&config.data.database_path)?;
        gridiron::transform::run_all(&mut store)?;
        println!("Transformed tables built.");
        Ok(())
    }

    pub fn train(config: &Config) -> Result<()> {
        let store = Store::open(&config.data.database_path)?;
        let games = store.fetch_table("SELECT * FROM game_info_transformed")?;
        let data = build_training_data(&games)?;

        let trainer = GbmTrainer::new(&config.training);
        let (model, outcome) = trainer.train(&data)?;

        save_model(&model, &config.data.model_path)?;
        data.schema.save(&config.data.feature_schema_path)?;

        println!(
            "Model accuracy: {:.2} ({} boosting rounds, {} train / {} test rows)",
            outcome.accuracy, outcome.iterations, outcome.train_rows, outcome.test_rows
        );
        println!("Model saved as '{}'", config.data.model_path);
        Ok(())
    }

    pub fn predict(config: &Config, home: &str, away: &str, week: u32) -> Result<()> {
        let predictor = Predictor::load(&config.data)?;
        let prediction = predictor.predict(&Matchup {
            home_team: home.to_string(),
            away_team: away.to_string(),
            week,
        })?;

        println!(
            "{} vs {} (week {}): {} will likely win with probability {:.2}",
            prediction.home_team,
            prediction.away_team,
            week,
            prediction.predicted_winner(),
            if prediction.home_win {
                prediction.home_win_prob
            } else {
                1.0 - prediction.home_win_prob
            }
        );
        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let store = Store::open(&config.data.database_path)?;
        let names = store.table_names()?;
        if names.is_empty() {
            println!("Store is empty - run 'gridiron import' first.");
            return Ok(());
        }
        for name in names {
            println!("{}: {} rows", name, store.row_count(&name)?);
        }
        Ok(())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'gridiron import' to fetch datasets");
        println!("  3. Run 'gridiron transform' then 'gridiron train'");
        Ok(())
    }

    fn parse_seasons(text: &str) -> Result<Vec<u16>> {
        let parse = |s: &str| {
            s.trim()
                .parse::<u16>()
                .map_err(|_| GridironError::Parse(format!("invalid season: {}", s)))
        };
        match text.split_once('-') {
            Some((first, last)) => {
                let (first, last) = (parse(first)?, parse(last)?);
                if first > last {
                    return Err(GridironError::Parse(format!(
                        "invalid season range: {}",
                        text
                    )));
                }
                Ok((first..=last).collect())
            }
            None => Ok(vec![parse(text)?]),
        }
    }
}

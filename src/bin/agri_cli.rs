//! Terminal front end for the fertilizer advisor.
//!
//! Usage:
//!   cargo run --bin agri-cli -- recommend --crop Maize --symptoms "nitrogen deficiency"
//!   cargo run --bin agri-cli -- diagnose leaf.jpg
//!   cargo run --bin agri-cli -- lookup "purple leaves, low phosphorus"

use agri_nourish::{
    config::Config,
    create_advisor, diagnosis, init_tracing, lookup,
    models::{Climate, GrowthStage, SoilQuality},
    view::{Display, RecommendationView},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "agri-cli")]
#[command(about = "Fertilizer advice from crop details and symptoms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the advice form and print the recommendation cards
    Recommend {
        #[arg(long, default_value = "")]
        crop: String,
        #[arg(long, default_value = "Average")]
        soil: SoilQuality,
        #[arg(long, default_value = "Temperate")]
        climate: Climate,
        #[arg(long, default_value = "Vegetative")]
        stage: GrowthStage,
        /// Free-text description of deficiency symptoms
        #[arg(long, default_value = "")]
        symptoms: String,
    },
    /// Diagnose a plant image and print the result as JSON
    Diagnose { path: PathBuf },
    /// Run the keyword lookup on a description
    Lookup { text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(&config.runtime.log_level);

    match cli.command {
        Commands::Recommend {
            crop,
            soil,
            climate,
            stage,
            symptoms,
        } => recommend(&config, crop, soil, climate, stage, symptoms).await,
        Commands::Diagnose { path } => diagnose(&config, &path),
        Commands::Lookup { text } => {
            print_cards(&lookup::recommend(&text));
            Ok(())
        }
    }
}

async fn recommend(
    config: &Config,
    crop: String,
    soil: SoilQuality,
    climate: Climate,
    stage: GrowthStage,
    symptoms: String,
) -> Result<()> {
    let advisor = create_advisor(config)?;

    let mut view = RecommendationView::new();
    view.set_field("cropType", &crop)?;
    view.set_field("soilQuality", soil.as_str())?;
    view.set_field("climate", climate.as_str())?;
    view.set_field("growthStage", stage.as_str())?;
    view.set_field("nutrientDeficiencies", &symptoms)?;

    eprintln!("{}", view.submit_label());
    view.submit(advisor.as_ref()).await?;

    let display = view.display();
    println!("{}", display);
    if let Display::Error(_) = display {
        std::process::exit(1);
    }
    Ok(())
}

fn diagnose(config: &Config, path: &Path) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let result = diagnosis::diagnose(&bytes, config.server.max_image_bytes)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn print_cards(recs: &[agri_nourish::Recommendation]) {
    println!("{}", Display::Cards(recs));
}

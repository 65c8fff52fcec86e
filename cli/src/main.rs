use clap::Parser;
use color_eyre::Result;
use item_scout::{cli::Cli, config::Config, config_path, save_config};
use log::info;
use scout_engine::session::Outcome;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    item_scout::init_logging();
    let args = Cli::parse();

    if args.write_config {
        let path = match &args.config {
            Some(p) => p.clone(),
            None => config_path()?,
        };
        save_config(&path, &Config::default())?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let result = item_scout::run(args).await;
    if let Ok(Outcome::Completed(text)) = &result {
        info!("Finished with {} characters of results", text.len());
    }
    if let Some(msg) = item_scout::final_message(&result) {
        println!("{msg}");
    }
    Ok(())
}

use clap::Parser;
use plz_validator::app::terminal;
use plz_validator::config::Command;
use plz_validator::utils::error::LookupContext;
use plz_validator::utils::{logger, validation::Validate};
use plz_validator::{
    AddressController, CliConfig, FormSettings, LocalityLookup, LocalityQuery, OpenPlzClient,
};
use std::sync::Arc;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting plz-validator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = cli.resolve()?;
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let client = OpenPlzClient::from_config(&config)?;
    tracing::debug!("Using locality endpoint: {}", client.endpoint());

    match cli.command.clone().unwrap_or(Command::Interactive) {
        Command::Interactive => {
            let mut controller =
                AddressController::new(Arc::new(client), FormSettings::from_config(&config));
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();

            eprint!("{}", terminal::HELP_TEXT);
            terminal::run_session(&mut controller, stdin, &mut stdout).await?;
        }
        Command::Lookup {
            name,
            postal_code,
            exact,
        } => {
            let query = LocalityQuery {
                name,
                postal_code,
                exact,
            };

            match client.fetch_localities(&query).await {
                Ok(localities) if localities.is_empty() => {
                    eprintln!("No matching localities.");
                }
                Ok(localities) => {
                    for locality in localities {
                        println!("{}\t{}", locality.postal_code, locality.name);
                    }
                }
                Err(e) => {
                    tracing::error!("❌ Lookup failed: {} (Kind: {:?})", e, e.kind());
                    let context = if query.name.is_some() {
                        LookupContext::Localities
                    } else {
                        LookupContext::PostalCodes
                    };
                    eprintln!("❌ {}", e.user_message(context));
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

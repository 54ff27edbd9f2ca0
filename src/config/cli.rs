use crate::config::toml_config::ValidatorConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "plz-validator")]
#[command(about = "Validate German city / postal code pairs against OpenPLZ")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Override the locality lookup endpoint")]
    pub endpoint: Option<String>,

    #[arg(long, help = "Override the debounce quiet period in milliseconds")]
    pub debounce_ms: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Interactive address form on stdin/stdout (default)
    Interactive,
    /// Run a single locality lookup and print the rows
    Lookup {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        postal_code: Option<String>,
        #[arg(long, help = "Match filters exactly instead of by prefix")]
        exact: bool,
    },
}

impl CliConfig {
    /// 載入配置檔並套用命令列覆寫
    pub fn resolve(&self) -> Result<ValidatorConfig> {
        let mut config = match &self.config {
            Some(path) => ValidatorConfig::from_file(path)?,
            None => ValidatorConfig::default(),
        };

        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config = config.with_debounce_ms(debounce_ms);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ConfigProvider;
    use std::time::Duration;

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = CliConfig::parse_from([
            "plz-validator",
            "--endpoint",
            "http://localhost:9000/de/Localities",
            "--debounce-ms",
            "50",
        ]);

        let config = cli.resolve().unwrap();
        assert_eq!(config.api_endpoint(), "http://localhost:9000/de/Localities");
        assert_eq!(config.debounce(), Duration::from_millis(50));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_lookup_subcommand() {
        let cli = CliConfig::parse_from([
            "plz-validator",
            "lookup",
            "--name",
            "Berlin",
            "--exact",
        ]);

        match cli.command {
            Some(Command::Lookup {
                name,
                postal_code,
                exact,
            }) => {
                assert_eq!(name.as_deref(), Some("Berlin"));
                assert!(postal_code.is_none());
                assert!(exact);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

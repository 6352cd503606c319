use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::core::plan::ToolArgs;
use crate::infra::config::AppConfig;
use crate::tools::registry::build_registry;

#[derive(Parser)]
#[command(name = "planner-agent")]
#[command(about = "Planner agent: answer queries through calc, weather, kb and fx tools")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server, or MCP over stdio when MODE=stdio
    Serve,
    /// Answer one query and print the result
    Ask {
        /// The query; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Call one tool directly, bypassing the planner
    Tool {
        /// Tool name: calc, weather, kb or fx
        name: String,
        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Health check a running server
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => {
            let res = match AppConfig::from_env_and_toml() {
                Ok(cfg) => crate::infra::boot::run_server(cfg).await,
                Err(e) => Err(e.into()),
            };
            match res {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("❌ Server failed: {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Ask { query } => {
            println!("{}", crate::agent::answer(&query.join(" ")).await);
            ExitCode::SUCCESS
        }
        Commands::Tool { name, args } => match call_tool(&name, &args).await {
            Ok(out) => {
                println!("{out}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate: _ } => match validate_config() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn call_tool(name: &str, raw_args: &str) -> anyhow::Result<String> {
    let args: ToolArgs = serde_json::from_str(raw_args)
        .map_err(|e| anyhow::anyhow!("--args must be a JSON object: {e}"))?;
    let cfg = AppConfig::from_env_and_toml()?;
    let registry = build_registry(&cfg, None)?;
    let out = registry.dispatch(name, args).await?;
    Ok(out.to_string())
}

fn validate_config() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = AppConfig::from_env_and_toml()?;
    cfg.validate()?;
    Ok(())
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = crate::infra::runtime::limits::make_http_client()?;
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env() {
        for v in ["AGENT_CONFIG", "MODE", "PORT", "OPENAI_API_KEY", "WEATHER_MODE", "FX_MODE", "KB_PATH"] {
            env::remove_var(v);
        }
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["planner-agent", "ask", "what", "is", "1+1"]).unwrap();
        match cli.command {
            Commands::Ask { query } => assert_eq!(query.join(" "), "what is 1+1"),
            _ => panic!("expected ask"),
        }
        let cli = Cli::try_parse_from(["planner-agent", "tool", "calc", "--args", r#"{"expr":"2*3"}"#]).unwrap();
        assert!(matches!(cli.command, Commands::Tool { ref name, .. } if name == "calc"));
        assert!(Cli::try_parse_from(["planner-agent", "ask"]).is_err());
    }

    #[tokio::test]
    #[serial]
    async fn tool_command_dispatches_offline() {
        clear_env();
        assert_eq!(call_tool("calc", r#"{"expr":"2*3"}"#).await.unwrap(), "6.0");
        assert_eq!(
            call_tool("fx", r#"{"amount":10,"from":"gbp","to":"usd"}"#).await.unwrap(),
            "12.7 USD"
        );
        let err = call_tool("translate", "{}").await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: translate");
        assert!(call_tool("calc", "[1]").await.is_err());
    }

    #[tokio::test]
    #[serial]
    async fn tool_command_exit_codes() {
        clear_env();
        let ok = run_commands(Commands::Tool { name: "calc".into(), args: r#"{"expr":"1"}"#.into() }).await;
        assert_eq!(ok, ExitCode::SUCCESS);
        let bad = run_commands(Commands::Tool { name: "calc".into(), args: "{}".into() }).await;
        assert_eq!(bad, ExitCode::FAILURE);
    }

    #[test]
    #[serial]
    fn validate_config_requires_planner_key() {
        clear_env();
        let err = validate_config().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        env::set_var("OPENAI_API_KEY", "sk-test");
        assert!(validate_config().is_ok());

        env::set_var("MODE", "invalid");
        assert!(validate_config().unwrap_err().to_string().contains("Invalid MODE"));
        clear_env();
    }

    #[test]
    #[serial]
    fn validate_config_live_backend_needs_key() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "sk-test");
        env::set_var("FX_MODE", "live");
        assert!(validate_config().unwrap_err().to_string().contains("FX_API_KEY"));
        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn run_commands_config_paths() {
        clear_env();
        assert_eq!(run_commands(Commands::Config { validate: true }).await, ExitCode::FAILURE);
        env::set_var("OPENAI_API_KEY", "sk-test");
        assert_eq!(run_commands(Commands::Config { validate: true }).await, ExitCode::SUCCESS);
        clear_env();
    }

    #[tokio::test]
    async fn health_check_ok_and_error_paths() {
        use httpmock::prelude::*;
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(200).body("ok");
        });
        assert!(health_check(&server.base_url()).await.is_ok());
        assert_eq!(run_commands(Commands::Health { url: server.base_url() }).await, ExitCode::SUCCESS);

        let bad = MockServer::start();
        bad.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(500);
        });
        assert!(health_check(&bad.base_url()).await.is_err());
    }

    #[tokio::test]
    async fn health_check_unreachable_fails() {
        assert_eq!(
            run_commands(Commands::Health { url: "http://localhost:9".into() }).await,
            ExitCode::FAILURE
        );
    }
}

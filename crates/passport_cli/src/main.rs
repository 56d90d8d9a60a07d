//! Command-line entry point for passport.
//!
//! # Responsibility
//! - Load config once, initialize logging, open the configured database.
//! - Drive the request/response boundary and print status plus JSON body.

use clap::{Parser, Subcommand};
use log::error;
use passport_api::{ApiContext, ApiResponse};
use passport_core::{config_path_from_env, init_logging_from_config, load_config};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "passport", version, about = "Account registration and bearer-token login")]
struct Cli {
    /// Config file; defaults to $CONFIG_FILE, then config.yml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new account.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        first_name: String,
        /// National/citizen id.
        #[arg(long)]
        cid: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and print a bearer token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Resolve a bearer token to the account profile.
    Account {
        #[arg(long)]
        token: String,
    },
    /// Show the public profile of an account id.
    AccountById { id: String },
    /// Print the core version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::Version = cli.command {
        return print_response(&passport_api::home());
    }

    let config_path = cli.config.clone().unwrap_or_else(config_path_from_env);
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("[ERR] read configuration file error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging_from_config(&config.logging) {
        eprintln!("[ERR] logging init failed: {err}");
        return ExitCode::FAILURE;
    }

    let ctx = match ApiContext::from_config(&config) {
        Ok(ctx) => ctx,
        Err(err) => {
            error!("event=cli_start module=cli status=error error={err}");
            eprintln!("[ERR] {err}");
            return ExitCode::FAILURE;
        }
    };

    let response = run(&ctx, cli.command);
    print_response(&response)
}

fn run(ctx: &ApiContext, command: Command) -> ApiResponse {
    match command {
        Command::Register {
            name,
            first_name,
            cid,
            username,
            password,
        } => {
            let body = json!({
                "name": name,
                "first_name": first_name,
                "cid": cid,
                "username": username,
                "password": password,
            });
            passport_api::register(ctx, &body.to_string())
        }
        Command::Login { username, password } => {
            let body = json!({ "username": username, "password": password });
            passport_api::login(ctx, &body.to_string())
        }
        Command::Account { token } => {
            let header = format!("{}{}", passport_core::BEARER_PREFIX, token.trim());
            passport_api::account(ctx, Some(header.as_str()))
        }
        Command::AccountById { id } => passport_api::account_by_id(ctx, &id),
        Command::Version => passport_api::home(),
    }
}

fn print_response(response: &ApiResponse) -> ExitCode {
    println!("{} {}", response.status, response.body);
    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

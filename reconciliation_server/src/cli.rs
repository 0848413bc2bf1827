use std::{env, env::VarError};

use recon_common::SecretUrl;

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "RECON_HOST",
        "RECON_PORT",
        "RECON_MAX_CONNECTIONS",
        "RECON_SETTLEMENT_CURRENCY",
        "RECON_EXCHANGE_RATES",
        "RECON_PROJECT_CODES",
        "RECON_REPLAY_WINDOW_DAYS",
        "RECON_INSERT_CHUNK_SIZE",
        "RECON_RECOVERY_BATCH_SIZE",
        "RECON_RUN_MIGRATIONS",
    ];

    println!("Current environment values (credentials are masked):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    });
    let url = env::var("RECON_DATABASE_URL").map(SecretUrl::new).map(|u| u.to_string());
    println!("  {:<35} {:<15}", "RECON_DATABASE_URL", url.unwrap_or_else(|_| "Not set".into()));
}

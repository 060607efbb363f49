//! Interactive mode for the server.
//!
//! Prompts for the bind address, port and fiscal year before starting.

use dialoguer::{Confirm, Input};
use nj_sdwa_dashboard::DashboardConfig;

/// Runs the server in interactive mode.
///
/// Sets `BIND_ADDR` and `PORT` from the answers and delegates to
/// [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run(mut config: DashboardConfig) -> std::io::Result<()> {
    println!("NJ Safe Drinking Water Server");
    println!();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default("127.0.0.1".to_string())
        .interact_text()
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default("8080".to_string())
        .interact_text()
        .unwrap_or_else(|_| "8080".to_string());

    config.fiscal_year = Input::new()
        .with_prompt("Fiscal year of the system inventory")
        .default(config.fiscal_year)
        .interact_text()
        .unwrap_or(config.fiscal_year);

    // SAFETY: the server has not started yet and nothing else reads these
    // variables concurrently.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port_str}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(config).await
}

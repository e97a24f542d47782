mod domain;
mod error;
mod excel;
mod food_log;
mod formulas;
mod goal;
mod server;
mod session;
mod stats;
mod trend;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::domain::FoodReference;
use crate::excel::load_food_reference;
use crate::server::AppState;
use crate::session::SessionStore;

/// Personal health calculator and calorie intake tracker.
#[derive(Parser, Debug)]
#[command(name = "healthtrack")]
#[command(about = "Weight goal calculator and session-based calorie tracker")]
#[command(version)]
struct Args {
    /// Path to the Excel file with per-100g food nutrient values.
    /// Can also be set via HEALTHTRACK_FOOD_FILE environment variable.
    #[arg(
        value_name = "FILE",
        env = "HEALTHTRACK_FOOD_FILE",
        default_value = "food_data.xlsx"
    )]
    food_file: PathBuf,

    /// Port number for the web server.
    /// Can also be set via HEALTHTRACK_PORT environment variable.
    #[arg(value_name = "PORT", env = "HEALTHTRACK_PORT", default_value = "8080")]
    port: u16,

    /// Directory with frontend files to serve.
    /// Can also be set via HEALTHTRACK_STATIC_DIR environment variable.
    #[arg(long, value_name = "DIR", env = "HEALTHTRACK_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Maximum number of tracker sessions held at once.
    #[arg(
        long,
        value_name = "N",
        env = "HEALTHTRACK_MAX_SESSIONS",
        default_value_t = session::DEFAULT_MAX_SESSIONS
    )]
    max_sessions: usize,

    /// Minutes without changes after which a tracker session expires.
    #[arg(
        long,
        value_name = "MINUTES",
        env = "HEALTHTRACK_SESSION_IDLE_MINUTES",
        default_value_t = 120
    )]
    session_idle_minutes: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    // A missing food table disables the calorie tracker only
    println!("Loading food data from: {}", args.food_file.display());
    let foods = load_foods(&args.food_file);

    let static_dir = find_static_dir(args.static_dir);
    if let Some(dir) = &static_dir {
        println!("Static files: {}", dir.display());
    }

    let sessions = SessionStore::with_limits(
        args.max_sessions,
        Duration::from_secs(args.session_idle_minutes.saturating_mul(60)),
    );
    let state = Arc::new(AppState::new(foods, sessions));

    println!();
    server::run_server(state, args.port, static_dir).await?;

    Ok(())
}

/// Loads the food reference table and prints a summary.
///
/// Load failures are logged and returned as the message shown by the
/// calorie tracker endpoints.
fn load_foods(path: &Path) -> Result<FoodReference, String> {
    match load_food_reference(path) {
        Ok(reference) => {
            println!();
            println!("=== Food Reference Summary ===");
            println!();
            println!("Food items: {}", reference.len());
            if reference.is_empty() {
                log::warn!("Food table {} has no usable rows", path.display());
            }
            Ok(reference)
        }
        Err(e) => {
            log::error!("Failed to load food data: {}", e);
            println!("Calorie tracker disabled: {}", e);
            Err(format!(
                "Food data unavailable ({}). Provide a food_data.xlsx file and restart.",
                e
            ))
        }
    }
}

/// Finds the static directory for serving frontend files.
fn find_static_dir(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }

    // Try relative to current working directory
    let cwd_static = PathBuf::from("static");
    if cwd_static.is_dir() {
        return Some(cwd_static);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        let exe_static = exe_dir.join("static");
        if exe_static.is_dir() {
            return Some(exe_static);
        }
    }

    None
}

use anyhow::Result;
use chrono::{Datelike, Local};
use common::BackendConfig;
use planner::{AppState, models::UserProfile};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Go Girl planner");

    let config = BackendConfig::from_env()?;
    if !config.is_assistant_configured() {
        info!("No assistant API key set, assistant disabled");
    }

    let state = AppState::init(config).await;
    let owner_id = state.session.owner_id();
    info!(
        "Signed in as {} ({})",
        owner_id,
        if state.backend.is_configured() {
            "hosted backend"
        } else {
            "offline"
        }
    );

    let today = Local::now().date_naive();

    let tasks = state.tasks_page(today);
    tasks.mount().await;
    info!("{} task(s) planned for {}", tasks.tasks().len(), today);
    for task in tasks.tasks() {
        info!(
            "  {}-{} {} [{}]{}",
            task.start_time,
            task.end_time,
            task.title,
            task.category,
            if task.is_completed { " done" } else { "" }
        );
    }

    let budget = state.budget_page();
    budget.load().await;
    let totals = budget.totals();
    info!(
        "Spent {:.2}, income {:.2}, balance {:.2}",
        totals.spent,
        totals.income,
        totals.balance()
    );
    for (category, share) in budget.breakdown() {
        info!("  {}: {:.1}%", category, share);
    }

    let mut profile = state.profile_page(UserProfile::new(owner_id.clone(), owner_id));
    profile.load_logs().await;
    let glowing_days = profile
        .heatmap(today.year())
        .iter()
        .filter(|cell| cell.points > 0)
        .count();
    info!(
        "Glow streak: {} day(s), {} glowing day(s) this year",
        profile.streak_days(today),
        glowing_days
    );

    if std::env::args().any(|arg| arg == "--watch") {
        info!("Watching task changes, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
    }

    tasks.unmount();
    state.teardown();

    info!("Planner stopped");
    Ok(())
}

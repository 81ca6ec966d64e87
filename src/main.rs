//! Dazno CLI
//!
//! Operator console for the Dazno backend:
//! - Watch realtime updates
//! - Review and act on recommendations
//! - Tune automation
//! - Check connectivity

use anyhow::Context;
use clap::{Parser, Subcommand};
use dazno_dashboard::api::{DashboardClient, SimulationResult};
use dazno_dashboard::config::{Config, LoggingConfig};
use dazno_dashboard::dashboard::{self, Dashboard, RecommendationFilter, ScheduleTime};
use dazno_dashboard::notify::{Notification, NotificationCenter};
use dazno_dashboard::realtime::RealtimeChannel;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "dazno")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator console for Dazno Lightning node management")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow realtime updates until interrupted
    Watch,

    /// Test backend connections
    Status,

    /// Show metric cards
    Metrics,

    /// List recommendations
    Recommendations {
        /// Priority filter (all, high, medium, low)
        #[arg(short, long, default_value = "all")]
        priority: String,
        /// Action type filter (all, open_channel, close_channel, adjust_fees, rebalance_channel)
        #[arg(short = 't', long = "type", default_value = "all")]
        action_type: String,
    },

    /// Approve a recommendation
    Approve { id: String },

    /// Reject a recommendation
    Reject { id: String },

    /// Execute a recommendation now
    AutoExecute { id: String },

    /// Simulate a recommendation
    Simulate { id: String },

    /// Schedule a recommendation
    Schedule {
        id: String,
        /// "optimal" or a time such as "2024-03-01 14:00"
        #[arg(long, default_value = "optimal")]
        at: String,
    },

    /// Automation settings
    Automation {
        #[command(subcommand)]
        command: AutomationCommands,
    },

    /// Force a deep analysis
    Analyze,

    /// Node analytics and competitive analysis
    Analytics,

    /// Backend health
    Health,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AutomationCommands {
    /// Show current settings
    Settings,
    /// Set the automation mode
    Mode { mode: String },
    /// Set the daily action limit
    MaxActions { max_actions: u32 },
    /// Turn auto-execution on or off
    AutoExecution {
        #[arg(value_parser = parse_switch)]
        enabled: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        return write_default_config(output.as_ref());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_tracing(&config.logging);

    let client = DashboardClient::new(&config.api)?;
    let notifications = Arc::new(NotificationCenter::new(Duration::from_millis(
        config.dashboard.notification_duration_ms,
    )));
    let dashboard = Dashboard::new(client, Arc::clone(&notifications), &config.dashboard);
    let json = cli.format == "json";

    match cli.command {
        Commands::Watch => watch(&config, dashboard).await?,

        Commands::Status => {
            let mut rx = notifications.subscribe();
            let ok = dashboard.test_connections().await;
            print_notifications(&mut rx);

            let status = dashboard.view().await.service_status;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("MCP: {}", connected_label(status.mcp_connected));
                println!("LND: {}", connected_label(status.lnd_connected));
            }
            exit_unless(ok);
        }

        Commands::Metrics => {
            dashboard.load_dashboard_data().await;
            let view = dashboard.snapshot().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&view.metric_cards)?);
            } else if view.metric_cards.is_empty() {
                println!("No metrics available.");
            } else {
                println!("{:<24} {}", "Metric", "Value");
                println!("{}", "-".repeat(40));
                for card in &view.metric_cards {
                    println!("{:<24} {}", card.label, card.value);
                }
            }
        }

        Commands::Recommendations {
            priority,
            action_type,
        } => {
            let filter = RecommendationFilter::parse(&priority, &action_type)
                .map_err(anyhow::Error::msg)?;

            if !dashboard.load_recommendations().await {
                eprintln!("Failed to load recommendations from {}", config.api.base_url);
                std::process::exit(1);
            }
            dashboard.update(|view| view.set_filter(filter)).await;

            let view = dashboard.view().await;
            let visible = view.visible_recommendations();

            if json {
                println!("{}", serde_json::to_string_pretty(&visible)?);
            } else if visible.is_empty() {
                println!("No recommendations.");
            } else {
                println!(
                    "{:<20} {:<8} {:<18} {:>8}  {}",
                    "ID", "Priority", "Type", "ROI", "Description"
                );
                println!("{}", "-".repeat(80));
                for rec in visible {
                    println!(
                        "{:<20} {:<8} {:<18} {:>7}%  {}",
                        rec.id,
                        rec.priority.as_class(),
                        rec.action_type.display_name(),
                        format!("+{}", rec.expected_roi_impact),
                        rec.description
                    );
                }
            }
        }

        Commands::Approve { id } => {
            let mut rx = notifications.subscribe();
            let ok = dashboard.approve(&id).await;
            print_notifications(&mut rx);
            exit_unless(ok);
        }

        Commands::Reject { id } => {
            let mut rx = notifications.subscribe();
            let ok = dashboard.reject(&id).await;
            print_notifications(&mut rx);
            exit_unless(ok);
        }

        Commands::AutoExecute { id } => {
            let mut rx = notifications.subscribe();
            let ok = dashboard.auto_execute(&id).await;
            print_notifications(&mut rx);

            if let Some([today, rate, gained]) = dashboard.view().await.automation.stats_texts() {
                println!("Actions today: {}  Success rate: {}  ROI gained: {}", today, rate, gained);
            }
            exit_unless(ok);
        }

        Commands::Simulate { id } => {
            let mut rx = notifications.subscribe();
            let result = dashboard.simulate(&id).await;
            print_notifications(&mut rx);

            match result {
                Some(simulation) if json => {
                    println!("{}", serde_json::to_string_pretty(&simulation)?)
                }
                Some(simulation) => print_simulation(&simulation),
                None => std::process::exit(1),
            }
        }

        Commands::Schedule { id, at } => {
            let mut rx = notifications.subscribe();
            let ok = dashboard.schedule(&id, ScheduleTime::parse(&at)).await;
            print_notifications(&mut rx);
            exit_unless(ok);
        }

        Commands::Automation { command } => {
            let mut rx = notifications.subscribe();
            let ok = match command {
                AutomationCommands::Settings => {
                    let ok = dashboard.load_automation_settings().await;
                    if let Some(settings) = &dashboard.view().await.automation.settings {
                        println!("{}", serde_json::to_string_pretty(settings)?);
                    }
                    ok
                }
                AutomationCommands::Mode { mode } => dashboard.set_automation_mode(&mode).await,
                AutomationCommands::MaxActions { max_actions } => {
                    let ok = dashboard.set_max_actions(max_actions).await;
                    if ok {
                        println!("Max daily actions set to {}", max_actions);
                    }
                    ok
                }
                AutomationCommands::AutoExecution { enabled } => {
                    dashboard.set_auto_execution(enabled).await
                }
            };
            print_notifications(&mut rx);
            exit_unless(ok);
        }

        Commands::Analyze => {
            let mut rx = notifications.subscribe();
            let found = dashboard.force_deep_analysis().await;
            print_notifications(&mut rx);
            exit_unless(found.is_some());
        }

        Commands::Analytics => {
            let client = dashboard.client();
            let analytics = client
                .node_analytics()
                .await
                .context("Failed to fetch node analytics")?;
            let competitive = client
                .competitive_analysis()
                .await
                .context("Failed to fetch competitive analysis")?;

            if json {
                let body = serde_json::json!({
                    "node": analytics,
                    "competitive": competitive,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("Node analytics ({})", analytics.last_calculated.format("%Y-%m-%d %H:%M UTC"));
                println!("  Performance score:  {:.1}", analytics.performance_score);
                println!("  ROI current:        {:.1}%", analytics.roi_current);
                println!("  ROI predicted 30d:  {:.1}%", analytics.roi_predicted_30d);
                println!("  Efficiency:         {:.1}", analytics.efficiency_score);
                println!("  Risk:               {:.1}", analytics.risk_score);
                println!("  Centrality:         {:.1}", analytics.centrality_score);
                println!("  Liquidity:          {:.1}", analytics.liquidity_score);
                println!("  Reliability:        {:.1}", analytics.reliability_score);
                println!("  Growth potential:   {:.1}", analytics.growth_potential);
                println!();
                println!("Competitive analysis");
                println!("{}", serde_json::to_string_pretty(&competitive)?);
            }
        }

        Commands::Health => {
            let health = dashboard
                .client()
                .health()
                .await
                .context("Health check failed")?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }

        Commands::Config { output } => write_default_config(output.as_ref())?,
    }

    Ok(())
}

/// Run the live dashboard until Ctrl-C
async fn watch(config: &Config, dashboard: Dashboard) -> anyhow::Result<()> {
    let mut rx = dashboard.notifications().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(n) => print_notification(&n),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification output lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    dashboard.initialize().await;
    print_overview(&dashboard).await;

    let channel = RealtimeChannel::new(config.realtime.reconnect_policy());
    dashboard::attach(&channel, &dashboard).await;
    channel.open(config.realtime_url());

    let refresh = dashboard::spawn_refresh(
        dashboard.clone(),
        Duration::from_secs(config.dashboard.metrics_refresh_secs),
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tracing::info!("Shutting down...");
    refresh.abort();
    channel.close().await;
    printer.abort();

    print_overview(&dashboard).await;
    Ok(())
}

async fn print_overview(dashboard: &Dashboard) {
    let view = dashboard.view().await;

    println!(
        "Services: {}",
        connected_label(view.status_indicator_connected())
    );
    if let Some(roi) = &view.roi {
        println!(
            "ROI: {} ({}) {}",
            roi.value_text(),
            roi.trend_class(),
            roi.prediction_text()
        );
    }
    for card in &view.metric_cards {
        println!("  {:<24} {}", card.label, card.value);
    }
    println!("Recommendations: {}", view.recommendations.len());
}

fn print_notification(n: &Notification) {
    println!("{} {}", n.level.icon(), n.message);
}

/// Print what the last action reported
fn print_notifications(rx: &mut broadcast::Receiver<Notification>) {
    while let Ok(n) = rx.try_recv() {
        print_notification(&n);
    }
}

fn print_simulation(simulation: &SimulationResult) {
    println!("Simulation for {}", simulation.recommendation_id);
    println!("  Predicted ROI impact: +{}%", simulation.roi_impact);
    println!("  Success probability:  {}%", simulation.success_probability);
    println!("  Risk level:           {}", simulation.risk_level);
    println!("  Estimated cost:       {} sats", simulation.estimated_cost);

    if !simulation.timeline.is_empty() {
        println!();
        println!("Execution timeline:");
        for step in &simulation.timeline {
            println!("  {:<10} {:<40} {}%", step.time, step.action, step.probability);
        }
    }
}

fn connected_label(connected: bool) -> &'static str {
    if connected {
        "connected"
    } else {
        "disconnected"
    }
}

fn exit_unless(ok: bool) {
    if !ok {
        std::process::exit(1);
    }
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "enable" | "enabled" | "yes" => Ok(true),
        "off" | "false" | "disable" | "disabled" | "no" => Ok(false),
        _ => Err(format!("expected on or off, got {}", s)),
    }
}

fn write_default_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = dazno_dashboard::config::generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => print!("{}", config),
    }
    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "dazno_dashboard={level},dazno={level}",
            level = config.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

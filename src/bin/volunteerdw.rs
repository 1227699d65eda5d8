use clap::{Parser, Subcommand};
use volunteerdw::{DateInput, HistoryFilter, HistoryPage, PeriodComparison, Role, VolunteerDW};

#[derive(Parser)]
#[command(name = "volunteerdw", about = "Completed-service history and period reports")]
struct Cli {
    /// Database path (default: ~/.volunteerdw/volunteerdw.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List an actor's completed matches
    History {
        /// Account id of the requester or volunteer
        #[arg(long)]
        actor: i64,
        /// Side of the match: pin/requester or csr/volunteer
        #[arg(long, value_parser = parse_role)]
        role: Role,
        /// Exact service type
        #[arg(long)]
        service_type: Option<String>,
        /// Completed on or after (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Completed on or before (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(long, default_value = "1")]
        page: String,
        #[arg(long)]
        json: bool,
    },
    /// Show one completed match
    Details {
        match_id: i64,
        #[arg(long)]
        actor: i64,
        #[arg(long, value_parser = parse_role)]
        role: Role,
        #[arg(long)]
        json: bool,
    },
    /// List the service types in an actor's completed history
    ServiceTypes {
        #[arg(long)]
        actor: i64,
        #[arg(long, value_parser = parse_role)]
        role: Role,
    },
    /// Period statistics compared to the previous period
    Report {
        #[command(subcommand)]
        target: ReportTarget,
    },
    /// Shortlist counts for a requester's requests
    Shortlists {
        #[arg(long)]
        requester: i64,
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show store status
    Status,
}

#[derive(Subcommand)]
enum ReportTarget {
    /// One calendar day
    Daily {
        /// Anchor date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// The Monday-to-Sunday week containing the anchor
    Weekly {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// The calendar month containing the anchor (YYYY-MM also accepted)
    Monthly {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse(s).ok_or_else(|| format!("unknown role '{s}', use pin or csr"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => volunteerdw::Database::open_at(path).await?,
        None => volunteerdw::Database::open().await?,
    };
    let dw = VolunteerDW::new(db);

    match cli.command {
        Commands::Status => {
            print_status(&dw).await?;
        }
        Commands::Config { action } => {
            handle_config(&dw, action).await?;
        }
        Commands::History {
            actor,
            role,
            service_type,
            from,
            to,
            page,
            json,
        } => {
            let filter = HistoryFilter {
                service_type,
                from_date: from.map(DateInput::from),
                to_date: to.map(DateInput::from),
            };
            let page = volunteerdw::pagination::parse_page(&page);
            let result = dw.search_completed(actor, role, &filter, page as i64).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_history(&result);
            }
        }
        Commands::Details {
            match_id,
            actor,
            role,
            json,
        } => {
            let m = dw.view_details(actor, role, match_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&m)?);
            } else {
                println!("Match {} ({})", m.match_id, m.status);
                println!("  Request:      {} (#{})", m.request_title, m.request_id);
                println!("  Service type: {}", m.service_type.as_deref().unwrap_or("-"));
                println!("  Requester:    {}", m.requester_name.as_deref().unwrap_or("-"));
                println!("  Volunteer:    {}", m.volunteer_name.as_deref().unwrap_or("-"));
                println!("  Created:      {}", m.created_at);
                println!("  Completed:    {}", m.completed_at.as_deref().unwrap_or("-"));
                if let Some(notes) = &m.notes {
                    println!("  Notes:        {notes}");
                }
            }
        }
        Commands::ServiceTypes { actor, role } => {
            let types = dw.service_types(actor, role).await?;
            if types.is_empty() {
                println!("No completed service history.");
            }
            for st in types {
                println!("{st}");
            }
        }
        Commands::Report { target } => {
            handle_report(&dw, target).await?;
        }
        Commands::Shortlists { requester, json } => {
            let counts = dw.shortlist_counts(requester).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&counts)?);
            } else if counts.is_empty() {
                println!("No requests.");
            } else {
                for c in counts {
                    println!("  #{:<6} {:<40} {}", c.request_id, c.title, c.shortlist_count);
                }
            }
        }
    }

    Ok(())
}

async fn print_status(dw: &VolunteerDW) -> anyhow::Result<()> {
    let counts = dw
        .db()
        .reader()
        .call(|conn| volunteerdw::storage::repository::store_counts(conn))
        .await?;

    println!("Store Status");
    println!("  Users:      {}", counts.users);
    println!("  Categories: {}", counts.categories);
    println!("  Requests:   {}", counts.requests);
    println!("  Matches:    {} ({} completed)", counts.matches, counts.completed_matches);
    println!(
        "  Last completion: {}",
        counts.last_completed_at.unwrap_or_else(|| "never".to_string())
    );
    println!("  Page size:  {}", dw.page_size().await?);
    Ok(())
}

async fn handle_config(dw: &VolunteerDW, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match dw.config_get(&key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            dw.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = dw.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

async fn handle_report(dw: &VolunteerDW, target: ReportTarget) -> anyhow::Result<()> {
    match target {
        ReportTarget::Daily { date, json } => {
            let anchor = date.map(DateInput::from);
            let r = dw.daily_report(anchor.as_ref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&r)?);
            } else {
                println!("Daily Report: {}", r.report_date);
                print_comparison(&r.comparison);
            }
        }
        ReportTarget::Weekly { date, json } => {
            let anchor = date.map(DateInput::from);
            let r = dw.weekly_report(anchor.as_ref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&r)?);
            } else {
                println!("Weekly Report: {} to {}", r.week_start, r.week_end);
                print_comparison(&r.comparison);
            }
        }
        ReportTarget::Monthly { date, json } => {
            let anchor = date.map(DateInput::from);
            let r = dw.monthly_report(anchor.as_ref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&r)?);
            } else {
                println!("Monthly Report: {} to {}", r.month_start, r.month_end);
                print_comparison(&r.comparison);
            }
        }
    }
    Ok(())
}

fn print_history(page: &HistoryPage) {
    let meta = &page.page_meta;
    println!(
        "Completed matches: {} (page {} of {})",
        page.total_count, meta.page, meta.total_pages
    );
    for m in &page.items {
        println!(
            "  #{:<6} {:<20} {:<30} {}",
            m.match_id,
            m.completed_at.as_deref().unwrap_or(&m.created_at),
            m.request_title,
            m.service_type.as_deref().unwrap_or("-"),
        );
    }
    if page.items.is_empty() && page.total_count > 0 {
        println!("  (no items on this page)");
    }
}

fn print_comparison(c: &PeriodComparison) {
    println!("  Period: {} ({} to {})", c.period_key, c.current_start, c.current_end);
    let rows = [
        ("New requests", &c.changes.new_requests),
        ("Completed requests", &c.changes.completed_requests),
        ("New matches", &c.changes.new_matches),
        ("Completed matches", &c.changes.completed_matches),
        ("New shortlists", &c.changes.new_shortlists),
        ("New users", &c.changes.new_users),
        ("Total requests", &c.changes.total_requests),
        ("Pending requests", &c.changes.pending_requests),
    ];
    for (label, fc) in rows {
        match (fc.change, fc.change_percent) {
            (Some(change), Some(pct)) => {
                println!("    {label:<20} {:>6}  {change:+} ({pct:+.1}%)", fc.value)
            }
            _ => println!("    {label:<20} {:>6}", fc.value),
        }
    }
    if !c.category_breakdown.is_empty() {
        println!("  Categories:");
        for b in &c.category_breakdown {
            let inactive = if b.is_active { "" } else { " (inactive)" };
            println!(
                "    {:<30} new {:>4}  completed {:>4}{inactive}",
                b.category_title, b.new_requests, b.completed_requests
            );
        }
    }
}

mod aura;
mod config;
mod db;
mod error;
mod focus;
mod heatmap;
mod ledger;
mod models;
mod parse;
mod ports;
mod state;
mod stats;
mod tui;

use chrono::Utc;
use clap::{Parser, Subcommand};

use config::Config;
use db::Database;
use error::{AuraError, Result};
use heatmap::DayCell;
use models::{AuraTier, JsonOutput, Submission, TopicRecord};
use state::StudyState;

const MAX_HEATMAP_DAYS: u64 = 3660;

#[derive(Parser)]
#[command(name = "aura")]
#[command(about = "A spaced-repetition study tracker that ranks topics by urgency")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Whose topics to work with (defaults to $AURA_OWNER or "local")
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Record a study cycle for a topic (creates it on first use)
    Submit {
        /// Topic name
        name: String,

        /// Self-test result before studying, e.g. 6/10
        #[arg(long, short)]
        before: String,

        /// Self-test result after studying, e.g. 9/10
        #[arg(long, short)]
        after: String,

        /// Confidence label: baixo, médio or alto
        #[arg(long, short, default_value = "")]
        confidence: String,

        /// Comma-separated tags
        #[arg(long, short)]
        tags: Option<String>,
    },

    /// Manage topics
    #[command(subcommand)]
    Topic(TopicCommands),

    /// Manage past review cycles
    #[command(subcommand)]
    Cycle(CycleCommands),

    /// List all tags
    Tags,

    /// Show study statistics
    Stats,

    /// Show the topics to focus on next
    Focus {
        /// Maximum number of topics
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show questions answered per day
    Heatmap {
        /// Number of days to show, ending today (1 to 3660)
        #[arg(
            long,
            short,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=MAX_HEATMAP_DAYS)
        )]
        days: Option<usize>,
    },

    /// Launch interactive terminal UI
    Tui,
}

#[derive(Subcommand)]
enum TopicCommands {
    /// List all topics
    List {
        /// Filter by tag
        #[arg(long, short)]
        tag: Option<String>,

        /// Filter by name (accents and case ignored)
        #[arg(long, short)]
        search: Option<String>,

        /// Only show one aura tier: urgent, unstable or consolidated
        #[arg(long)]
        tier: Option<String>,
    },

    /// Show topic details and cycle history
    Show {
        /// Topic ID
        id: i64,
    },

    /// Delete a topic and its history
    Delete {
        /// Topic ID
        id: i64,
    },

    /// Update topic tags
    Tag {
        /// Topic ID
        id: i64,

        /// Comma-separated tags (replaces existing)
        #[arg(long, short)]
        tags: String,
    },
}

#[derive(Subcommand)]
enum CycleCommands {
    /// Delete one past cycle by position (0 = oldest). A position past the
    /// last cycle deletes nothing and still succeeds.
    Delete {
        /// Topic ID
        id: i64,

        /// Cycle position
        index: usize,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            let output = JsonOutput::<()>::err(e.to_string());
            println!("{}", serde_json::to_string(&output).unwrap_or_default());
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.owner.clone());
    let db = Database::open(&config.db_path)?;

    if let Commands::Init = cli.command {
        db.init()?;
        if cli.json {
            println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
        } else {
            println!("Database initialized at: {}", config.db_path.display());
        }
        return Ok(());
    }

    let mut state = StudyState::load(&db, &config.owner)?;
    let now = Utc::now();

    match cli.command {
        Commands::Init => unreachable!("handled above"),

        Commands::Submit {
            name,
            before,
            after,
            confidence,
            tags,
        } => {
            let submission = Submission {
                name,
                result_before: before,
                result_after: after,
                confidence,
                tags: split_tags(tags.as_deref().unwrap_or("")),
            };
            let record = state.submit(submission, now, &db)?;
            let tier = aura::classify(record, now);

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "topic": record,
                        "tier": tier
                    })))?
                );
            } else if record.cycle_count == 0 {
                println!("Added topic '{}' with ID: {}", record.name, record.id);
                println!("Aura: {}", tier.label());
            } else {
                println!(
                    "Updated topic '{}' (cycle {} recorded).",
                    record.name,
                    record.cycle_count + 1
                );
                println!("Aura: {}", tier.label());
            }
        }

        Commands::Topic(topic_cmd) => match topic_cmd {
            TopicCommands::List { tag, search, tier } => {
                let tier = match tier {
                    Some(raw) => Some(AuraTier::from_str(&raw).ok_or_else(|| {
                        let known = [AuraTier::Urgent, AuraTier::Unstable, AuraTier::Consolidated]
                            .map(|t| t.as_str())
                            .join(", ");
                        AuraError::InvalidInput(format!("unknown tier '{}' (expected {})", raw, known))
                    })?),
                    None => None,
                };
                state.filter(tag, search);
                let topics: Vec<_> = state
                    .displayed()
                    .into_iter()
                    .filter(|r| tier.map_or(true, |t| aura::classify(r, now) == t))
                    .collect();
                if cli.json {
                    let rows: Vec<_> = topics
                        .iter()
                        .map(|r| serde_json::json!({ "topic": r, "tier": aura::classify(r, now) }))
                        .collect();
                    println!("{}", serde_json::to_string(&JsonOutput::ok(rows))?);
                } else if topics.is_empty() {
                    println!("No topics found.");
                } else {
                    println!(
                        "{:<5} {:<32} {:<13} {:>7} {:>7} {:>6}  TAGS",
                        "ID", "NAME", "AURA", "BEFORE", "AFTER", "CYCLES"
                    );
                    println!("{}", "-".repeat(90));
                    for r in topics {
                        println!(
                            "{:<5} {:<32} {:<13} {:>6.0}% {:>6.0}% {:>6}  {}",
                            r.id,
                            truncate(&r.name, 30),
                            aura::classify(r, now).label(),
                            r.percent_before,
                            r.percent_after,
                            r.cycle_count,
                            tag_list(&r.tags)
                        );
                    }
                }
            }

            TopicCommands::Show { id } => {
                let record = state.find(id).ok_or(AuraError::TopicNotFound(id))?;
                let score = aura::score(record, now);

                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                            "topic": record,
                            "tier": score.tier(),
                            "score": score
                        })))?
                    );
                } else {
                    print_topic(record);
                    println!();
                    println!("--- Aura ---");
                    println!("Tier: {} (score {})", score.tier().label(), score.total);
                    println!(
                        "Performance +{}  Recency +{}  Confidence +{}",
                        score.performance, score.recency, score.confidence
                    );
                    print_history(record);
                }
            }

            TopicCommands::Delete { id } => {
                state.delete_topic(id, &db)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                } else {
                    println!("Topic {} deleted.", id);
                }
            }

            TopicCommands::Tag { id, tags } => {
                state.find(id).ok_or(AuraError::TopicNotFound(id))?;
                db.update_topic_tags(id, &split_tags(&tags))?;

                if cli.json {
                    let record = db.get_record(id)?;
                    println!("{}", serde_json::to_string(&JsonOutput::ok(record))?);
                } else {
                    println!("Updated tags for topic {}.", id);
                }
            }
        },

        Commands::Cycle(CycleCommands::Delete { id, index }) => {
            let deleted = state.delete_cycle(id, index, &db)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({ "deleted": deleted })))?
                );
            } else if deleted {
                println!("Cycle {} of topic {} deleted.", index, id);
            } else {
                println!("Topic {} has no cycle {}; nothing deleted.", id, index);
            }
        }

        Commands::Tags => {
            let tags = db.list_tags(&config.owner)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&tags))?);
            } else if tags.is_empty() {
                println!("No tags found.");
            } else {
                println!("{:<5} {:<30} TOPICS", "ID", "TAG");
                println!("{}", "-".repeat(50));
                for tag in tags {
                    println!("{:<5} {:<30} {}", tag.id, tag.name, tag.topic_count);
                }
            }
        }

        Commands::Stats => {
            let stats = stats::summarize(&state.records, now);
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&stats))?);
            } else {
                println!("=== Study Statistics ===");
                println!("Total topics: {}", stats.total_topics);
                println!("Past cycles: {}", stats.total_cycles);
                println!("Questions answered: {}", stats.total_questions);
                println!("Pooled after-study score: {}%", stats.pooled_after_percent);
                println!("Most recent topic: {}", stats.most_recent_topic);
                println!(
                    "Urgent / Unstable / Consolidated: {} / {} / {}",
                    stats.urgent, stats.unstable, stats.consolidated
                );
            }
        }

        Commands::Focus { limit } => {
            let limit = limit.unwrap_or(config.focus_limit);
            let focus = focus::select_focus_set(&state.records, now, limit);
            if cli.json {
                let rows: Vec<_> = focus
                    .iter()
                    .map(|r| serde_json::json!({ "topic": r, "tier": aura::classify(r, now) }))
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(rows))?);
            } else if focus.is_empty() {
                println!("Nothing to focus on. Submit a topic first!");
            } else {
                println!("=== Focus ===");
                for (i, r) in focus.iter().enumerate() {
                    println!(
                        "{}. {:<32} {:<13} last revised {}",
                        i + 1,
                        truncate(&r.name, 30),
                        aura::classify(r, now).label(),
                        r.revision_date.as_deref().map(short_date).unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        Commands::Heatmap { days } => {
            let days = days.unwrap_or(config.heatmap_days);
            let volume = stats::daily_question_volume(&state.records);
            let grid = heatmap::activity_grid(&volume, now.date_naive(), days);
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&grid))?);
            } else {
                print_grid(&grid);
            }
        }

        Commands::Tui => {
            tui::run(db, state, config)?;
        }
    }

    Ok(())
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn tag_list(tags: &[String]) -> String {
    if tags.is_empty() {
        String::from("-")
    } else {
        tags.join(", ")
    }
}

fn print_topic(record: &TopicRecord) {
    println!("Topic: {}", record.name);
    println!("ID: {}", record.id);
    println!("Tags: {}", tag_list(&record.tags));
    println!(
        "Before: {} ({:.0}%)  After: {} ({:.0}%)",
        record.result_before, record.percent_before, record.result_after, record.percent_after
    );
    println!("Confidence: {}", record.confidence_level().label());
    if let Some(date) = &record.revision_date {
        println!("Last revised: {}", short_date(date));
    }
}

fn print_history(record: &TopicRecord) {
    if record.history.is_empty() {
        return;
    }
    println!();
    println!("--- Past cycles ({}) ---", record.cycle_count);
    for (i, cycle) in record.history.iter().enumerate() {
        println!(
            "[{}] {:<12} before {:<8} after {:<8} {}",
            i,
            short_date(&cycle.date),
            cycle.result_before,
            cycle.result_after,
            cycle.confidence
        );
    }
}

// Most recent day first, ten days per row
fn print_grid(grid: &[DayCell]) {
    const SHADES: [char; 5] = ['·', '░', '▒', '▓', '█'];
    for row in grid.chunks(10) {
        let Some(first) = row.first() else { continue };
        let cells: String = row
            .iter()
            .map(|c| if c.is_today { '◆' } else { SHADES[c.tier as usize] })
            .collect();
        let total = heatmap::window_total(row);
        println!("{}  {}  {:>5} questions", first.date.format("%b %d"), cells, total);
    }
}

fn short_date(raw: &str) -> String {
    match parse::parse_revision(raw) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => raw.chars().take(10).collect(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

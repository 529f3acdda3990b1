use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use studysync::config::{get_config_path, resolve_group_path, Config};
use studysync::models::{JsonOutput, Resource};
use studysync::priority::{days_until, study_order};
use studysync::snapshot::diagnose;
use studysync::{Classifier, Error, GroupSnapshot, NewResource, Result};

const DEFAULT_NEXT_LIMIT: usize = 10;

#[derive(Parser)]
#[command(name = "studysync")]
#[command(about = "Shows each member of a study group what to study next")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to the group snapshot (JSON)
    #[arg(long, short, global = true)]
    group: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every topic in syllabus order
    Topics,

    /// Show the units and concepts of one subject
    Units {
        /// Subject name
        subject: String,
    },

    /// List scheduled tests
    Tests {
        /// Evaluate urgency as of this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Show the urgency tier of every topic for a learner
    Priorities {
        /// Learner username
        learner: String,

        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Show what a learner should study next, most urgent first
    Next {
        /// Learner username
        learner: String,

        /// Maximum number of topics to show
        #[arg(long, short, default_value_t = DEFAULT_NEXT_LIMIT)]
        limit: usize,

        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Rank group members by progress
    Leaderboard,

    /// Report problems in the group snapshot
    Check,

    /// Start a new group file with a fresh invite code
    Create {
        /// Group name
        name: String,

        /// Username of the group owner
        #[arg(long)]
        owner: String,
    },

    /// Join the group with its invite code
    Join {
        /// Username joining the group
        username: String,

        /// Invite code shared by a member
        #[arg(long)]
        code: String,
    },

    /// List group members
    Members,

    /// List approved resources
    Resources {
        /// Show resources waiting for approval instead
        #[arg(long)]
        pending: bool,
    },

    /// Submit a resource for approval
    AddResource {
        /// Resource title
        title: String,

        /// Username submitting the resource
        #[arg(long)]
        by: String,

        /// Resource type (video, pdf, notes, ...)
        #[arg(long = "type")]
        kind: Option<String>,

        /// Link to the resource
        #[arg(long)]
        link: Option<String>,

        /// Short description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Approve a pending resource
    Approve {
        /// Resource id
        id: String,
    },

    /// Reject a pending resource
    Reject {
        /// Resource id
        id: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    let result = Config::load(get_config_path()).and_then(|config| {
        init_logging(&config);
        run(cli, &config)
    });

    if let Err(e) = result {
        if json {
            if let Ok(out) = serde_json::to_string(&JsonOutput::<()>::err(e.to_string())) {
                println!("{}", out);
            }
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let group_path = resolve_group_path(cli.group, config);

    if let Commands::Create { name, owner } = &cli.command {
        if group_path.exists() {
            return Err(Error::GroupExists(group_path));
        }
        let snapshot = GroupSnapshot::create(name.as_str(), owner.as_str());
        snapshot.save(&group_path)?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                    "name": snapshot.name,
                    "invite_code": snapshot.invite_code,
                    "path": group_path,
                })))?
            );
        } else {
            println!("Created group '{}' at {}", snapshot.name, group_path.display());
            println!("Invite code: {}", snapshot.invite_code);
        }
        return Ok(());
    }

    let mut snapshot = GroupSnapshot::load(&group_path)?;
    let classifier = Classifier::new(config.urgent_window_days);

    match cli.command {
        Commands::Topics => {
            let topics = snapshot.topics();
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&topics))?);
            } else if topics.is_empty() {
                println!("No topics in the syllabus yet.");
            } else {
                println!("{:<5} {:<20} {:<20} CONCEPT", "#", "SUBJECT", "UNIT");
                println!("{}", "-".repeat(70));
                let mut pos = 1;
                for sub in &snapshot.syllabus.subjects {
                    for unit in &sub.units {
                        for concept in &unit.concepts {
                            println!(
                                "{:<5} {:<20} {:<20} {}",
                                pos,
                                truncate(&sub.subject_name, 18),
                                truncate(&unit.unit_name, 18),
                                concept
                            );
                            pos += 1;
                        }
                    }
                }
            }
        }

        Commands::Units { subject } => {
            let units = snapshot.syllabus.units_for_subject(&subject);
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "units": units
                    })))?
                );
            } else if units.is_empty() {
                println!("No units found for '{}'.", subject);
            } else {
                println!("=== {} ===", subject);
                for unit in units {
                    println!();
                    println!("{}", unit.unit_name);
                    for concept in &unit.concepts {
                        println!("  - {}", concept);
                    }
                }
            }
        }

        Commands::Tests { today } => {
            let now = resolve_now(today.as_deref())?;
            if cli.json {
                let rows: Vec<_> = snapshot
                    .tests
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "test": t,
                            "portion": t.portion_label(),
                            "days_until": days_until(t.date, now),
                            "urgent": classifier.is_urgent(t, now),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(rows))?);
            } else if snapshot.tests.is_empty() {
                println!("No tests scheduled.");
            } else {
                println!(
                    "{:<12} {:<25} {:<10} {:<7} PORTION",
                    "DATE", "NAME", "TYPE", "URGENT"
                );
                println!("{}", "-".repeat(80));
                for test in &snapshot.tests {
                    println!(
                        "{:<12} {:<25} {:<10} {:<7} {}",
                        test.date.format("%Y-%m-%d"),
                        truncate(&test.name, 23),
                        test.kind.as_deref().unwrap_or("-"),
                        if classifier.is_urgent(test, now) { "yes" } else { "" },
                        truncate(&test.portion_label(), 40)
                    );
                }
            }
        }

        Commands::Priorities { learner, today } => {
            let now = resolve_now(today.as_deref())?;
            let map = snapshot.priorities(&learner, &classifier, now);
            let topics = snapshot.topics();

            if cli.json {
                let rows: Vec<_> = topics
                    .iter()
                    .filter_map(|t| {
                        map.get(t)
                            .map(|tier| serde_json::json!({ "topic": t, "tier": tier }))
                    })
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(rows))?);
            } else if topics.is_empty() {
                println!("No topics in the syllabus yet.");
            } else {
                println!("{:<18} TOPIC", "TIER");
                println!("{}", "-".repeat(70));
                for topic in &topics {
                    if let Some(tier) = map.get(topic) {
                        println!("{:<18} {}", tier.label(), topic);
                    }
                }
            }
        }

        Commands::Next {
            learner,
            limit,
            today,
        } => {
            let now = resolve_now(today.as_deref())?;
            let map = snapshot.priorities(&learner, &classifier, now);
            let plan: Vec<_> = study_order(&snapshot.topics(), &map)
                .into_iter()
                .take(limit)
                .collect();

            if cli.json {
                let rows: Vec<_> = plan
                    .iter()
                    .map(|(topic, tier)| serde_json::json!({ "topic": topic, "tier": tier }))
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(rows))?);
            } else if plan.is_empty() {
                println!("Nothing to study. Add some syllabus content first!");
            } else {
                println!("=== Study plan for {} ===", learner);
                println!();
                for (i, (topic, tier)) in plan.iter().enumerate() {
                    println!("{:>3}. [{}] {}", i + 1, tier.label(), topic);
                }
            }
        }

        Commands::Leaderboard => {
            let stats = snapshot.leaderboard();
            let total = snapshot.syllabus.total_concepts();
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "total_concepts": total,
                        "stats": stats
                    })))?
                );
            } else if stats.is_empty() {
                println!("No progress recorded yet.");
            } else {
                println!("{:<5} {:<25} {:>6} {:>8}", "RANK", "LEARNER", "DONE", "PERCENT");
                println!("{}", "-".repeat(48));
                for (i, stat) in stats.iter().enumerate() {
                    println!(
                        "{:<5} {:<25} {:>6} {:>7.1}%",
                        i + 1,
                        truncate(&stat.username, 23),
                        format!("{}/{}", stat.count, total),
                        stat.percentage
                    );
                }
            }
        }

        Commands::Check => {
            let issues = diagnose(&snapshot);
            if cli.json {
                let messages: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(messages))?);
            } else if issues.is_empty() {
                println!("No problems found in '{}'.", snapshot.name);
            } else {
                println!("Found {} problem(s) in '{}':", issues.len(), snapshot.name);
                for issue in &issues {
                    println!("  - {}", issue);
                }
            }
        }

        // Handled before the snapshot is loaded
        Commands::Create { .. } => {}

        Commands::Join { username, code } => {
            let joined = snapshot.join(&username, &code)?;
            if joined {
                snapshot.save(&group_path)?;
            }
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "username": username,
                        "joined": joined,
                    })))?
                );
            } else if joined {
                println!("{} joined '{}'.", username, snapshot.name);
            } else {
                println!("{} is already a member of '{}'.", username, snapshot.name);
            }
        }

        Commands::Members => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&snapshot.members))?);
            } else if snapshot.members.is_empty() {
                println!("No members yet.");
            } else {
                for member in &snapshot.members {
                    if snapshot.owner.as_deref() == Some(member.as_str()) {
                        println!("{} (owner)", member);
                    } else {
                        println!("{}", member);
                    }
                }
            }
        }

        Commands::Resources { pending } => {
            let list = if pending {
                &snapshot.pending_resources
            } else {
                &snapshot.resources
            };
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(list))?);
            } else if list.is_empty() {
                if pending {
                    println!("No resources waiting for approval.");
                } else {
                    println!("No approved resources yet.");
                }
            } else {
                println!(
                    "{:<26} {:<30} {:<8} {:<12} LINK",
                    "ID", "TITLE", "TYPE", "ADDED BY"
                );
                println!("{}", "-".repeat(100));
                for res in list {
                    println!(
                        "{:<26} {:<30} {:<8} {:<12} {}",
                        res.id,
                        truncate(&res.title, 28),
                        truncate(res.kind.as_deref().unwrap_or("-"), 8),
                        truncate(&res.added_by, 12),
                        res.link.as_deref().unwrap_or("-")
                    );
                }
            }
        }

        Commands::AddResource {
            title,
            by,
            kind,
            link,
            description,
        } => {
            let new = NewResource {
                title,
                description,
                kind,
                link,
            };
            let id = snapshot.add_resource(new, &by, Utc::now());
            snapshot.save(&group_path)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({ "id": id })))?
                );
            } else {
                println!("Submitted resource {} for approval.", id);
            }
        }

        Commands::Approve { id } => {
            let moved = snapshot.approve_resource(&id);
            if moved.is_some() {
                snapshot.save(&group_path)?;
            }
            print_moderation(cli.json, &id, moved.as_ref(), "Approved")?;
        }

        Commands::Reject { id } => {
            let dropped = snapshot.reject_resource(&id);
            if dropped.is_some() {
                snapshot.save(&group_path)?;
            }
            print_moderation(cli.json, &id, dropped.as_ref(), "Rejected")?;
        }
    }

    Ok(())
}

fn print_moderation(json: bool, id: &str, resource: Option<&Resource>, verb: &str) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&JsonOutput::ok(resource))?);
        return Ok(());
    }
    match resource {
        Some(res) => println!("{} '{}' from {}.", verb, res.title, res.added_by),
        None => println!("No pending resource with id '{}'.", id),
    }
    Ok(())
}

fn resolve_now(today: Option<&str>) -> Result<DateTime<Utc>> {
    match today {
        Some(s) => parse_today(s),
        None => Ok(Utc::now()),
    }
}

fn parse_today(s: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::InvalidDate(s.to_string()))?;
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use luna_core::*;
use serde_json::json;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "luna")]
#[command(about = "Private, on-device menstrual cycle tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Journal to open (one per user)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a day (a period day when --flow is given)
    Log {
        /// Day to record (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Flow intensity (spotting, light, medium, heavy)
        #[arg(long, value_parser = parse_flow)]
        flow: Option<FlowIntensity>,

        /// Symptom id, repeatable (e.g. cramps:2, med:ibuprofen)
        #[arg(long = "symptom")]
        symptoms: Vec<String>,

        /// Mood, repeatable
        #[arg(long = "mood")]
        moods: Vec<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Hours slept
        #[arg(long)]
        sleep: Option<f64>,

        /// Water intake in ml
        #[arg(long)]
        water: Option<u32>,

        /// Stress level (1-5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        stress: Option<u8>,

        #[arg(long)]
        exercise: bool,
    },

    /// List recorded entries
    List {
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        oldest_first: bool,
    },

    /// Delete an entry by id
    Delete { id: Uuid },

    /// Predict the next period from logged data
    Predict,

    /// Check how much cycle lengths vary
    Regularity,

    /// Symptom, mood, flow and lifestyle summary
    Insights,

    /// Current cycle day and next expected period (default)
    Status {
        /// Evaluate as of this day instead of today
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Print the data summary handed to the chat assistant
    ///
    /// With --json, prints the full chat request body instead.
    Context {
        #[arg(long)]
        today: Option<NaiveDate>,

        /// JSON array of prior chat messages to include in the request
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Show or change cycle settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Export all entries to a CSV file
    Export { path: PathBuf },
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        cycle_length: Option<u32>,

        #[arg(long)]
        period_length: Option<u32>,

        #[arg(long)]
        last_period_start: Option<NaiveDate>,
    },
}

fn parse_flow(s: &str) -> std::result::Result<FlowIntensity, String> {
    FlowIntensity::parse(s).ok_or_else(|| {
        format!("unknown flow '{}', expected spotting, light, medium or heavy", s)
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        luna_core::logging::init_with_level("debug");
    } else {
        luna_core::logging::init();
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }
    if let Some(user) = cli.user {
        config.data.user = user;
    }
    config.validate()?;

    let mut store = FileStore::new(config.user_dir());
    tracing::debug!("Using journal at {:?}", store.journal_path());
    let today = Local::now().date_naive();
    let out = Output { json: cli.json };

    match cli.command {
        Some(Commands::Log {
            date,
            flow,
            symptoms,
            moods,
            notes,
            sleep,
            water,
            stress,
            exercise,
        }) => {
            let log_type = if flow.is_some() {
                LogType::Period
            } else if !symptoms.is_empty() {
                LogType::Symptom
            } else if !moods.is_empty() {
                LogType::Mood
            } else {
                LogType::Note
            };

            let mut entry = LogEntry::new(date.unwrap_or(today), log_type);
            entry.flow_intensity = flow;
            entry.symptoms = symptoms;
            entry.moods = moods;
            entry.notes = notes;
            entry.sleep_hours = sleep;
            entry.water_intake = water;
            entry.stress_level = stress;
            entry.exercise = exercise;

            cmd_log(&mut store, entry, &out)
        }
        Some(Commands::List {
            limit,
            oldest_first,
        }) => cmd_list(&store, limit, oldest_first, &out),
        Some(Commands::Delete { id }) => cmd_delete(&mut store, id, &out),
        Some(Commands::Predict) => cmd_predict(&store, &config, &out),
        Some(Commands::Regularity) => cmd_regularity(&store, &out),
        Some(Commands::Insights) => cmd_insights(&store, &out),
        Some(Commands::Status { today: as_of }) => {
            cmd_status(&store, &config, as_of.unwrap_or(today), &out)
        }
        Some(Commands::Context {
            today: as_of,
            history,
        }) => cmd_context(&store, &config, as_of.unwrap_or(today), history.as_deref(), &out),
        Some(Commands::Settings { action }) => cmd_settings(&mut store, &config, action, &out),
        Some(Commands::Export { path }) => cmd_export(&store, &path, &out),
        None => cmd_status(&store, &config, today, &out),
    }
}

struct Output {
    json: bool,
}

impl Output {
    fn print_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn cmd_log(store: &mut FileStore, entry: LogEntry, out: &Output) -> Result<()> {
    let stored = record_entry(store, entry)?;

    if out.json {
        return out.print_json(&stored);
    }
    println!("✓ Logged {} for {}", stored.log_type, stored.date);
    println!("  id: {}", stored.id);
    Ok(())
}

fn cmd_list(store: &FileStore, limit: Option<usize>, oldest_first: bool, out: &Output) -> Result<()> {
    let order = if oldest_first {
        ListOrder::OldestFirst
    } else {
        ListOrder::NewestFirst
    };
    let entries = store.list(order, limit)?;

    if out.json {
        return out.print_json(&entries);
    }
    if entries.is_empty() {
        println!("No entries yet.");
        return Ok(());
    }
    for entry in &entries {
        let mut line = format!("{}  {:<8}", entry.date, entry.log_type.as_str());
        if let Some(flow) = entry.flow_intensity {
            line.push_str(&format!("  flow: {}", flow));
        }
        if !entry.symptoms.is_empty() {
            line.push_str(&format!("  symptoms: {}", entry.symptoms.join(", ")));
        }
        if !entry.moods.is_empty() {
            line.push_str(&format!("  moods: {}", entry.moods.join(", ")));
        }
        println!("{}  [{}]", line, entry.id);
    }
    Ok(())
}

fn cmd_delete(store: &mut FileStore, id: Uuid, out: &Output) -> Result<()> {
    let removed = store.delete(id)?;

    if out.json {
        return out.print_json(&json!({ "id": id, "deleted": removed }));
    }
    if removed {
        println!("✓ Deleted entry {}", id);
    } else {
        println!("No entry with id {}", id);
    }
    Ok(())
}

/// Stored settings with missing lengths filled from the config
fn effective_settings(store: &FileStore, config: &Config) -> Result<CycleSettings> {
    Ok(config.defaults.apply(&store.settings_or_default()?))
}

fn cmd_predict(store: &FileStore, config: &Config, out: &Output) -> Result<()> {
    let logs = store.list(ListOrder::OldestFirst, None)?;
    let settings = effective_settings(store, config)?;
    let prediction = predict(&logs, &settings)?;

    if out.json {
        return out.print_json(&prediction);
    }
    match prediction {
        Some(p) => display_prediction(&p),
        None => println!("Not enough data to predict yet. Log at least two periods."),
    }
    Ok(())
}

fn display_prediction(p: &CyclePrediction) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  NEXT PERIOD");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {}", p.predicted_date.format("%b %-d, %Y"));
    if p.range_start != p.range_end {
        println!(
            "  Range: {} – {}",
            p.range_start.format("%b %-d"),
            p.range_end.format("%b %-d")
        );
    }
    println!("  {} confidence", p.confidence);
    println!();
    println!("  \"{}\"", p.insight);
    println!();
}

fn cmd_regularity(store: &FileStore, out: &Output) -> Result<()> {
    let logs = store.list(ListOrder::OldestFirst, None)?;
    let verdict = classify_regularity(&logs)?;

    if out.json {
        return out.print_json(&verdict);
    }
    match (verdict.average, verdict.min, verdict.max) {
        (Some(avg), Some(min), Some(max)) => {
            let lengths: Vec<String> = verdict.cycle_lengths.iter().map(|l| l.to_string()).collect();
            println!("Cycle lengths: {}", lengths.join(", "));
            println!("Average: {} days (shortest {}, longest {})", avg, min, max);
            if verdict.is_irregular {
                println!("⚠ Irregular: cycle lengths vary by {} days", max - min);
            } else {
                println!("✓ Regular: cycle lengths vary by {} days", max - min);
            }
        }
        _ => println!("Not enough cycles tracked to judge regularity."),
    }
    Ok(())
}

fn cmd_insights(store: &FileStore, out: &Output) -> Result<()> {
    let logs = store.list(ListOrder::NewestFirst, None)?;
    let summary = summarize(&logs);

    if out.json {
        return out.print_json(&summary);
    }
    println!("Entries: {} ({} period days)", summary.total_logs, summary.period_days);
    print_frequencies("Top symptoms", &summary.symptoms);
    print_frequencies("Medications", &summary.medications);
    print_frequencies("Moods", &summary.moods);
    if !summary.flow_distribution.is_empty() {
        println!("\nFlow:");
        for (flow, count) in &summary.flow_distribution {
            println!("  {:<10} {}", flow.as_str(), count);
        }
    }
    if let Some(sleep) = summary.avg_sleep_hours {
        println!("\nAverage sleep: {:.1} h", sleep);
    }
    if let Some(water) = summary.avg_water_intake {
        println!("Average water: {} ml", water);
    }
    if let Some(stress) = summary.avg_stress_level {
        println!("Average stress: {:.1}", stress);
    }
    Ok(())
}

fn print_frequencies(title: &str, items: &[insights::Frequency]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}:", title);
    for item in items {
        println!("  {:<20} {}", item.name, item.count);
    }
}

fn cmd_status(store: &FileStore, config: &Config, today: NaiveDate, out: &Output) -> Result<()> {
    let settings = effective_settings(store, config)?;
    let status = cycle_status(&settings, today);

    if out.json {
        return out.print_json(&status);
    }
    println!("Cycle day {} of {}", status.cycle_day, status.cycle_length);
    match status.next_period_date {
        Some(date) if status.next_period_in == 0 => println!("Next period expected today ({})", date),
        Some(date) => println!(
            "Next period expected in {} days ({})",
            status.next_period_in,
            date.format("%b %-d")
        ),
        None if settings.last_period_start.is_some() => {
            println!("Next period date is past the supported calendar range.")
        }
        None => println!("Log a period to start tracking your cycle."),
    }
    Ok(())
}

fn cmd_context(
    store: &FileStore,
    config: &Config,
    today: NaiveDate,
    history: Option<&std::path::Path>,
    out: &Output,
) -> Result<()> {
    let logs = store.list(ListOrder::NewestFirst, None)?;
    let stored = store.load_settings()?;
    let settings = stored.as_ref().map(|s| config.defaults.apply(s));
    let prediction = predict(&logs, &settings.clone().unwrap_or_default())?;
    let context = build_context(&logs, settings.as_ref(), prediction.as_ref(), today);

    if out.json {
        let messages: Vec<ChatMessage> = match history {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => Vec::new(),
        };
        return out.print_json(&ChatRequest::new(&context, &messages));
    }
    print!("{}", context);
    Ok(())
}

fn cmd_settings(
    store: &mut FileStore,
    config: &Config,
    action: SettingsAction,
    out: &Output,
) -> Result<()> {
    if let SettingsAction::Set {
        cycle_length,
        period_length,
        last_period_start,
    } = action
    {
        if cycle_length == Some(0) || period_length == Some(0) {
            return Err(Error::Config("lengths must be positive".into()));
        }
        // Only the flags given are stored; config defaults stay live
        store.update_settings(&mut |current| {
            let mut stored = current.unwrap_or_default();
            if let Some(len) = cycle_length {
                stored.average_cycle_length = Some(len);
            }
            if let Some(len) = period_length {
                stored.average_period_length = Some(len);
            }
            if let Some(date) = last_period_start {
                stored.last_period_start = Some(date);
            }
            Ok(stored)
        })?;
        if !out.json {
            println!("✓ Settings saved");
        }
    }

    let settings = effective_settings(store, config)?;

    if out.json {
        return out.print_json(&settings);
    }
    println!("Average cycle length:  {} days", settings.cycle_length());
    println!("Average period length: {} days", settings.period_length());
    match settings.last_period_start {
        Some(date) => println!("Last period start:     {}", date),
        None => println!("Last period start:     not set"),
    }
    Ok(())
}

fn cmd_export(store: &FileStore, path: &std::path::Path, out: &Output) -> Result<()> {
    let logs = store.list(ListOrder::OldestFirst, None)?;
    let count = export_csv(&logs, path)?;

    if out.json {
        return out.print_json(&json!({ "exported": count, "path": path }));
    }
    println!("✓ Exported {} entries", count);
    println!("  CSV: {}", path.display());
    Ok(())
}

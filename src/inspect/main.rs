//! Standalone inspector for the bot's data file.
//!
//! Loads a data file the same way the bot does, prints a summary of the
//! stored state and flags entries worth a look.

use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::Parser;

use membership_bot::config::DEFAULT_DATA_FILE;
use membership_bot::state::{JsonFileStore, Snapshot, SnapshotStore, UserId};

/// Data file inspector.
#[derive(Parser, Debug)]
#[command(name = "inspect_state")]
#[command(about = "Inspects the persisted state of the membership bot")]
#[command(version)]
struct Args {
    /// Path to the data file to inspect.
    #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
    file: String,

    /// Comma separated main owner ids used to seed defaults.
    #[arg(long, default_value = "")]
    owners: String,

    /// Write a default data file to the specified path and exit.
    #[arg(long)]
    write_defaults: Option<String>,

    /// List every premium entry and counter.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let owners: Vec<UserId> = args
        .owners
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect();

    if let Some(output_path) = args.write_defaults {
        return write_defaults(&output_path, owners);
    }

    inspect(&args.file, owners, args.verbose)
}

fn write_defaults(output_path: &str, owners: Vec<UserId>) -> ExitCode {
    let snapshot = Snapshot::with_owners(&owners);
    let store = JsonFileStore::new(output_path, owners);

    match store.save(&snapshot) {
        Ok(()) => {
            println!("✓ Default data file written to: {output_path}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write data file: {e}");
            ExitCode::FAILURE
        }
    }
}

fn inspect(path: &str, owners: Vec<UserId>, verbose: bool) -> ExitCode {
    println!("Inspecting: {path}\n");

    let snapshot = match JsonFileStore::new(path, owners).load_strict() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("✗ Failed to load data file: {e}");
            return ExitCode::FAILURE;
        }
    };

    let now = Utc::now().timestamp();
    let (active, expired): (Vec<_>, Vec<_>) =
        snapshot.premium.iter().partition(|&(_, &expiry)| expiry > now);

    println!("Groups tracked:     {}", snapshot.groups.len());
    println!("Users registered:   {}", snapshot.users.len());
    println!("Delegated owners:   {}", snapshot.owner.len());
    println!("Executives:         {}", snapshot.ceo.len());
    println!("Blacklisted:        {}", snapshot.blacklist.len());
    println!("Premium (active):   {}", active.len());
    println!("Premium (expired):  {}", expired.len());
    println!("Cooldown:           {} minutes", snapshot.settings.cooldown_minutes());
    println!(
        "Maintenance:        {}",
        if snapshot.settings.maintenance { "ON" } else { "OFF" }
    );

    if verbose {
        println!("\nPremium entries:");
        for (user, expiry) in &snapshot.premium {
            println!("  {user}: {}", format_expiry(*expiry));
        }

        println!("\nGroup counters:");
        for (user, count) in &snapshot.user_group_count {
            println!("  {user}: {count}");
        }
    }

    let mut warnings = 0;

    if !expired.is_empty() {
        warnings += 1;
        println!(
            "\n⚠ {} expired premium entries are waiting for the next sweep",
            expired.len()
        );
    }

    if let Some((counted, tracked)) = counter_excess(&snapshot) {
        warnings += 1;
        println!("⚠ Group counters sum to {counted} but only {tracked} groups are tracked");
    }

    let blacklisted_premium = snapshot
        .blacklist
        .iter()
        .filter(|&&id| snapshot.premium.contains_key(&id))
        .count();
    if blacklisted_premium > 0 {
        warnings += 1;
        println!("⚠ {blacklisted_premium} blacklisted users still hold premium");
    }

    println!();
    if warnings == 0 {
        println!("✓ Data file looks consistent");
    } else {
        println!("✓ Data file loaded with {warnings} warning(s)");
    }

    ExitCode::SUCCESS
}

fn format_expiry(expiry: i64) -> String {
    DateTime::<Utc>::from_timestamp(expiry, 0)
        .map_or_else(|| expiry.to_string(), |d| d.format("%Y-%m-%d %H:%M UTC").to_string())
}

/// Returns the counter sum and group count when counters exceed tracked groups.
fn counter_excess(snapshot: &Snapshot) -> Option<(u64, u64)> {
    let counted: u64 = snapshot.user_group_count.values().map(|&c| u64::from(c)).sum();
    let tracked = u64::try_from(snapshot.groups.len()).unwrap_or(u64::MAX);
    (counted > tracked).then_some((counted, tracked))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_excess_sums_without_overflow() {
        let mut snapshot = Snapshot::default();
        snapshot.groups = vec![-1, -2];
        snapshot.user_group_count.insert(1, u32::MAX);
        snapshot.user_group_count.insert(2, u32::MAX);

        assert_eq!(
            counter_excess(&snapshot),
            Some((2 * u64::from(u32::MAX), 2))
        );
    }

    #[test]
    fn test_counter_excess_within_tracked() {
        let mut snapshot = Snapshot::default();
        snapshot.groups = vec![-1, -2];
        snapshot.user_group_count.insert(1, 2);

        assert_eq!(counter_excess(&snapshot), None);
    }
}

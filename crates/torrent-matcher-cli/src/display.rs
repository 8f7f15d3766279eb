use colored::*;
use torrent_matcher_core::{
    ApplyReport, AppConfig, ControlPlane, ManifestEntry, MatchSession, MatchStatus, RenamePlan,
    TorrentInfo,
};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size in base-1024 units with one decimal.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

pub fn print_match_summary<C: ControlPlane + ?Sized>(session: &MatchSession<'_, C>) {
    let outcome = session.outcome();
    println!();
    println!(
        "{} of {} torrent files matched in {}",
        format!("{}", outcome.matched_count).green(),
        outcome.total_files,
        session.scan_root().display()
    );

    for result in outcome.results.iter() {
        let entry = &result.manifest_entry;
        match result.status() {
            MatchStatus::Selected => {
                if let Some(file) = &result.selected {
                    println!("  {} {} <- {}", "✓".green(), entry.name, file.path.display());
                }
            }
            MatchStatus::Ambiguous => println!(
                "  {} {} ({} candidates, {})",
                "?".yellow(),
                entry.name,
                result.candidates.len(),
                format_size(entry.size)
            ),
            MatchStatus::Unmatched => println!(
                "  {} {} ({})",
                "✗".red(),
                entry.name,
                format_size(entry.size)
            ),
        }
    }
}

pub fn print_plan(plan: &RenamePlan) {
    println!();
    if plan.is_empty() {
        println!("{}", "Nothing to rename.".green());
        return;
    }
    println!("{} rename(s) planned:", format!("{}", plan.len()).cyan());
    for op in &plan.ops {
        println!("  {}", op.old_path.display());
        println!("    {} {}", "->".cyan(), op.new_path.display());
    }
}

pub fn print_apply_report(report: &ApplyReport) {
    println!(
        "{} renamed, {} failed",
        format!("{}", report.success_count).green(),
        format!("{}", report.failure_count).red()
    );
    for failure in &report.failures {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failure.op.manifest_name,
            failure.error
        );
    }
}

pub fn print_would_skip(entries: &[&ManifestEntry]) {
    if entries.is_empty() {
        println!("No unmatched files to skip");
        return;
    }
    println!("{}", "Would skip:".yellow());
    for entry in entries {
        println!("  {} ({})", entry.name, format_size(entry.size));
    }
}

pub fn print_torrents(torrents: &[TorrentInfo]) {
    if torrents.is_empty() {
        println!("No torrents.");
        return;
    }
    for t in torrents {
        println!(
            "{} {} [{:.1}%, {}, {}]",
            t.hash.dimmed(),
            t.name.bold(),
            t.progress * 100.0,
            format_size(t.size),
            t.state
        );
        println!("    {}", t.save_path);
    }
}

pub fn print_files(files: &[ManifestEntry]) {
    for f in files {
        println!(
            "{:>5} {:>6.1}% {:>10}  {}",
            f.index,
            f.progress * 100.0,
            format_size(f.size),
            f.name
        );
    }
}

pub fn print_config(config: &AppConfig) {
    let password = if config.password.is_empty() {
        "(not set)"
    } else {
        "********"
    };
    println!("url: {}", config.url);
    println!("username: {}", config.username);
    println!("password: {}", password);
    println!("require_same_extension: {}", config.require_same_extension);
    println!("request_timeout_secs: {}", config.request_timeout_secs);
    println!("ignore_patterns: {:?}", config.ignore_patterns);
}

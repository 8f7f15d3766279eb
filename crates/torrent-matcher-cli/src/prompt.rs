use colored::*;
use std::io::{self, Write};
use torrent_matcher_core::{ControlPlane, MatchResult, MatchSession, MatchStatus};

use crate::display::format_size;

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

/// Ask the user to pick one candidate. `None` means skip.
pub fn choose_candidate(result: &MatchResult) -> io::Result<Option<usize>> {
    let entry = &result.manifest_entry;
    println!();
    println!(
        "{} {} ({})",
        "?".yellow(),
        entry.name.bold(),
        format_size(entry.size)
    );
    for (i, candidate) in result.candidates.iter().enumerate() {
        println!("  [{}] {}", i + 1, candidate.path.display());
    }
    println!("  [0] Skip");

    let mut input = String::new();
    loop {
        input.clear();
        print!("Select [0-{}]: ", result.candidates.len());
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        match parse_choice(&input, result.candidates.len()) {
            Some(0) => return Ok(None),
            Some(n) => return Ok(Some(n - 1)),
            None => println!("Please enter a number between 0 and {}", result.candidates.len()),
        }
    }
}

/// Walk every ambiguous result and record the user's choice.
pub fn resolve_interactively<C: ControlPlane + ?Sized>(
    session: &mut MatchSession<'_, C>,
) -> io::Result<()> {
    let pending: Vec<usize> = session
        .selections()
        .results()
        .iter()
        .enumerate()
        .filter(|(_, r)| r.status() == MatchStatus::Ambiguous)
        .map(|(position, _)| position)
        .collect();

    for position in pending {
        let Some(result) = session.selections().get(position).cloned() else {
            continue;
        };
        if let Some(choice) = choose_candidate(&result)? {
            session.select(position, result.candidates[choice].clone());
        }
    }
    Ok(())
}

fn parse_choice(input: &str, candidates: usize) -> Option<usize> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&n| n <= candidates)
}

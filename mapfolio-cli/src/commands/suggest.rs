//! Suggest command - print place predictions for a partial query.

use console::style;
use mapfolio::config::ConfigFile;
use mapfolio::provider::{PlaceSuggestion, PlacesService, SessionToken};
use tracing::debug;

use super::common::{build_runtime, places_service};
use crate::error::CliError;

/// Run the suggest command.
pub fn run(config: &ConfigFile, query: &str, resolve: Option<usize>) -> Result<(), CliError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::InvalidArgument(
            "query must not be empty".to_string(),
        ));
    }

    let places = places_service(config)?;
    let session = SessionToken::generate();
    debug!(%session, query, "Autocomplete session");

    let runtime = build_runtime()?;
    let suggestions = runtime.block_on(places.autocomplete(query, &session))?;

    if suggestions.is_empty() {
        println!("No places match '{}'", query);
        return Ok(());
    }
    for (index, suggestion) in suggestions.iter().enumerate() {
        println!("{}", format_suggestion(index, suggestion));
    }

    let Some(choice) = resolve else {
        return Ok(());
    };
    let suggestion = choice
        .checked_sub(1)
        .and_then(|i| suggestions.get(i))
        .ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "--resolve {} is outside 1..={}",
                choice,
                suggestions.len()
            ))
        })?;

    let details = runtime.block_on(places.place_details(&suggestion.place_id, &session))?;
    println!();
    println!("{}", style(&details.formatted_address).bold());
    println!("  city:     {}", details.city);
    println!("  location: {}", details.location);
    Ok(())
}

fn format_suggestion(index: usize, suggestion: &PlaceSuggestion) -> String {
    match &suggestion.secondary_text {
        Some(secondary) => format!(
            "{:>2}. {} {}",
            index + 1,
            style(&suggestion.primary_text).bold(),
            style(secondary).dim()
        ),
        None => format!("{:>2}. {}", index + 1, style(&suggestion.description).bold()),
    }
}

//! Plain-text rendering of records, sections and search results.

use std::fmt::Write;

use shiori_api::CatalogRecord;
use shiori_core::collections::CollectionKind;
use shiori_core::search::SearchSnapshot;

const TITLE_WIDTH: usize = 40;

/// One line per record: id, title, score, year, episodes, status.
pub fn record_line(record: &CatalogRecord) -> String {
    let year = record
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".into());
    format!(
        "{:>6}  {:<width$}  {:>4}  {}  {:>4} eps  {}",
        record.id,
        truncate(&record.title, TITLE_WIDTH),
        record.display_score(),
        year,
        record.display_episodes(),
        record.status.label(),
        width = TITLE_WIDTH,
    )
}

/// A titled list of records.
pub fn section(title: &str, records: &[CatalogRecord]) -> String {
    let mut out = format!("== {title} ==\n");
    if records.is_empty() {
        out.push_str("  (nothing to show)\n");
    }
    for record in records {
        let _ = writeln!(out, "{}", record_line(record));
    }
    out
}

/// Full detail page, with the collections the title is saved in.
pub fn detail(record: &CatalogRecord, saved_in: &[CollectionKind]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", record.title);
    if let Some(english) = record.title_english.as_deref().filter(|t| *t != record.title) {
        let _ = writeln!(out, "  {english}");
    }
    if let Some(japanese) = &record.title_japanese {
        let _ = writeln!(out, "  {japanese}");
    }
    out.push('\n');

    let mut rows = vec![
        ("Score", record.display_score()),
        ("Status", record.status.label().to_string()),
        ("Type", record.show_type.clone()),
        ("Episodes", record.display_episodes()),
    ];
    if record.episode_length > 0 {
        rows.push(("Length", format!("{} min per ep", record.episode_length)));
    }
    rows.extend([
        ("Aired", record.aired_range()),
        ("Rating", record.display_age_rating()),
        ("Popularity", rank(record.popularity_rank)),
        ("Ranked", rank(record.rating_rank)),
        ("Genres", genres(record)),
    ]);
    if let Some(note) = &record.tba {
        rows.push(("Note", note.clone()));
    }
    if let Some(url) = record.trailer_url() {
        rows.push(("Trailer", url));
    }
    rows.push(("Poster", record.images.large.clone()));
    rows.push(("Cover", record.images.cover().to_string()));
    if !saved_in.is_empty() {
        let names: Vec<&str> = saved_in.iter().map(|k| k.as_str()).collect();
        rows.push(("Saved in", names.join(", ")));
    }
    for (label, value) in rows {
        let _ = writeln!(out, "{label:>10}: {value}");
    }

    if !record.synopsis.is_empty() {
        out.push('\n');
        out.push_str(record.synopsis.trim());
        out.push('\n');
    }
    out
}

/// Results block for a search, with active ordering and paging status.
///
/// Only the records are rendered; a failure is reported by the caller.
pub fn search_results(snapshot: &SearchSnapshot) -> String {
    let mut out = String::new();
    let label = if snapshot.query.trim().is_empty() {
        "Browse".to_string()
    } else {
        format!("Results for \"{}\"", snapshot.query.trim())
    };
    out.push_str(&section(&label, &snapshot.results));

    let _ = write!(out, "Sort: {}", snapshot.filters.sort.label());
    if let Some(status) = snapshot.filters.status {
        let _ = write!(out, " | Status: {}", status.label());
    }
    out.push('\n');

    let _ = write!(
        out,
        "{} shown of {} total",
        snapshot.results.len(),
        snapshot.total_count
    );
    if snapshot.has_more {
        out.push_str(", more available");
    }
    out.push('\n');
    out
}

/// A saved collection, or a hint when it is empty.
pub fn collection(kind: CollectionKind, records: &[CatalogRecord]) -> String {
    if records.is_empty() {
        return format!("Your {kind} is empty.\n");
    }
    let title = format!("{} ({})", capitalize(kind.as_str()), records.len());
    section(&title, records)
}

fn rank(value: u32) -> String {
    if value == 0 {
        "N/A".into()
    } else {
        format!("#{value}")
    }
}

fn genres(record: &CatalogRecord) -> String {
    if record.genres.is_empty() {
        "N/A".into()
    } else {
        record.genres.join(", ")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

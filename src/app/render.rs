use chrono::{DateTime, Local, Utc};

use crate::config::Keywords;
use crate::model::{Library, Series};

const NAME_WIDTH: usize = 48;

pub(crate) fn format_position(series: &Series) -> String {
    let (season, episode) = series.position();
    format!("s{season}e{episode}")
}

/// Numbered list of unfinished series; the numbers are what the user types.
pub(crate) fn render_unwatched(view: &[&Series]) -> String {
    if view.is_empty() {
        return "No unfinished series in the library.\n".to_string();
    }
    let mut out = String::from("Series in your library:\n");
    for (idx, series) in view.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {:<width$} stopped at {}\n",
            idx + 1,
            truncate(&series.name, NAME_WIDTH),
            format_position(series),
            width = NAME_WIDTH
        ));
    }
    out
}

/// Every series, finished ones included. Unfinished rows carry the same
/// numbers as in [`render_unwatched`]; finished rows are not selectable.
pub(crate) fn render_all(library: &Library) -> String {
    if library.is_empty() {
        return "The library is empty.\n".to_string();
    }
    let mut out = String::from("All series:\n");
    let mut number = 0;
    for series in library.iter() {
        let label = if series.watched {
            "  -".to_string()
        } else {
            number += 1;
            format!("{number:>3}")
        };
        let status = if series.watched {
            "finished".to_string()
        } else {
            format!("stopped at {}", format_position(series))
        };
        out.push_str(&format!(
            "{label}. {:<width$} {status}\n",
            truncate(&series.name, NAME_WIDTH),
            width = NAME_WIDTH
        ));
    }
    out
}

pub(crate) fn render_help(keywords: &Keywords) -> String {
    format!(
        "Commands:\n\
         \x20 <n>            play series n and move on to the next episode\n\
         \x20 -<n>           play series n without moving on\n\
         \x20 {edit:<14} edit positions (then: <n> <season> <episode>)\n\
         \x20 {all:<14} list every series, finished ones too\n\
         \x20 {rescan:<14} rescan the library folder, keeping progress\n\
         \x20 {help:<14} show this help\n\
         \x20 {stop:<14} quit (or leave the current mode)\n",
        edit = keywords.edit.join(" / "),
        all = keywords.all.join(" / "),
        rescan = keywords.rescan.join(" / "),
        help = keywords.help.join(" / "),
        stop = keywords.stop.join(" / "),
    )
}

pub(crate) fn format_saved_at(saved_at: DateTime<Utc>) -> String {
    saved_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

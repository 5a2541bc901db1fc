//! Shared sorting and formatting rules used by every template.

use chrono::{Datelike, Utc};

use crate::models::document::{is_present_word, Dated, LicenseClass, PRESENT_SENTINEL};

/// Year used for ordering an end/start date string.
///
/// Present words map to `current_year + 1` so ongoing entries always sort
/// first. Otherwise the last 4-digit run in the string wins; anything else is 0.
pub fn parse_year_at(value: &str, current_year: i32) -> i32 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0;
    }
    if is_present_word(trimmed) {
        return current_year + 1;
    }
    last_year_token(trimmed).unwrap_or(0)
}

// Mirrors a global /\d{4}/ scan: each digit run yields consecutive
// non-overlapping 4-digit chunks.
fn last_year_token(value: &str) -> Option<i32> {
    let bytes = value.as_bytes();
    let mut last = None;
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let chunks = (i - start) / 4;
        if chunks > 0 {
            let from = start + (chunks - 1) * 4;
            last = value[from..from + 4].parse().ok();
        }
    }
    last
}

// Ongoing entries rank above every literal year, even one past `current_year + 1`.
fn end_key(value: &str, current_year: i32) -> (bool, i32) {
    (is_present_word(value), parse_year_at(value, current_year))
}

/// Stable reverse-chronological sort by end year, ties by start year.
pub fn sort_by_date_at<T: Dated + Clone>(entries: &[T], current_year: i32) -> Vec<T> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        let end_a = end_key(a.end_date(), current_year);
        let end_b = end_key(b.end_date(), current_year);
        end_b.cmp(&end_a).then_with(|| {
            let start_a = parse_year_at(a.start_date(), current_year);
            let start_b = parse_year_at(b.start_date(), current_year);
            start_b.cmp(&start_a)
        })
    });
    sorted
}

pub fn sort_by_date<T: Dated + Clone>(entries: &[T]) -> Vec<T> {
    sort_by_date_at(entries, Utc::now().year())
}

/// Display form of a link: no scheme, no `www.`, no trailing slash.
pub fn format_url(url: &str) -> String {
    let url = url.trim();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let url = url.strip_prefix("www.").unwrap_or(url);
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// Clickable target for a link field, `None` when the field is empty.
pub fn link_target(url: &str) -> Option<String> {
    let display = format_url(url);
    if display.is_empty() {
        None
    } else {
        Some(format!("https://{display}"))
    }
}

pub fn tel_target(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    format!("tel:{digits}")
}

/// `", city, country"` with empty parts skipped; empty when both are empty.
pub fn format_location(city: &str, country: &str) -> String {
    let parts: Vec<&str> = [city.trim(), country.trim()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(", {}", parts.join(", "))
    }
}

/// Splits free text into bullet items, stripping a leading `•` and dropping
/// lines that end up empty.
pub fn split_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('•').map(str::trim_start).unwrap_or(line)
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// `"Month<sep>Year"`; a present word renders the sentinel and an empty year
/// renders nothing.
pub fn format_exp_date(month: &str, year: &str, separator: &str) -> String {
    let year = year.trim();
    if year.is_empty() {
        return String::new();
    }
    if is_present_word(year) {
        return PRESENT_SENTINEL.to_string();
    }
    let month = month.trim();
    if month.is_empty() {
        year.to_string()
    } else {
        format!("{month}{separator}{year}")
    }
}

/// `"Clase B, C, Chile"`, or `None` with no classes selected.
pub fn license_line(classes: &[LicenseClass]) -> Option<String> {
    if classes.is_empty() {
        return None;
    }
    let codes: Vec<&str> = classes.iter().map(|c| c.code()).collect();
    Some(format!("Clase {}, Chile", codes.join(", ")))
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Uppercases the first letter of every word, leaving the rest untouched.
pub fn capitalize_words(text: &str) -> String {
    text.split(' ').map(upper_first).collect::<Vec<_>>().join(" ")
}

/// Lowercases everything, then uppercases the first letter of every word.
pub fn title_case(text: &str) -> String {
    capitalize_words(&text.to_lowercase())
}

pub fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

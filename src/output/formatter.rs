use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::ai::{CourseList, CourseSource, CutoffEstimate, GroundingSource, UniversityProfile};
use crate::history::HistoryEntry;
use crate::institutions::Institution;
use crate::news::{source_link, NewsItem};
use crate::scoring::{Band, Calculation, SubjectGrades, MAX_OLEVEL_POINTS};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn fit(text: &str, fixed_width: usize, term_width: Option<usize>) -> String {
    match term_width {
        Some(width) if width > fixed_width + 10 => truncate_text(text, width - fixed_width),
        // Very narrow terminal, show truncated
        Some(_) => truncate_text(text, 20),
        None => text.to_string(),
    }
}

fn paint_band(band: Band, use_colors: bool) -> String {
    if !use_colors {
        return band.to_string();
    }
    match band {
        Band::Exceptional => band.green().bold().to_string(),
        Band::HighlyCompetitive => band.green().to_string(),
        Band::GoodStanding => band.cyan().to_string(),
        Band::Average => band.yellow().to_string(),
        Band::NotEligible => band.red().to_string(),
    }
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

/// Multi-line breakdown of one calculation.
pub fn format_calculation(
    calculation: &Calculation,
    grades: &SubjectGrades,
    use_colors: bool,
) -> String {
    let weights = calculation.policy.weights();
    let mut lines = vec![format!("Model: {}", calculation.policy.label())];

    lines.push(format!(
        "  JAMB             {:>6.2} / {}",
        calculation.components.entrance_exam, weights.entrance_exam
    ));
    if weights.olevel > 0.0 {
        lines.push(format!(
            "  O'Level          {:>6.2} / {}  ({} of {} points)",
            calculation.components.olevel,
            weights.olevel,
            grades.total_points(),
            MAX_OLEVEL_POINTS
        ));
    }
    if weights.secondary_exam > 0.0 {
        lines.push(format!(
            "  Post-UTME        {:>6.2} / {}",
            calculation.components.secondary_exam, weights.secondary_exam
        ));
    }

    let composite = format!("{}%", calculation.composite_display());
    let band = paint_band(calculation.band, use_colors);
    if use_colors {
        lines.push(format!("Aggregate: {}  {}", composite.bold(), band));
    } else {
        lines.push(format!("Aggregate: {}  {}", composite, band));
    }
    lines.join("\n")
}

/// Saved calculations, newest first. Each row leads with the id that
/// `history delete` takes.
pub fn format_history_table(entries: &[HistoryEntry], now: DateTime<Utc>, use_colors: bool) -> String {
    if entries.is_empty() {
        return "No saved calculations.".to_string();
    }

    let term_width = get_terminal_width();
    let id_width = entries
        .iter()
        .map(|e| e.id.to_string().len())
        .max()
        .unwrap_or(1);
    // id + space + score(7) + band(18) + age(4) + separators
    let fixed_width = id_width + 1 + 7 + 2 + 18 + 2 + 4 + 2;

    entries
        .iter()
        .map(|entry| {
            let id_str = format!("{:>width$}", entry.id, width = id_width);
            let score = format!("{:>7}", format!("{}%", entry.composite_display()));
            let band = format!("{:<18}", entry.band.as_str());
            let age = format!("{:>4}", format_age(now - entry.saved_at));
            let target = fit(
                &format!("{} - {}", entry.course, entry.university),
                fixed_width,
                term_width,
            );

            if use_colors {
                format!(
                    "{} {}  {}  {}  {}",
                    id_str.dimmed(),
                    score.bold(),
                    format!(
                        "{}{}",
                        paint_band(entry.band, true),
                        " ".repeat(band.len() - entry.band.as_str().len())
                    ),
                    age.dimmed(),
                    target
                )
            } else {
                format!("{} {}  {}  {}  {}", id_str, score, band, age, target)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// History as tab-separated values for scripting
/// Columns: id, composite, band, university, course, saved_at (no headers, no colors)
pub fn format_history_tsv(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                e.id,
                e.composite_display(),
                e.band,
                e.university,
                e.course,
                e.saved_at.to_rfc3339()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format institutions one per line
/// Format: "{name} | {category} | {slug} | {url}"
pub fn format_institution_list(institutions: &[&Institution], use_colors: bool) -> String {
    if institutions.is_empty() {
        return "No universities found.".to_string();
    }

    institutions
        .iter()
        .map(|u| {
            if use_colors {
                format!(
                    "{} | {} | {} | {}",
                    u.name.bold(),
                    u.category.cyan(),
                    u.slug.yellow(),
                    u.url.underline()
                )
            } else {
                format!("{} | {} | {} | {}", u.name, u.category, u.slug, u.url)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Spotlight card for one institution, with whatever the assistant found.
pub fn format_institution_detail(
    institution: &Institution,
    profile: Option<&UniversityProfile>,
    courses: &CourseList,
    use_colors: bool,
) -> String {
    let mut lines = Vec::new();
    if use_colors {
        lines.push(format!("{}", institution.name.bold()));
        lines.push(format!("  {} | {}", institution.category.cyan(), institution.url.underline()));
    } else {
        lines.push(institution.name.to_string());
        lines.push(format!("  {} | {}", institution.category, institution.url));
    }

    match profile {
        Some(p) => {
            lines.push(format!("  Founded: {}", p.founded));
            lines.push(format!("  Motto: {}", p.motto));
            lines.push(format!("  Best known for: {}", p.best_known_for));
            lines.push(format!("  Campus vibe: {}", p.campus_vibe));
            lines.push(String::new());
            lines.push(format!("  {}", p.bio));
        }
        None => lines.push("  Profile unavailable right now.".to_string()),
    }

    lines.push(String::new());
    lines.push(format_course_list(courses, use_colors));
    lines.join("\n")
}

pub fn format_course_list(list: &CourseList, use_colors: bool) -> String {
    let heading = match list.source {
        CourseSource::Ai => "Courses:",
        CourseSource::Cache => "Courses (cached):",
        CourseSource::Fallback => "Popular courses (catalogue unavailable):",
    };
    let heading = if use_colors {
        heading.bold().to_string()
    } else {
        heading.to_string()
    };

    std::iter::once(heading)
        .chain(list.courses.iter().map(|c| format!("  - {}", c)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_cutoff(
    university: &str,
    course: &str,
    estimate: Option<&CutoffEstimate>,
    use_colors: bool,
) -> String {
    let Some(e) = estimate else {
        return format!(
            "No cut-off information found for {} at {}. Check the school portal for official figures.",
            course, university
        );
    };
    let cutoff = if use_colors {
        e.cutoff.bold().to_string()
    } else {
        e.cutoff.clone()
    };
    format!(
        "{} at {}\n  Merit cut-off: {}\n  Subject combination: {}\n  Reliability: {}\n\n  {}\n\nEstimates only; confirm with the institution.",
        course, university, cutoff, e.subject_combination, e.reliability, e.recommendation
    )
}

/// News items, each as a headline line followed by the excerpt and link.
pub fn format_news(items: &[NewsItem], use_colors: bool) -> String {
    if items.is_empty() {
        return "No news yet.".to_string();
    }

    let term_width = get_terminal_width();
    items
        .iter()
        .map(|item| {
            let live = if item.is_live { " [live]" } else { "" };
            let title = fit(&item.title, 24 + live.len(), term_width);
            let link = source_link(item);
            if use_colors {
                format!(
                    "{} {} {}{}\n  {}\n  {}",
                    item.date.dimmed(),
                    format!("[{}]", item.category).cyan(),
                    title.bold(),
                    live.green(),
                    item.excerpt,
                    link.underline()
                )
            } else {
                format!(
                    "{} [{}] {}{}\n  {}\n  {}",
                    item.date, item.category, title, live, item.excerpt, link
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Numbered web sources that grounded an answer.
pub fn format_sources(sources: &[GroundingSource], use_colors: bool) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let lines = sources.iter().enumerate().map(|(i, s)| {
        let title = s.title.as_deref().unwrap_or(&s.uri);
        if use_colors {
            format!("  [{}] {} {}", i + 1, title, s.uri.dimmed())
        } else {
            format!("  [{}] {} {}", i + 1, title, s.uri)
        }
    });
    std::iter::once("Sources:".to_string())
        .chain(lines)
        .collect::<Vec<_>>()
        .join("\n")
}

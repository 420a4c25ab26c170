//! Text encodings shared by the flat files.
//!
//! Numbers are written the way the JVM prints doubles (`245.0`, `1.0E7`) so
//! files produced by earlier releases and by this crate stay interchangeable.
//! Training records hold one token per activity, either the fixed-label
//! summary from [`Activity::all_info`] or a versioned structured token.

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::activity::{Activity, ActivityKind, TrainingType};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const STRUCTURED_SEPARATOR: char = '|';
const NO_TIMESTAMP: &str = "-";

lazy_static! {
    static ref STRUCTURED_TOKEN_RE: Regex =
        Regex::new(r"^v1\|(running|cycling|rope_jumping)\|(.*)$").unwrap();
}

/// How new training tokens are written. Both forms are always readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingEncoding {
    /// Fixed-label human-readable summary.
    #[default]
    Legacy,
    /// `v1|<type>|id|name|calories|duration|start|end|...`
    Structured,
}

/// Formats a double like `Double.toString` on the JVM.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        // Debug output is the shortest round-trip form with a trailing ".0"
        return format!("{:?}", value);
    }

    let sci = format!("{:e}", value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{}E{}", mantissa, exponent)
    } else {
        format!("{}.0E{}", mantissa, exponent)
    }
}

pub fn parse_double(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT).ok()
}

/// Orders doubles with NaN above everything, matching `Double.compare`.
pub fn compare_doubles(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Returns the trimmed text between `start_tag` and the next `end_tag`.
///
/// A missing start tag yields "". An empty or missing end tag extends the
/// field to the end of the entry.
pub fn extract_field<'a>(entry: &'a str, start_tag: &str, end_tag: &str) -> &'a str {
    let Some(found) = entry.find(start_tag) else {
        return "";
    };
    let start = found + start_tag.len();

    let end = if end_tag.is_empty() {
        entry.len()
    } else {
        entry[start..]
            .find(end_tag)
            .map(|offset| start + offset)
            .unwrap_or(entry.len())
    };

    if start >= end {
        return "";
    }
    entry[start..end].trim()
}

/// Encodes an activity as a training token in the requested form.
pub fn encode_activity(activity: &Activity, encoding: TrainingEncoding) -> String {
    match encoding {
        TrainingEncoding::Legacy => activity.all_info(),
        TrainingEncoding::Structured => encode_structured(activity),
    }
}

/// Decodes one training token of either form. Unreadable tokens are
/// logged and skipped.
pub fn decode_activity(token: &str) -> Option<Activity> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let decoded = if STRUCTURED_TOKEN_RE.is_match(token) {
        decode_structured(token)
    } else {
        decode_summary(token)
    };

    if decoded.is_none() {
        tracing::warn!(token, "Error parsing activity");
    }
    decoded
}

/// Parses the fixed-label summary produced by [`Activity::all_info`].
pub fn decode_summary(entry: &str) -> Option<Activity> {
    let name = extract_field(entry, "Name: ", "Burned calories:");
    let calories = parse_double(extract_field(entry, "Burned calories: ", "Duration:"))?;

    let training_type = TrainingType::from_display_name(name).or_else(|| {
        if entry.contains("Distance ran: ") {
            Some(TrainingType::Running)
        } else if entry.contains("Distance cycled: ") {
            Some(TrainingType::Cycling)
        } else if entry.contains("Repetitions: ") {
            Some(TrainingType::RopeJumping)
        } else {
            None
        }
    });

    let Some(training_type) = training_type else {
        tracing::warn!(name, "Unsupported activity type");
        return None;
    };

    let (duration, kind) = match training_type {
        TrainingType::Running => {
            let duration = parse_double(extract_field(entry, "Duration: ", "Distance ran:"))?;
            let distance = extract_field(entry, "Distance ran: ", "Average speed:");
            let speed = extract_field(entry, "Average speed: ", "");
            (
                duration,
                ActivityKind::Running {
                    covered_distance: parse_double(&distance.replace(" km", ""))?,
                    average_speed: parse_double(&speed.replace(" km/h", ""))?,
                },
            )
        }
        TrainingType::Cycling => {
            let duration = parse_double(extract_field(entry, "Duration: ", "Distance cycled:"))?;
            let distance = extract_field(entry, "Distance cycled: ", "Maximum speed:");
            let speed = extract_field(entry, "Maximum speed: ", "");
            (
                duration,
                ActivityKind::Cycling {
                    covered_distance: parse_double(&distance.replace(" km", ""))?,
                    max_speed: parse_double(&speed.replace(" km/h", ""))?,
                },
            )
        }
        TrainingType::RopeJumping => {
            let duration = parse_double(extract_field(entry, "Duration: ", "Repetitions:"))?;
            let repetitions = extract_field(entry, "Repetitions: ", "").parse::<i32>().ok()?;
            (duration, ActivityKind::RopeJumping { repetitions })
        }
    };

    Some(Activity {
        id: 0,
        name: name.to_string(),
        burned_calories: calories,
        duration,
        start_time: None,
        end_time: None,
        kind,
    })
}

fn encode_structured(activity: &Activity) -> String {
    let timestamp = |ts: &Option<NaiveDateTime>| {
        ts.as_ref()
            .map(format_timestamp)
            .unwrap_or_else(|| NO_TIMESTAMP.to_string())
    };

    let mut fields = vec![
        "v1".to_string(),
        activity.training_type().tag().to_string(),
        activity.id.to_string(),
        sanitize(&activity.name),
        format_double(activity.burned_calories),
        format_double(activity.duration),
        timestamp(&activity.start_time),
        timestamp(&activity.end_time),
    ];

    match &activity.kind {
        ActivityKind::Running {
            covered_distance,
            average_speed,
        } => {
            fields.push(format_double(*covered_distance));
            fields.push(format_double(*average_speed));
        }
        ActivityKind::Cycling {
            covered_distance,
            max_speed,
        } => {
            fields.push(format_double(*covered_distance));
            fields.push(format_double(*max_speed));
        }
        ActivityKind::RopeJumping { repetitions } => {
            fields.push(repetitions.to_string());
        }
    }

    fields.join(&STRUCTURED_SEPARATOR.to_string())
}

fn decode_structured(token: &str) -> Option<Activity> {
    let caps = STRUCTURED_TOKEN_RE.captures(token)?;
    let training_type = TrainingType::from_tag(&caps[1])?;
    let fields: Vec<&str> = caps[2].split(STRUCTURED_SEPARATOR).collect();

    let expected = match training_type {
        TrainingType::RopeJumping => 7,
        _ => 8,
    };
    if fields.len() != expected {
        return None;
    }

    let timestamp = |text: &str| {
        if text == NO_TIMESTAMP {
            Some(None)
        } else {
            parse_timestamp(text).map(Some)
        }
    };

    let kind = match training_type {
        TrainingType::Running => ActivityKind::Running {
            covered_distance: parse_double(fields[6])?,
            average_speed: parse_double(fields[7])?,
        },
        TrainingType::Cycling => ActivityKind::Cycling {
            covered_distance: parse_double(fields[6])?,
            max_speed: parse_double(fields[7])?,
        },
        TrainingType::RopeJumping => ActivityKind::RopeJumping {
            repetitions: fields[6].trim().parse().ok()?,
        },
    };

    Some(Activity {
        id: fields[0].trim().parse().ok()?,
        name: fields[1].to_string(),
        burned_calories: parse_double(fields[2])?,
        duration: parse_double(fields[3])?,
        start_time: timestamp(fields[4])?,
        end_time: timestamp(fields[5])?,
        kind,
    })
}

// Record and token separators cannot appear inside a field.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ';' | '~' | '|' | '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}

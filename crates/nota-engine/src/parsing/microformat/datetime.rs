//! Dates, times and datetimes.
//!
//! Validation is relaxed: a date or 24-hour time with out-of-range components
//! still decodes, with a warning. The only hard rejection is a meridiem hour
//! outside 1-12, which leaves the text plain.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::{Candidate, EntityValue, Priority, is_word};
use crate::parsing::{
    diagnostics::{Diagnostic, DiagnosticKind},
    rope::Span,
    scan::cursor::Cursor,
};

static DATE_REGEX: OnceLock<Regex> = OnceLock::new();
static CLOCK_REGEX: OnceLock<Regex> = OnceLock::new();
static MERIDIEM_REGEX: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl Date {
    /// Describes the first out-of-range component, if any.
    pub fn range_problem(&self) -> Option<String> {
        if !(1..=12).contains(&self.month) {
            return Some(format!("month {} out of range 1-12", self.month));
        }
        if !(1..=31).contains(&self.day) {
            return Some(format!("day {} out of range 1-31", self.day));
        }
        None
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A time of day on the 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Time {
    pub fn range_problem(&self) -> Option<String> {
        if self.hour > 23 {
            return Some(format!("hour {} out of range 0-23", self.hour));
        }
        if self.minute > 59 {
            return Some(format!("minute {} out of range 0-59", self.minute));
        }
        if self.second > 59 {
            return Some(format!("second {} out of range 0-59", self.second));
        }
        None
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// A time lexeme decoded from the start of some text.
enum TimeMatch {
    Valid(Time, usize),
    /// Meridiem hour outside 1-12; carries the lexeme length and message.
    Rejected(usize, String),
}

fn date_regex() -> &'static Regex {
    DATE_REGEX.get_or_init(|| {
        Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})").expect("Invalid date regex")
    })
}

fn clock_regex() -> &'static Regex {
    CLOCK_REGEX.get_or_init(|| {
        Regex::new(r"^([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?").expect("Invalid clock regex")
    })
}

fn meridiem_regex() -> &'static Regex {
    MERIDIEM_REGEX.get_or_init(|| {
        Regex::new(r"^([0-9]{1,2})(?::([0-9]{2}))?([AaPp][Mm])").expect("Invalid meridiem regex")
    })
}

fn match_date(text: &str) -> Option<(Date, usize)> {
    let caps = date_regex().captures(text)?;
    let date = Date {
        year: caps[1].parse().ok()?,
        month: caps[2].parse().ok()?,
        day: caps[3].parse().ok()?,
    };
    Some((date, caps[0].len()))
}

fn match_clock(text: &str) -> Option<(Time, usize)> {
    let caps = clock_regex().captures(text)?;
    let second = match caps.get(3) {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };
    let time = Time {
        hour: caps[1].parse().ok()?,
        minute: caps[2].parse().ok()?,
        second,
    };
    Some((time, caps[0].len()))
}

fn match_meridiem(text: &str) -> Option<TimeMatch> {
    let caps = meridiem_regex().captures(text)?;
    let len = caps[0].len();
    let hour: u8 = caps[1].parse().ok()?;
    let minute: u8 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if !(1..=12).contains(&hour) {
        return Some(TimeMatch::Rejected(
            len,
            format!("meridiem hour {hour} out of range 1-12"),
        ));
    }
    let pm = caps[3].eq_ignore_ascii_case("pm");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    Some(TimeMatch::Valid(
        Time {
            hour,
            minute,
            second: 0,
        },
        len,
    ))
}

/// True when the lexeme ending at `end` is not glued to a following word
/// character.
fn ends_cleanly(text: &str, end: usize) -> bool {
    !text[end..].chars().next().is_some_and(is_word)
}

fn span_at(cur: &Cursor<'_>, len: usize) -> Span {
    Span::new(cur.pos(), cur.pos() + len)
}

fn with_range_warning(candidate: Candidate, problem: Option<String>, span: Span) -> Candidate {
    match problem {
        Some(message) => {
            candidate.with_diagnostic(Diagnostic::warning(DiagnosticKind::LexError, span, message))
        }
        None => candidate,
    }
}

/// `YYYY-MM-DD`, not glued to word characters on either side.
pub fn date(cur: &Cursor<'_>, _fallback: &mut Vec<Diagnostic>) -> Option<Candidate> {
    if cur.prev_char().is_some_and(is_word) {
        return None;
    }
    let rest = cur.rest();
    let (date, len) = match_date(rest)?;
    if !ends_cleanly(rest, len) {
        return None;
    }
    let candidate = Candidate::new(Priority::Date, len, EntityValue::Date(date));
    Some(with_range_warning(
        candidate,
        date.range_problem(),
        span_at(cur, len),
    ))
}

/// `H[H]:MM[:SS]` on the 24-hour clock.
pub fn clock_time(cur: &Cursor<'_>, _fallback: &mut Vec<Diagnostic>) -> Option<Candidate> {
    if cur.prev_char().is_some_and(|c| is_word(c) || c == ':') {
        return None;
    }
    let rest = cur.rest();
    let (time, len) = match_clock(rest)?;
    if !ends_cleanly(rest, len) {
        return None;
    }
    let candidate = Candidate::new(Priority::Time, len, EntityValue::Time(time));
    Some(with_range_warning(
        candidate,
        time.range_problem(),
        span_at(cur, len),
    ))
}

/// Informal `H[:MM]AM` / `H[:MM]PM`, case-insensitive.
pub fn meridiem_time(cur: &Cursor<'_>, fallback: &mut Vec<Diagnostic>) -> Option<Candidate> {
    if cur.prev_char().is_some_and(|c| is_word(c) || c == ':') {
        return None;
    }
    let rest = cur.rest();
    match match_meridiem(rest)? {
        TimeMatch::Valid(time, len) if ends_cleanly(rest, len) => {
            let candidate = Candidate::new(Priority::Time, len, EntityValue::Time(time));
            Some(with_range_warning(
                candidate,
                time.range_problem(),
                span_at(cur, len),
            ))
        }
        TimeMatch::Valid(..) => None,
        TimeMatch::Rejected(len, message) => {
            fallback.push(Diagnostic::warning(
                DiagnosticKind::LexError,
                span_at(cur, len),
                message,
            ));
            None
        }
    }
}

/// A date, a literal `T`, then either time form.
pub fn datetime(cur: &Cursor<'_>, _fallback: &mut Vec<Diagnostic>) -> Option<Candidate> {
    if cur.prev_char().is_some_and(is_word) {
        return None;
    }
    let rest = cur.rest();
    let (date, date_len) = match_date(rest)?;
    let after = rest.get(date_len..)?;
    let time_text = after.strip_prefix('T')?;
    let clock = match_clock(time_text);
    let meridiem = match match_meridiem(time_text) {
        Some(TimeMatch::Valid(time, len)) => Some((time, len)),
        _ => None,
    };
    let (time, time_len) = match (clock, meridiem) {
        (Some(c), Some(m)) => {
            if m.1 > c.1 {
                m
            } else {
                c
            }
        }
        (Some(c), None) => c,
        (None, Some(m)) => m,
        (None, None) => return None,
    };
    let len = date_len + 1 + time_len;
    if !ends_cleanly(rest, len) {
        return None;
    }
    let span = span_at(cur, len);
    let candidate = Candidate::new(Priority::Datetime, len, EntityValue::Datetime { date, time });
    Some(with_range_warning(
        candidate,
        date.range_problem().or_else(|| time.range_problem()),
        span,
    ))
}

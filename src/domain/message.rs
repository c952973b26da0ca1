//! Promotional message rendering.
//!
//! Templates are plain text with a fixed set of `%TOKEN%` placeholders. This
//! is literal substitution, not a template language: there are no conditionals
//! and no escaping. Output goes to the display surface, which owns sanitizing.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::aggregates::Promotion;
use crate::domain::pricing::applicable_discount;

pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    Off,
    StartDate,
    EndDate,
    DaysLeft,
}

impl Token {
    const ALL: [Token; 4] = [Token::Off, Token::StartDate, Token::EndDate, Token::DaysLeft];

    fn literal(self) -> &'static str {
        match self {
            Token::Off => "%OFF%",
            Token::StartDate => "%START_DATE%",
            Token::EndDate => "%END_DATE%",
            Token::DaysLeft => "%DAYS_LEFT%",
        }
    }
}

/// Renders banner text for a promotion.
#[derive(Clone, Debug)]
pub struct MessageRenderer {
    date_format: String,
}

impl Default for MessageRenderer {
    fn default() -> Self { Self::new(DEFAULT_DATE_FORMAT) }
}

impl MessageRenderer {
    /// `date_format` is a chrono format string used for both date tokens. A
    /// format chrono cannot parse is replaced by [`DEFAULT_DATE_FORMAT`].
    pub fn new(date_format: impl Into<String>) -> Self {
        let date_format = date_format.into();
        if StrftimeItems::new(&date_format).any(|item| matches!(item, Item::Error)) {
            tracing::warn!(%date_format, fallback = DEFAULT_DATE_FORMAT, "invalid promotion date format");
            return Self { date_format: DEFAULT_DATE_FORMAT.to_string() };
        }
        Self { date_format }
    }

    pub fn date_format(&self) -> &str { &self.date_format }

    /// Substitutes every placeholder in a single left-to-right pass.
    ///
    /// Substituted text is never rescanned. Date tokens for an unset bound are
    /// left in place so an editor preview shows what is missing.
    pub fn render(&self, promotion: &Promotion, preview_total: Decimal, now: DateTime<Utc>) -> String {
        let template = promotion.message_template.as_deref().unwrap_or_default();
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(idx) = rest.find('%') {
            out.push_str(&rest[..idx]);
            let tail = &rest[idx..];
            match Token::ALL.into_iter().find(|t| tail.starts_with(t.literal())) {
                Some(token) => {
                    match self.value(token, promotion, preview_total, now) {
                        Some(value) => out.push_str(&value),
                        None => out.push_str(token.literal()),
                    }
                    rest = &tail[token.literal().len()..];
                }
                None => {
                    out.push('%');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn value(&self, token: Token, promotion: &Promotion, preview_total: Decimal, now: DateTime<Utc>) -> Option<String> {
        match token {
            Token::Off => Some(applicable_discount(Some(promotion), preview_total, now).to_string()),
            Token::StartDate => promotion.start_at.map(|at| self.format_date(at)),
            Token::EndDate => promotion.end_at.map(|at| self.format_date(at)),
            Token::DaysLeft => Some(promotion.end_at.map(|end| days_left(end, now).to_string()).unwrap_or_default()),
        }
    }

    fn format_date(&self, at: DateTime<Utc>) -> String {
        let mut out = String::new();
        if write!(out, "{}", at.format(&self.date_format)).is_err() {
            return at.format(DEFAULT_DATE_FORMAT).to_string();
        }
        out
    }
}

/// Whole days until `end_at`, rounded up; zero once it has passed.
pub fn days_left(end_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining = (end_at - now).num_milliseconds();
    if remaining <= 0 { return 0; }
    (remaining + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

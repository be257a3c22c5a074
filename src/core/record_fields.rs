use crate::core::diff::Numeric;
use crate::domain::model::Record;
use crate::utils::error::{DedupError, Result};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Wire names of the three fields every record must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFields {
    pub identifier: String,
    pub email: String,
    pub entry_date: String,
}

impl Default for RecordFields {
    fn default() -> Self {
        Self {
            identifier: "_id".to_string(),
            email: "email".to_string(),
            entry_date: "entryDate".to_string(),
        }
    }
}

/// Hashable form of an identity key value.
///
/// Numbers and booleans are keyed by numeric value, so `1`, `1.0` and `true`
/// are the same key. Everything else uses its JSON text: `1` and `"1"` stay
/// distinct and `null` is a key like any other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn from_value(value: &Value) -> Self {
        match Numeric::from_value(value) {
            Some(number) => Self(number.to_string()),
            None => Self(value.to_string()),
        }
    }
}

/// The required fields of one record, extracted and parsed.
#[derive(Debug, Clone)]
pub struct RecordKeys {
    pub identifier: IdentityKey,
    pub email: IdentityKey,
    pub entry_date: DateTime<Utc>,
}

impl RecordFields {
    /// Extracts identity keys and the parsed entry date from `record`,
    /// which sits at position `index` of `group`.
    pub fn keys(&self, group: &str, index: usize, record: &Record) -> Result<RecordKeys> {
        let require = |field: &str| {
            record
                .get(field)
                .ok_or_else(|| DedupError::MissingRequiredField {
                    group: group.to_string(),
                    index,
                    field: field.to_string(),
                })
        };

        let identifier = IdentityKey::from_value(require(&self.identifier)?);
        let email = IdentityKey::from_value(require(&self.email)?);
        let raw_date = require(&self.entry_date)?;

        let entry_date = match raw_date {
            Value::String(s) => parse_entry_date(s),
            other => Err(format!("expected a string, found {}", json_type(other))),
        }
        .map_err(|reason| DedupError::UnparsableDate {
            group: group.to_string(),
            index,
            value: raw_date.to_string(),
            reason,
        })?;

        Ok(RecordKeys {
            identifier,
            email,
            entry_date,
        })
    }
}

static ISO_8601: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^
        (?:
            (?P<year>\d{4})-?(?P<month>\d{2})-?(?P<day>\d{2})
          | (?P<iso_year>\d{4})-?W(?P<week>\d{2})(?:-?(?P<weekday>\d))?
        )
        (?:
            [Tt\x20]
            (?P<hour>\d{2})
            (?: :?(?P<minute>\d{2}) (?: :?(?P<second>\d{2}) (?:[.,](?P<fraction>\d{1,9}))? )? )?
            (?P<offset>
                [Zz]
              | (?P<sign>[+-])(?P<off_hour>\d{2})(?: :?(?P<off_minute>\d{2}) (?: :?(?P<off_second>\d{2}) )? )?
            )?
        )?
        $",
    )
    .expect("ISO-8601 pattern is valid")
});

/// Parses an ISO-8601 date or date-time into an instant.
///
/// Accepts calendar dates (`2020-01-01`, `20200101`) and week dates
/// (`2020-W01-3`, `2020W01`), optionally followed by `T` or a space and a
/// time of hour, minute or second precision with an optional fraction and
/// offset (`Z`, `+hh`, `+hh:mm`, `+hhmm`). Values without an offset are taken
/// as UTC; a bare date means midnight.
pub fn parse_entry_date(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    let invalid = || format!("'{}' is not an ISO-8601 date or date-time", raw);

    let caps = ISO_8601.captures(raw).ok_or_else(invalid)?;
    let number = |name: &str| -> Option<u32> {
        caps.name(name).and_then(|m| m.as_str().parse().ok())
    };

    let date = match (number("year"), number("iso_year"), number("week")) {
        (Some(year), _, _) => NaiveDate::from_ymd_opt(
            year as i32,
            number("month").unwrap_or(0),
            number("day").unwrap_or(0),
        ),
        (None, Some(year), Some(week)) => {
            let weekday = number("weekday").unwrap_or(1);
            if !(1..=7).contains(&weekday) {
                return Err(invalid());
            }
            NaiveDate::from_isoywd_opt(year as i32, week, Weekday::Mon)
                .and_then(|monday| monday.checked_add_days(Days::new(u64::from(weekday - 1))))
        }
        _ => None,
    }
    .ok_or_else(invalid)?;

    let nanos = caps.name("fraction").map_or(0, |m| {
        let digits = m.as_str();
        digits.parse::<u32>().unwrap_or(0) * 10u32.pow(9 - digits.len() as u32)
    });
    let time = NaiveTime::from_hms_nano_opt(
        number("hour").unwrap_or(0),
        number("minute").unwrap_or(0),
        number("second").unwrap_or(0),
        nanos,
    )
    .ok_or_else(invalid)?;
    let local = date.and_time(time);

    match caps.name("sign") {
        Some(sign) => {
            let magnitude = number("off_hour").unwrap_or(0) * 3600
                + number("off_minute").unwrap_or(0) * 60
                + number("off_second").unwrap_or(0);
            let seconds = if sign.as_str() == "-" {
                -(magnitude as i32)
            } else {
                magnitude as i32
            };
            let offset = FixedOffset::east_opt(seconds).ok_or_else(invalid)?;
            local
                .and_local_timezone(offset)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(invalid)
        }
        // `Z` or no offset at all
        None => Ok(local.and_utc()),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

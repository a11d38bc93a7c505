use std::fmt;

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Provenance identity attached to a commit: who, when, and in which
/// timezone.
///
/// The canonical rendering is part of the commit encoding contract:
///
/// ```text
/// Name <email> <unix-seconds> <+hhmm>
/// ```
///
/// Name and email may not contain `<`, `>`, or newlines; the angle
/// brackets and the trailing timestamp fields are what make the line
/// parseable without escaping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Human-readable name.
    pub name: String,
    /// Email address (uninterpreted beyond delimiter rules).
    pub email: String,
    /// Wall-clock time with fixed UTC offset.
    pub when: DateTime<FixedOffset>,
}

impl Signature {
    /// Create a signature, validating delimiter rules.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        when: DateTime<FixedOffset>,
    ) -> Result<Self, TypeError> {
        let name = name.into();
        let email = email.into();
        for (field, value) in [("name", &name), ("email", &email)] {
            if value.contains(['<', '>', '\n']) {
                return Err(TypeError::InvalidSignature(format!(
                    "{field} contains forbidden character"
                )));
            }
        }
        if name.is_empty() {
            return Err(TypeError::InvalidSignature("empty name".to_string()));
        }
        Ok(Self { name, email, when })
    }

    /// Render the canonical signature line (without a trailing newline).
    pub fn to_line(&self) -> String {
        let offset_secs = self.when.offset().local_minus_utc();
        let sign = if offset_secs < 0 { '-' } else { '+' };
        let abs = offset_secs.unsigned_abs();
        format!(
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.when.timestamp(),
            sign,
            abs / 3600,
            (abs % 3600) / 60,
        )
    }

    /// Parse a canonical signature line.
    pub fn from_line(line: &str) -> Result<Self, TypeError> {
        let open = line
            .find(" <")
            .ok_or_else(|| TypeError::InvalidSignature(line.to_string()))?;
        let close = line
            .rfind('>')
            .ok_or_else(|| TypeError::InvalidSignature(line.to_string()))?;
        if close < open + 2 {
            return Err(TypeError::InvalidSignature(line.to_string()));
        }

        let name = &line[..open];
        let email = &line[open + 2..close];
        let rest = line[close + 1..].trim_start();
        let mut fields = rest.split(' ');
        let ts: i64 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| TypeError::InvalidSignature(line.to_string()))?;
        let tz = fields
            .next()
            .ok_or_else(|| TypeError::InvalidSignature(line.to_string()))?;
        let offset = parse_tz_offset(tz)
            .ok_or_else(|| TypeError::InvalidSignature(format!("bad offset: {tz}")))?;

        let when = offset
            .timestamp_opt(ts, 0)
            .single()
            .ok_or_else(|| TypeError::InvalidSignature(format!("bad timestamp: {ts}")))?;

        Self::new(name, email, when)
    }
}

/// Parse a `±hhmm` timezone offset. Works on raw bytes so arbitrary
/// UTF-8 input can never land a slice on a non-char boundary.
fn parse_tz_offset(s: &str) -> Option<FixedOffset> {
    let bytes = s.as_bytes();
    if bytes.len() != 5 {
        return None;
    }
    let sign: i32 = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digit = |b: u8| b.is_ascii_digit().then(|| i32::from(b - b'0'));
    let hours = digit(bytes[1])? * 10 + digit(bytes[2])?;
    let minutes = digit(bytes[3])? * 10 + digit(bytes[4])?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn sig(name: &str, email: &str, ts: i64, offset_secs: i32) -> Signature {
        let offset = FixedOffset::east_opt(offset_secs).unwrap();
        let when = offset.timestamp_opt(ts, 0).single().unwrap();
        Signature::new(name, email, when).unwrap()
    }

    #[test]
    fn line_format() {
        let s = sig("Ada Lovelace", "ada@example.com", 1_700_000_000, 3600);
        assert_eq!(
            s.to_line(),
            "Ada Lovelace <ada@example.com> 1700000000 +0100"
        );
    }

    #[test]
    fn negative_offset_renders_with_minus() {
        let s = sig("Bob", "bob@example.com", 1_700_000_000, -5 * 3600);
        assert!(s.to_line().ends_with("-0500"));
    }

    #[test]
    fn line_roundtrip() {
        let s = sig("Grace Hopper", "grace@navy.mil", 1_600_000_000, -4 * 3600 - 1800);
        let parsed = Signature::from_line(&s.to_line()).unwrap();
        assert_eq!(s, parsed);
    }

    #[test]
    fn utc_roundtrip() {
        let s = sig("X", "x@y.z", 0, 0);
        assert_eq!(s.to_line(), "X <x@y.z> 0 +0000");
        assert_eq!(Signature::from_line(&s.to_line()).unwrap(), s);
    }

    #[test]
    fn rejects_angle_brackets_in_name() {
        let when = utc().timestamp_opt(0, 0).single().unwrap();
        let err = Signature::new("Evil <injector>", "e@x.y", when).unwrap_err();
        assert!(matches!(err, TypeError::InvalidSignature(_)));
    }

    #[test]
    fn rejects_empty_name() {
        let when = utc().timestamp_opt(0, 0).single().unwrap();
        assert!(Signature::new("", "e@x.y", when).is_err());
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            "",
            "no brackets here 0 +0000",
            "A <b@c> notanumber +0000",
            "A <b@c> 0 +99zz",
            // Multi-byte characters in the offset must fail, not panic.
            "A <b@c> 0 +\u{20ac}x",
            "A <b@c> 0 \u{20ac}00",
        ] {
            assert!(Signature::from_line(line).is_err(), "accepted: {line}");
        }
    }

    #[test]
    fn serde_roundtrip() {
        let s = sig("Ada", "ada@example.com", 12345, 0);
        let json = serde_json::to_string(&s).unwrap();
        let parsed: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(s, parsed);
    }
}

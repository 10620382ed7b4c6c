//! Date/time pattern translation.
//!
//! Exact-format fields accept either a chrono `strftime` pattern (one with a
//! `%` outside quotes and escapes) or a token pattern such as `yyyyMMdd`. Token patterns are
//! translated once, when the schema is built.
//!
//! | Token  | Meaning               | strftime |
//! |--------|-----------------------|----------|
//! | `yyyy` | 4-digit year          | `%Y`     |
//! | `yy`   | 2-digit year          | `%y`     |
//! | `MMMM` | full month name       | `%B`     |
//! | `MMM`  | abbreviated month     | `%b`     |
//! | `MM`   | month, zero-padded    | `%m`     |
//! | `M`    | month                 | `%-m`    |
//! | `dddd` | full weekday name     | `%A`     |
//! | `ddd`  | abbreviated weekday   | `%a`     |
//! | `dd`   | day, zero-padded      | `%d`     |
//! | `d`    | day                   | `%-d`    |
//! | `HH`   | 24-hour, zero-padded  | `%H`     |
//! | `hh`   | 12-hour, zero-padded  | `%I`     |
//! | `mm`   | minute                | `%M`     |
//! | `ss`   | second                | `%S`     |
//! | `fff`  | fraction (3/6/9)      | `%3f`    |
//! | `tt`   | AM/PM                 | `%p`     |
//!
//! Text in single or double quotes and characters escaped with `\` are
//! copied literally. Month and weekday names use English (POSIX) spelling.

use chrono::format::{Item, StrftimeItems};

/// Translate a pattern to strftime syntax and check that chrono accepts it.
pub fn to_strftime(pattern: &str) -> Result<String, String> {
    if pattern.is_empty() {
        return Err("date/time pattern is empty".to_string());
    }

    let translated = if is_strftime(pattern) {
        pattern.to_string()
    } else {
        translate_tokens(pattern)?
    };

    if StrftimeItems::new(&translated).any(|item| matches!(item, Item::Error)) {
        return Err(format!("'{pattern}' is not a valid date/time pattern"));
    }

    Ok(translated)
}

/// A `%` outside quoted text and escapes marks a strftime pattern.
fn is_strftime(pattern: &str) -> bool {
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '%' => return true,
            '\\' => {
                chars.next();
            }
            '\'' | '"' => {
                if !chars.by_ref().any(|c| c == ch) {
                    return false;
                }
            }
            _ => {}
        }
    }
    false
}

fn translate_tokens(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0usize;

    while i < chars.len() {
        let ch = chars[i];

        if ch == '\'' || ch == '"' {
            let close = chars[i + 1..]
                .iter()
                .position(|&c| c == ch)
                .ok_or_else(|| format!("unterminated quote in pattern '{pattern}'"))?;
            for &literal in &chars[i + 1..i + 1 + close] {
                push_literal(&mut out, literal);
            }
            i += close + 2;
            continue;
        }

        if ch == '\\' {
            let escaped = chars
                .get(i + 1)
                .ok_or_else(|| format!("dangling escape in pattern '{pattern}'"))?;
            push_literal(&mut out, *escaped);
            i += 2;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&c| c == ch).count();
        match token(ch, run) {
            Some(spec) => out.push_str(spec),
            None => {
                for _ in 0..run {
                    push_literal(&mut out, ch);
                }
            }
        }
        i += run;
    }

    Ok(out)
}

fn token(ch: char, run: usize) -> Option<&'static str> {
    let spec = match (ch, run) {
        ('y', 1 | 2) => "%y",
        ('y', _) => "%Y",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', 1) => "%-d",
        ('d', 2) => "%d",
        ('d', 3) => "%a",
        ('d', _) => "%A",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('f', 1..=3) => "%3f",
        ('f', 4..=6) => "%6f",
        ('f', _) => "%9f",
        ('t', _) => "%p",
        _ => return None,
    };
    Some(spec)
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '%' {
        out.push_str("%%");
    } else {
        out.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_patterns() {
        assert_eq!(to_strftime("yyyyMMdd").unwrap(), "%Y%m%d");
        assert_eq!(to_strftime("dd/MM/yy").unwrap(), "%d/%m/%y");
        assert_eq!(to_strftime("yyyy-MM-dd HH:mm:ss").unwrap(), "%Y-%m-%d %H:%M:%S");
        assert_eq!(to_strftime("ddMMMyyyy").unwrap(), "%d%b%Y");
        assert_eq!(to_strftime("hh:mm tt").unwrap(), "%I:%M %p");
        assert_eq!(to_strftime("HHmmss.fff").unwrap(), "%H%M%S.%3f");
    }

    #[test]
    fn test_strftime_passthrough() {
        assert_eq!(to_strftime("%Y%m%d").unwrap(), "%Y%m%d");
        assert_eq!(to_strftime("%d 'of' %m").unwrap(), "%d 'of' %m");
    }

    #[test]
    fn test_literals() {
        assert_eq!(to_strftime("yyyy'T'HH").unwrap(), "%YT%H");
        assert_eq!(to_strftime(r"yyyy\MMM").unwrap(), "%YM%m");
        assert_eq!(to_strftime("'100%' yyyy").unwrap(), "100%% %Y");
        assert_eq!(to_strftime("'%'yyyyMMdd' X'").unwrap(), "%%%Y%m%d X");
        assert_eq!(to_strftime(r"\%yyyy").unwrap(), "%%%Y");
        assert_eq!(to_strftime("\"%\"dd").unwrap(), "%%%d");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(to_strftime("").is_err());
        assert!(to_strftime("yyyy'MM").is_err());
        assert!(to_strftime("yyyy\\").is_err());
        assert!(to_strftime("%Q").is_err());
    }
}

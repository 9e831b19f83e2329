//! Duration strings used in configuration (`"7d"`, `"12h"`, `"3600"`).

use agora_core::error::AppError;

/// Parses a duration string into seconds.
///
/// Accepts a positive integer followed by one of `s`, `m`, `h`, `d`, `w`,
/// or a bare integer meaning seconds.
pub fn parse_duration_secs(input: &str) -> Result<i64, AppError> {
    let input = input.trim();
    let invalid = || AppError::configuration(format!("Invalid duration: '{input}'"));

    let (digits, multiplier) = match input.char_indices().last() {
        Some((idx, unit)) if unit.is_ascii_alphabetic() => {
            let multiplier = match unit.to_ascii_lowercase() {
                's' => 1,
                'm' => 60,
                'h' => 3_600,
                'd' => 86_400,
                'w' => 604_800,
                _ => return Err(invalid()),
            };
            (&input[..idx], multiplier)
        }
        Some(_) => (input, 1),
        None => return Err(invalid()),
    };

    let value: i64 = digits.parse().map_err(|_| invalid())?;
    if value <= 0 {
        return Err(invalid());
    }
    value.checked_mul(multiplier).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_duration_secs("45s").unwrap(), 45);
        assert_eq!(parse_duration_secs("30m").unwrap(), 1_800);
        assert_eq!(parse_duration_secs("12h").unwrap(), 43_200);
        assert_eq!(parse_duration_secs("7d").unwrap(), 604_800);
        assert_eq!(parse_duration_secs("2w").unwrap(), 1_209_600);
        assert_eq!(parse_duration_secs("3600").unwrap(), 3_600);
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["", "d", "7x", "-5m", "0", "1.5h", "h7"] {
            assert!(parse_duration_secs(bad).is_err(), "{bad} should be rejected");
        }
    }
}

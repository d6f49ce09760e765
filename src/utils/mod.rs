use regex::Regex;
use std::sync::OnceLock;

pub const NICKNAME_MIN_LEN: usize = 3;
pub const NICKNAME_MAX_LEN: usize = 16;

fn nickname_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(r"^[A-Za-z0-9_]{{{},{}}}$", NICKNAME_MIN_LEN, NICKNAME_MAX_LEN);
        Regex::new(&pattern).expect("nickname pattern compiles")
    })
}

/// Trim the raw chat text and return it if it is a valid Minecraft nickname.
pub fn normalize_nickname(raw: &str) -> Option<&str> {
    let nickname = raw.trim();
    if is_valid_nickname(nickname) {
        Some(nickname)
    } else {
        None
    }
}

pub fn is_valid_nickname(nickname: &str) -> bool {
    nickname_pattern().is_match(nickname)
}

pub mod rcon;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minecraft_names() {
        for name in ["Steve_01", "abc", "___", "A1B2C3D4E5F6G7H8", "notch", "xX_Pro_Xx"] {
            assert!(is_valid_nickname(name), "{name} should be accepted");
        }
    }

    #[test]
    fn rejects_everything_else() {
        let too_long = "a".repeat(NICKNAME_MAX_LEN + 1);
        let cases = [
            "",
            "ab",
            too_long.as_str(),
            "bad name!",
            "with space",
            "dash-name",
            "Стив",
            "émile",
            "name\n",
            "semi;colon",
        ];
        for name in cases {
            assert!(!is_valid_nickname(name), "{name:?} should be rejected");
        }
    }

    #[test]
    fn normalize_trims_surrounding_whitespace() {
        assert_eq!(normalize_nickname("  Steve_01\n"), Some("Steve_01"));
        assert_eq!(normalize_nickname("\tabc "), Some("abc"));
        assert_eq!(normalize_nickname("   "), None);
        assert_eq!(normalize_nickname(" bad name! "), None);
    }

    #[test]
    fn length_limits_are_inclusive() {
        assert!(is_valid_nickname(&"x".repeat(NICKNAME_MIN_LEN)));
        assert!(is_valid_nickname(&"x".repeat(NICKNAME_MAX_LEN)));
        assert!(!is_valid_nickname(&"x".repeat(NICKNAME_MIN_LEN - 1)));
    }
}

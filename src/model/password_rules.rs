use crate::utils::errors::{ErrorCode, WardenError};

const MIN_LENGTH: usize = 8;
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

///
/// The outcome of running a candidate password through the complexity rules.
///
/// A password is only accepted when every rule passes - the violations list
/// carries one entry per broken rule so callers can report them all at once.
///
pub struct ComplexityReport {
    violations: Vec<WardenError>,
}

impl ComplexityReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[WardenError] {
        &self.violations
    }

    ///
    /// Collapse the report into a single error carrying every broken rule.
    ///
    pub fn into_error(self) -> WardenError {
        let messages = self.violations.iter()
            .map(|v| v.message().to_string())
            .collect::<Vec<String>>()
            .join(", ");
        ErrorCode::PasswordDoesNotMeetPolicy.with_msg(&messages)
    }
}

pub fn check_complexity(password: &str) -> ComplexityReport {
    let mut violations = vec!();

    if password.chars().count() < MIN_LENGTH {
        violations.push(ErrorCode::PasswordTooShort
            .with_msg(&format!("Password must be at least {} characters long", MIN_LENGTH)));
    }

    if !password.chars().any(|ch| ch.is_ascii_lowercase()) {
        violations.push(ErrorCode::PasswordMissingLowercase
            .with_msg("Password must contain a lowercase letter"));
    }

    if !password.chars().any(|ch| ch.is_ascii_uppercase()) {
        violations.push(ErrorCode::PasswordMissingUppercase
            .with_msg("Password must contain an uppercase letter"));
    }

    if !password.chars().any(|ch| ch.is_ascii_digit()) {
        violations.push(ErrorCode::PasswordMissingNumber
            .with_msg("Password must contain a number"));
    }

    if !password.chars().any(|ch| SYMBOLS.contains(ch)) {
        violations.push(ErrorCode::PasswordMissingSymbol
            .with_msg("Password must contain a symbol"));
    }

    ComplexityReport { violations }
}

///
/// An advisory 0-100 score - it never gates acceptance, only the complexity
/// rules above do that.
///
pub fn strength(password: &str) -> u32 {
    let mut score: i32 = 0;
    let length = password.chars().count();

    if length >= 8  { score += 20; }
    if length >= 12 { score += 10; }
    if length >= 16 { score += 10; }
    if length >= 20 { score += 10; }

    if password.chars().any(|ch| ch.is_ascii_lowercase()) { score += 10; }
    if password.chars().any(|ch| ch.is_ascii_uppercase()) { score += 10; }
    if password.chars().any(|ch| ch.is_ascii_digit())     { score += 10; }
    if password.chars().any(|ch| SYMBOLS.contains(ch))    { score += 10; }

    if has_repeated_run(password) {
        score -= 10;
    }

    score.clamp(0, 100) as u32
}

pub fn feedback(strength: u32) -> &'static str {
    match strength {
        0..=29  => "Very Weak",
        30..=49 => "Weak",
        50..=69 => "Fair",
        70..=84 => "Good",
        _       => "Very Strong",
    }
}

// Three or more of the same character in a row.
fn has_repeated_run(password: &str) -> bool {
    let mut run = 1;
    let mut previous = None;

    for ch in password.chars() {
        match previous {
            Some(prev) if prev == ch => {
                run += 1;
                if run >= 3 {
                    return true
                }
            },
            _ => run = 1,
        }
        previous = Some(ch);
    }

    false
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_a_compliant_password() {
        let report = check_complexity("Str0ng!Pass");
        assert!(report.is_valid());
        assert_eq!(report.violations().len(), 0);
    }

    #[test]
    fn should_report_every_broken_rule() {
        let report = check_complexity("password");
        assert!(!report.is_valid());

        let codes: Vec<ErrorCode> = report.violations().iter().map(|v| v.error_code()).collect();
        assert_eq!(codes, vec!(
            ErrorCode::PasswordMissingUppercase,
            ErrorCode::PasswordMissingNumber,
            ErrorCode::PasswordMissingSymbol));
    }

    #[test]
    fn should_reject_a_short_password() {
        let report = check_complexity("Ab1!");
        let codes: Vec<ErrorCode> = report.violations().iter().map(|v| v.error_code()).collect();
        assert_eq!(codes, vec!(ErrorCode::PasswordTooShort));
    }

    #[test]
    fn should_score_length_and_character_classes() {
        // 8 chars, all four classes.
        assert_eq!(strength("Ab1!Ab1!"), 60);

        // 21 chars, all four classes.
        assert_eq!(strength("Ab1!Ab1!Ab1!Ab1!Ab1!x"), 90);

        // All four classes but a triple-repeat penalty.
        assert_eq!(strength("aaab1!Xx"), 50);
    }

    #[test]
    fn should_never_score_below_zero() {
        assert_eq!(strength("aaa"), 0);
    }

    #[test]
    fn should_label_score_bands() {
        assert_eq!(feedback(10),  "Very Weak");
        assert_eq!(feedback(30),  "Weak");
        assert_eq!(feedback(50),  "Fair");
        assert_eq!(feedback(70),  "Good");
        assert_eq!(feedback(85),  "Very Strong");
        assert_eq!(feedback(100), "Very Strong");
    }
}

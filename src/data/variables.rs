//! Variable reference recognition.
//!
//! The classifier only needs a yes/no answer for the first token of a
//! Variables-table row, so the predicate is injected through
//! [`VariableMatcher`]. [`RobotVariableMatcher`] is the default.

/// Decides whether a token is a variable reference such as `${name}`.
pub trait VariableMatcher: Send + Sync {
    fn is_variable_reference(&self, token: &str) -> bool;
}

/// Scalar, list, dictionary and environment variables: `${x}`, `@{x}`, `&{x}`, `%{x}`.
///
/// The token must be longer than three characters, its only `{` must be the
/// second character, and its first `}` must be the last character.
#[derive(Debug, Default, Clone, Copy)]
pub struct RobotVariableMatcher;

const VARIABLE_MARKERS: [char; 4] = ['$', '@', '&', '%'];

impl VariableMatcher for RobotVariableMatcher {
    fn is_variable_reference(&self, token: &str) -> bool {
        let Some(first) = token.chars().next() else {
            return false;
        };
        token.chars().count() > 3
            && VARIABLE_MARKERS.contains(&first)
            && token.rfind('{') == Some(1)
            && token.find('}') == Some(token.len() - 1)
    }
}

impl<F> VariableMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_variable_reference(&self, token: &str) -> bool {
        self(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_forms() {
        let matcher = RobotVariableMatcher;
        for token in ["${X}", "@{list}", "&{dict}", "%{HOME}", "${two words}"] {
            assert!(matcher.is_variable_reference(token), "{token} should match");
        }
    }

    #[test]
    fn test_rejected_tokens() {
        let matcher = RobotVariableMatcher;
        for token in ["", "${}", "notavar", "$X", "${X", "${X}=", "${a}{b}", "#{X}", "${{X}"] {
            assert!(!matcher.is_variable_reference(token), "{token} should not match");
        }
    }

    #[test]
    fn test_closure_matcher() {
        let matcher = |token: &str| token.starts_with("VAR_");
        assert!(matcher.is_variable_reference("VAR_x"));
        assert!(!matcher.is_variable_reference("x"));
    }
}

//! The predicate comparator shared by property and XML-query matches.

use std::fmt;

use tracing::warn;

/// Comparison operator declared on a manifest predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Null,
    NotNull,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Operator {
    /// Parse the manifest attribute spelling. Both `not null` and `not-null`
    /// are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "null" => Some(Self::Null),
            "not null" | "not-null" => Some(Self::NotNull),
            "==" => Some(Self::Eq),
            "!=" => Some(Self::NotEq),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// The negating operators: the ones whose result is true when the value
    /// they test is absent. File absence and evaluation failures resolve to
    /// this polarity.
    pub fn is_negating(self) -> bool {
        matches!(self, Self::Null | Self::NotEq)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Null => "null",
            Self::NotNull => "not null",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        };
        f.write_str(label)
    }
}

/// Compare an extracted value against a declared one.
///
/// The null/empty rules are deliberately asymmetric and must stay that way:
/// an absent left value counts as "not equal" to any non-empty right value,
/// and as "equal" to a null-or-empty right value. Relational operators on an
/// absent value are always false.
pub fn is_match(
    left: Option<&str>,
    operator: Operator,
    right: Option<&str>,
    case_sensitive: bool,
) -> bool {
    match operator {
        Operator::NotNull => return left.is_some(),
        Operator::Null => return left.is_none(),
        _ => {}
    }

    let Some(left) = left else {
        return match operator {
            Operator::NotEq => right.is_some_and(|right| !right.is_empty()),
            Operator::Eq => right.is_none_or(str::is_empty),
            _ => false,
        };
    };

    let Some(right) = right.filter(|right| !right.is_empty()) else {
        warn!(operator = %operator, "invalid comparison: no compare value declared");
        return false;
    };

    let (left, right) = if case_sensitive {
        (left.to_string(), right.to_string())
    } else {
        (left.to_lowercase(), right.to_lowercase())
    };
    let ordering = left.cmp(&right);
    match operator {
        Operator::Eq => ordering.is_eq(),
        Operator::NotEq => ordering.is_ne(),
        Operator::Lt => ordering.is_lt(),
        Operator::Gt => ordering.is_gt(),
        Operator::Le => ordering.is_le(),
        Operator::Ge => ordering.is_ge(),
        // Handled before the null/empty rules above.
        Operator::Null | Operator::NotNull => false,
    }
}

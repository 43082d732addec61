//! Parsing order-by strings.

/// One ordering term: a column key and its direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub key: String,
    /// Lowercased direction token, `"asc"` when none was given
    pub direction: String,
}

impl OrderBy {
    pub fn new(key: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: direction.into(),
        }
    }

    /// Empty and `asc` are ascending; any other direction is descending.
    pub fn is_ascending(&self) -> bool {
        self.direction.is_empty() || self.direction == "asc"
    }
}

/// Parse `"name desc, age"` into ordered terms.
///
/// Terms are comma separated. Within a term the last whitespace-separated
/// token is the direction when there is more than one token; the tokens
/// before it form the key. Empty terms are skipped.
pub fn parse_order_by(order: &str) -> Vec<OrderBy> {
    order
        .split(',')
        .filter_map(|term| {
            let tokens: Vec<&str> = term.split_whitespace().collect();
            match tokens.as_slice() {
                [] => None,
                [key] => Some(OrderBy::new(*key, "asc")),
                [key @ .., direction] => {
                    Some(OrderBy::new(key.join(" "), direction.to_lowercase()))
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_by() {
        assert_eq!(
            parse_order_by("name desc, age"),
            vec![OrderBy::new("name", "desc"), OrderBy::new("age", "asc")]
        );
    }

    #[test]
    fn test_direction_is_lowercased() {
        let terms = parse_order_by("Name DESC,Age Asc");
        assert_eq!(terms[0].direction, "desc");
        assert_eq!(terms[1].direction, "asc");
        assert!(!terms[0].is_ascending());
        assert!(terms[1].is_ascending());
    }

    #[test]
    fn test_unusual_terms() {
        assert!(parse_order_by("").is_empty());
        assert_eq!(
            parse_order_by("name, , age"),
            vec![OrderBy::new("name", "asc"), OrderBy::new("age", "asc")]
        );
        // Every token but the last forms the key
        assert_eq!(
            parse_order_by("first name desc"),
            vec![OrderBy::new("first name", "desc")]
        );
        // Unrecognized directions sort descending
        assert!(!OrderBy::new("age", "down").is_ascending());
        assert!(OrderBy::new("age", "").is_ascending());
    }
}

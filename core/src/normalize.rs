use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A number, optionally followed by a unit. Matches anywhere, including inside words.
    static ref QUANTITY: Regex =
        Regex::new(r"(?i)\d+\.?\d*\s*(?:(?:cup|tbsp|tsp|oz|lb|g|kg|ml|l)s?)?").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Canonical form of a raw ingredient line: lowercase, quantities and units
/// stripped, whitespace collapsed and trimmed. Never fails; may return "".
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = QUANTITY.replace_all(&lowered, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quantities_and_units() {
        assert_eq!(normalize("2 Cups Flour"), "flour");
        assert_eq!(normalize("1.5 tbsp  olive   oil"), "olive oil");
        assert_eq!(normalize("Butter 100g"), "butter");
        assert_eq!(normalize("3 eggs"), "eggs");
    }

    #[test]
    fn blank_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
        assert_eq!(normalize("250 ml"), "");
    }

    #[test]
    fn unit_match_is_not_word_bounded() {
        // "2 g" is consumed out of "2 garlic cloves"
        assert_eq!(normalize("2 garlic cloves"), "arlic cloves");
    }
}

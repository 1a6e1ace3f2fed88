use std::collections::HashMap;

/// Built-in category labels and their Google Calendar color ids
const DEFAULT_COLORS: [(&str, &str); 6] = [
    ("NLS", "5"),  // Banana
    ("FLS", "9"),  // Blueberry
    ("ES", "10"),  // Basil
    ("EN", "6"),   // Tangerine
    ("NS", "8"),   // Graphite
    ("NN", "3"),   // Grape
];

/// Category to color-id lookup handed to the expander
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: HashMap<String, String>,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS
                .iter()
                .map(|(category, color)| (category.to_string(), color.to_string()))
                .collect(),
        }
    }
}

impl ColorTable {
    /// Table with no entries, so no event gets a color override
    pub fn empty() -> Self {
        Self {
            colors: HashMap::new(),
        }
    }

    /// Add or replace entries
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        for (category, color) in overrides {
            self.colors.insert(category.clone(), color.clone());
        }
        self
    }

    /// Color id for a category, `None` meaning the calendar default
    pub fn lookup(&self, category: &str) -> Option<&str> {
        self.colors.get(category.trim()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = ColorTable::default();
        assert_eq!(table.lookup("NLS"), Some("5"));
        assert_eq!(table.lookup("ES"), Some("10"));
        assert_eq!(table.lookup(" NN "), Some("3"));
        assert_eq!(table.lookup("nls"), None);
        assert_eq!(table.lookup("UNKNOWN"), None);
        assert_eq!(ColorTable::empty().lookup("NLS"), None);
    }
}

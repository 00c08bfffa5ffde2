//! Search filter and its SQL translation

use crate::model::Quartile;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Criteria for a journal search; unset fields do not constrain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Case-insensitive title substring; spaces match any run of characters
    pub keyword: Option<String>,
    pub min_sjr: Option<f64>,
    /// Journals without an impact factor never satisfy this
    pub min_impact_factor: Option<f64>,
    pub journal_type: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    /// Require at least one category ranked at or stricter than this
    pub max_quartile: Option<Quartile>,
    /// Match any of these categories
    pub categories: Vec<String>,
    /// Match any of these areas
    pub areas: Vec<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: &str) -> Self {
        self.keyword = Some(keyword.to_string());
        self
    }

    pub fn min_sjr(mut self, sjr: f64) -> Self {
        self.min_sjr = Some(sjr);
        self
    }

    pub fn min_impact_factor(mut self, impact_factor: f64) -> Self {
        self.min_impact_factor = Some(impact_factor);
        self
    }

    pub fn journal_type(mut self, journal_type: &str) -> Self {
        self.journal_type = Some(journal_type.to_string());
        self
    }

    pub fn country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn max_quartile(mut self, quartile: Quartile) -> Self {
        self.max_quartile = Some(quartile);
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.categories.push(category.to_string());
        self
    }

    pub fn area(mut self, area: &str) -> Self {
        self.areas.push(area.to_string());
        self
    }

    /// True when no criterion is set
    pub fn is_empty(&self) -> bool {
        self.to_sql().0.is_empty()
    }

    /// Build the WHERE clause over `journals j` and its bound values
    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(pattern) = self.keyword.as_deref().and_then(like_pattern) {
            clauses.push("j.title LIKE ? ESCAPE '\\'".to_string());
            values.push(Value::Text(pattern));
        }

        if let Some(sjr) = self.min_sjr {
            clauses.push("j.sjr >= ?".to_string());
            values.push(Value::Real(sjr));
        }

        if let Some(impact_factor) = self.min_impact_factor {
            clauses.push("j.impact_factor >= ?".to_string());
            values.push(Value::Real(impact_factor));
        }

        for (column, value) in [
            ("j.type", &self.journal_type),
            ("j.country", &self.country),
            ("j.region", &self.region),
        ] {
            if let Some(value) = non_blank(value) {
                clauses.push(format!("{column} = ?"));
                values.push(Value::Text(value.to_string()));
            }
        }

        let quartiles = self.max_quartile.map(|q| q.at_least()).unwrap_or_default();
        if !self.categories.is_empty() || !quartiles.is_empty() {
            let mut sub = String::from(
                "EXISTS (SELECT 1 FROM journals_categories jc WHERE jc.journal_id = j.id",
            );
            if !self.categories.is_empty() {
                sub.push_str(&format!(" AND jc.category IN ({})", placeholders(self.categories.len())));
                values.extend(self.categories.iter().cloned().map(Value::Text));
            }
            if !quartiles.is_empty() {
                sub.push_str(&format!(" AND jc.quartile IN ({})", placeholders(quartiles.len())));
                values.extend(quartiles.iter().map(|q| Value::Text(q.as_str().to_string())));
            }
            sub.push(')');
            clauses.push(sub);
        }

        if !self.areas.is_empty() {
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM journals_areas ja WHERE ja.journal_id = j.id AND ja.area IN ({}))",
                placeholders(self.areas.len())
            ));
            values.extend(self.areas.iter().cloned().map(Value::Text));
        }

        (clauses.join(" AND "), values)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// `%...%` LIKE pattern with wildcards escaped and spaces turned into gaps
fn like_pattern(keyword: &str) -> Option<String> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return None;
    }

    let mut pattern = String::from("%");
    for c in keyword.chars() {
        match c {
            '%' | '_' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            ' ' => pattern.push('%'),
            _ => pattern.push(c),
        }
    }
    pattern.push('%');
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("machine learning").unwrap(), "%machine%learning%");
        assert_eq!(like_pattern("100%_").unwrap(), "%100\\%\\_%");
        assert!(like_pattern("   ").is_none());
    }

    #[test]
    fn test_empty_filter() {
        assert!(SearchFilter::new().is_empty());
        assert!(SearchFilter::new().keyword("  ").is_empty());
        assert!(SearchFilter::new().country("").is_empty());
        assert!(!SearchFilter::new().min_sjr(0.0).is_empty());
    }

    #[test]
    fn test_sql_binds_in_order() {
        let filter = SearchFilter::new()
            .keyword("cancer")
            .country("France")
            .category("Oncology")
            .max_quartile(Quartile::Q2)
            .area("Medicine");

        let (sql, values) = filter.to_sql();
        assert_eq!(sql.matches('?').count(), values.len());
        assert!(sql.contains("jc.category IN (?)"));
        assert!(sql.contains("jc.quartile IN (?, ?)"));
        assert_eq!(
            values,
            vec![
                Value::Text("%cancer%".to_string()),
                Value::Text("France".to_string()),
                Value::Text("Oncology".to_string()),
                Value::Text("Q1".to_string()),
                Value::Text("Q2".to_string()),
                Value::Text("Medicine".to_string()),
            ]
        );
    }

    #[test]
    fn test_unranked_threshold_does_not_constrain() {
        assert!(SearchFilter::new().max_quartile(Quartile::Unranked).is_empty());
    }
}

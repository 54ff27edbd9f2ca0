use crate::utils::error::ErrorKind;
use serde::Deserialize;
use std::collections::HashSet;

/// One city/postal-code pairing as returned by the locality API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locality {
    pub name: String,
    pub postal_code: String,
}

impl Locality {
    pub fn new(name: impl Into<String>, postal_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            postal_code: postal_code.into(),
        }
    }
}

/// Filters for a single lookup. Without `exact` both filters match by prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalityQuery {
    pub name: Option<String>,
    pub postal_code: Option<String>,
    pub exact: bool,
}

impl LocalityQuery {
    pub fn prefix_by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn prefix_by_postal_code(postal_code: impl Into<String>) -> Self {
        Self {
            postal_code: Some(postal_code.into()),
            ..Self::default()
        }
    }

    pub fn exact_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            postal_code: None,
            exact: true,
        }
    }

    /// 組出 API 查詢參數；API 以正規表達式比對，值一律跳脫後錨定
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let render = |value: &str| {
            if self.exact {
                format!("^{}$", regex::escape(value))
            } else {
                format!("^{}", regex::escape(value))
            }
        };

        let mut params = Vec::new();
        if let Some(postal_code) = self.postal_code.as_deref().filter(|v| !v.is_empty()) {
            params.push(("postalCode", render(postal_code)));
        }
        if let Some(name) = self.name.as_deref().filter(|v| !v.is_empty()) {
            params.push(("name", render(name)));
        }
        params
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Idle,
    EditingCity,
    EditingPostalCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dropdown {
    CitySuggestions,
    PostalCodeOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FormError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything the address form renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub city_text: String,
    pub postal_code_text: String,
    pub city_suggestions: Vec<Locality>,
    pub postal_code_options: Vec<String>,
    pub postal_dropdown_open: bool,
    pub error: Option<FormError>,
    pub mode: InputMode,
    pub selection_confirmed: bool,
}

impl FormState {
    pub fn error_message(&self) -> &str {
        self.error.as_ref().map(|e| e.message.as_str()).unwrap_or("")
    }

    pub fn city_names(&self) -> Vec<&str> {
        self.city_suggestions.iter().map(|l| l.name.as_str()).collect()
    }

    /// City suggestions win over the postal option list; both are never
    /// shown together.
    pub fn open_dropdown(&self) -> Option<Dropdown> {
        if !self.city_suggestions.is_empty() {
            Some(Dropdown::CitySuggestions)
        } else if self.postal_dropdown_open && self.postal_code_options.len() > 1 {
            Some(Dropdown::PostalCodeOptions)
        } else {
            None
        }
    }

    pub fn clear_suggestions(&mut self) {
        self.city_suggestions.clear();
        self.postal_code_options.clear();
        self.postal_dropdown_open = false;
    }
}

/// Keeps the first locality for every name, in input order.
pub fn dedup_by_name(localities: Vec<Locality>) -> Vec<Locality> {
    let mut seen = HashSet::new();
    localities
        .into_iter()
        .filter(|l| seen.insert(l.name.clone()))
        .collect()
}

pub fn dedup_postal_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .filter(|c| seen.insert(*c))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_by_name_keeps_first() {
        let input = vec![
            Locality::new("A", "1"),
            Locality::new("A", "2"),
            Locality::new("B", "3"),
        ];

        let result = dedup_by_name(input);
        let names: Vec<&str> = result.iter().map(|l| l.name.as_str()).collect();

        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(result[0].postal_code, "1");
    }

    #[test]
    fn test_dedup_postal_codes_preserves_order() {
        let codes = dedup_postal_codes(["10115", "10117", "10115", "10119"]);
        assert_eq!(codes, vec!["10115", "10117", "10119"]);
    }

    #[test]
    fn test_locality_deserializes_api_payload() {
        let payload = serde_json::json!([
            {
                "postalCode": "80331",
                "name": "München",
                "municipality": {"key": "09162000", "name": "München", "type": "Kreisfreie Stadt"},
                "federalState": {"key": "09", "name": "Bayern"}
            }
        ]);

        let localities: Vec<Locality> = serde_json::from_value(payload).unwrap();
        assert_eq!(localities, vec![Locality::new("München", "80331")]);
    }

    #[test]
    fn test_prefix_params_are_anchored_and_escaped() {
        let params = LocalityQuery::prefix_by_name("St. Ingbert").to_params();
        assert_eq!(params, vec![("name", "^St\\. Ingbert".to_string())]);

        let params = LocalityQuery::prefix_by_postal_code("80331").to_params();
        assert_eq!(params, vec![("postalCode", "^80331".to_string())]);
    }

    #[test]
    fn test_exact_params_are_fully_anchored() {
        let params = LocalityQuery::exact_name("Berlin").to_params();
        assert_eq!(params, vec![("name", "^Berlin$".to_string())]);
    }

    #[test]
    fn test_exact_params_match_names_with_parentheses() {
        for name in ["Halle (Saale)", "Frankfurt (Oder)"] {
            let params = LocalityQuery::exact_name(name).to_params();
            let pattern = regex::Regex::new(&params[0].1).unwrap();

            assert!(pattern.is_match(name));
            assert!(!pattern.is_match(&format!("{} Nord", name)));
        }
    }

    #[test]
    fn test_empty_filters_are_omitted() {
        let query = LocalityQuery {
            name: Some(String::new()),
            postal_code: None,
            exact: false,
        };
        assert!(query.to_params().is_empty());
    }

    #[test]
    fn test_open_dropdown_prefers_city_suggestions() {
        let mut state = FormState {
            postal_code_options: vec!["10115".into(), "10117".into()],
            postal_dropdown_open: true,
            ..FormState::default()
        };
        assert_eq!(state.open_dropdown(), Some(Dropdown::PostalCodeOptions));

        state.city_suggestions = vec![Locality::new("Berlin", "10115")];
        assert_eq!(state.open_dropdown(), Some(Dropdown::CitySuggestions));

        state.clear_suggestions();
        assert_eq!(state.open_dropdown(), None);
    }
}

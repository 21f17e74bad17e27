//! Raw filter parameters as they arrive on the query string.

use serde::Serialize;

/// A single parameter value: a scalar or an array (`key[]=a&key[]=b`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Single(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// The scalar value, `None` for arrays
    #[must_use]
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Many(_) => None,
        }
    }

    /// The array elements, `None` for scalars
    #[must_use]
    pub fn as_many(&self) -> Option<&[String]> {
        match self {
            Self::Single(_) => None,
            Self::Many(values) => Some(values),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for FilterValue {
    fn from(values: Vec<S>) -> Self {
        Self::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Parameter name to value, in first-seen order.
///
/// Empty values count as absent. Keys written as `name[]` or `name[N]`
/// accumulate into a [`FilterValue::Many`]; a repeated plain key keeps its
/// last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRequest {
    entries: Vec<(String, FilterValue)>,
}

impl FilterRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from decoded `(key, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = Self::new();
        for (key, value) in pairs {
            request.push_pair(key.as_ref(), value.as_ref());
        }
        request
    }

    /// Build from a raw (still percent-encoded) query string
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// Builder-style insert, replacing any previous value for `key`
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: FilterValue) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Scalar value for `key`, `None` when absent or an array
    #[must_use]
    pub fn single(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FilterValue::as_single)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push_pair(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            return;
        }

        match array_key(key) {
            Some(name) => match self.entries.iter_mut().find(|(k, _)| k == name) {
                Some((_, FilterValue::Many(values))) => values.push(value.to_string()),
                Some((_, existing)) => *existing = FilterValue::Many(vec![value.to_string()]),
                None => self
                    .entries
                    .push((name.to_string(), FilterValue::Many(vec![value.to_string()]))),
            },
            None => self.insert(key, FilterValue::Single(value.to_string())),
        }
    }
}

/// `skills[]` and `skills[3]` name the array `skills`
fn array_key(key: &str) -> Option<&str> {
    let (name, rest) = key.split_once('[')?;
    let index = rest.strip_suffix(']')?;
    if name.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_pairs() {
        let request = FilterRequest::from_pairs([("search", "Duilio"), ("state", "active")]);
        assert_eq!(request.single("search"), Some("Duilio"));
        assert_eq!(request.single("state"), Some("active"));
        assert!(!request.contains("role"));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let request = FilterRequest::from_pairs([("search", ""), ("role", "admin")]);
        assert!(!request.contains("search"));
        assert!(request.contains("role"));
    }

    #[test]
    fn test_bracket_keys_collect_into_many() {
        let request = FilterRequest::from_query("skills%5B%5D=1&skills%5B%5D=3&search=x");
        assert_eq!(
            request.get("skills"),
            Some(&FilterValue::Many(vec!["1".into(), "3".into()]))
        );
        assert_eq!(request.single("skills"), None);
    }

    #[test]
    fn test_indexed_bracket_keys() {
        let request = FilterRequest::from_pairs([("skills[0]", "2"), ("skills[1]", "5")]);
        assert_eq!(
            request.get("skills").and_then(FilterValue::as_many),
            Some(&["2".to_string(), "5".to_string()][..])
        );
    }

    #[test]
    fn test_repeated_plain_key_last_wins() {
        let request = FilterRequest::from_query("order=email&order=first_name-desc");
        assert_eq!(request.single("order"), Some("first_name-desc"));
    }

    #[test]
    fn test_order_of_first_appearance_is_kept() {
        let request = FilterRequest::from_query("role=user&search=a&role=admin");
        let keys: Vec<&str> = request.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["role", "search"]);
    }

    #[test]
    fn test_malformed_brackets_are_plain_keys() {
        let request = FilterRequest::from_pairs([("skills[a]", "1"), ("[]", "2")]);
        assert!(request.contains("skills[a]"));
        assert!(request.contains("[]"));
        assert!(!request.contains("skills"));
    }

    #[test]
    fn test_percent_decoding() {
        let request = FilterRequest::from_query("search=Duilio%20Palacios&from=01%2F10%2F2020");
        assert_eq!(request.single("search"), Some("Duilio Palacios"));
        assert_eq!(request.single("from"), Some("01/10/2020"));
    }
}

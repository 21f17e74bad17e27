//! Sortable-column tokens: `column` sorts ascending, `column-desc` descending.
//!
//! A token is only ever accepted when its column is in the caller's whitelist,
//! compared verbatim. Anything else parses to `None` and the caller keeps its
//! default order; a bad `order` parameter is never an error.

use sea_orm::sea_query::Order;

use super::request::FilterValue;

/// Suffix marking a descending token
pub const DESC_SUFFIX: &str = "-desc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

/// A whitelisted column and a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parse a raw token against `whitelist`
    #[must_use]
    pub fn parse(token: &str, whitelist: &[&'static str]) -> Option<Self> {
        let (column, direction) = match token.strip_suffix(DESC_SUFFIX) {
            Some(column) => (column, SortDirection::Desc),
            None => (token, SortDirection::Asc),
        };

        whitelist
            .iter()
            .find(|allowed| **allowed == column)
            .map(|&allowed| Self {
                column: allowed,
                direction,
            })
    }

    /// Parse a request value; arrays never name a sort column
    #[must_use]
    pub fn from_value(value: &FilterValue, whitelist: &[&'static str]) -> Option<Self> {
        value
            .as_single()
            .and_then(|token| Self::parse(token, whitelist))
    }

    /// The token that parses back to this spec
    #[must_use]
    pub fn token(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.column.to_string(),
            SortDirection::Desc => format!("{}{DESC_SUFFIX}", self.column),
        }
    }
}

/// Public sort token to the expression actually ordered by.
///
/// Tokens without an entry resolve to themselves.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAliases {
    entries: &'static [(&'static str, &'static str)],
}

impl ColumnAliases {
    #[must_use]
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn resolve<'a>(&self, token: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(public, _)| *public == token)
            .map_or(token, |&(_, column)| column)
    }
}

/// Builds column-header links that toggle the sort direction.
///
/// The current filters are carried over to every link; the page is dropped
/// because a new order starts back on page one.
#[derive(Debug, Clone)]
pub struct SortableLinks {
    base_url: String,
    current: Option<String>,
    query: Vec<(String, String)>,
}

impl SortableLinks {
    /// `current_order` is the raw `order` token of the current request
    #[must_use]
    pub fn new(base_url: impl Into<String>, current_order: Option<&str>) -> Self {
        Self {
            base_url: base_url.into(),
            current: current_order.map(ToString::to_string),
            query: Vec::new(),
        }
    }

    /// Parameters to preserve in every link
    #[must_use]
    pub fn appends(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Link for a column header: flips to descending when the column is
    /// currently sorted ascending, otherwise sorts ascending
    #[must_use]
    pub fn url(&self, column: &str) -> String {
        if self.is_sorting_by(column, SortDirection::Asc) {
            self.build_url(&format!("{column}{DESC_SUFFIX}"))
        } else {
            self.build_url(column)
        }
    }

    /// CSS classes describing the column's sort state
    #[must_use]
    pub fn classes(&self, column: &str) -> &'static str {
        if self.is_sorting_by(column, SortDirection::Asc) {
            "link-sortable link-sorted-up"
        } else if self.is_sorting_by(column, SortDirection::Desc) {
            "link-sortable link-sorted-down"
        } else {
            "link-sortable"
        }
    }

    fn is_sorting_by(&self, column: &str, direction: SortDirection) -> bool {
        let Some(current) = self.current.as_deref() else {
            return false;
        };
        match direction {
            SortDirection::Asc => current == column,
            SortDirection::Desc => current.strip_suffix(DESC_SUFFIX) == Some(column),
        }
    }

    fn build_url(&self, order: &str) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let mut order_written = false;

        for (key, value) in &self.query {
            match key.as_str() {
                "page" => {}
                "order" => {
                    if !order_written {
                        serializer.append_pair("order", order);
                        order_written = true;
                    }
                }
                _ => {
                    serializer.append_pair(key, value);
                }
            }
        }
        if !order_written {
            serializer.append_pair("order", order);
        }

        format!("{}?{}", self.base_url, serializer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[&str] = &["first_name", "email", "date", "login"];

    #[test]
    fn test_plain_column_sorts_ascending() {
        let spec = SortSpec::parse("first_name", COLUMNS).unwrap();
        assert_eq!(spec.column, "first_name");
        assert_eq!(spec.direction, SortDirection::Asc);
        assert_eq!(spec.direction.order(), Order::Asc);
    }

    #[test]
    fn test_desc_suffix_sorts_descending() {
        let spec = SortSpec::parse("email-desc", COLUMNS).unwrap();
        assert_eq!(spec.column, "email");
        assert_eq!(spec.direction, SortDirection::Desc);
        assert_eq!(spec.direction.order(), Order::Desc);
    }

    #[test]
    fn test_rejects_tokens_that_are_not_exact() {
        for token in [
            "first_name-descendent",
            "email-descx",
            "first_name_descendent",
            "desc-first_name",
            "asc-first_name",
            "asc-name",
            "name",
            "id",
            "FIRST_NAME",
            "-desc",
            "",
            "first_name-desc-desc",
        ] {
            assert_eq!(SortSpec::parse(token, COLUMNS), None, "{token} should not parse");
        }
    }

    #[test]
    fn test_arrays_never_parse() {
        let value = FilterValue::Many(vec!["first_name".into()]);
        assert_eq!(SortSpec::from_value(&value, COLUMNS), None);
        assert_eq!(SortSpec::from_value(&FilterValue::Many(vec![]), COLUMNS), None);
    }

    #[test]
    fn test_scalar_value_parses() {
        let value = FilterValue::from("login-desc");
        let spec = SortSpec::from_value(&value, COLUMNS).unwrap();
        assert_eq!(spec.column, "login");
        assert_eq!(spec.direction, SortDirection::Desc);
    }

    #[test]
    fn test_whitelist_entry_containing_suffix_text() {
        // a column whose own name ends in "-desc" only sorts descending via the suffix
        let spec = SortSpec::parse("sub-desc", &["sub"]).unwrap();
        assert_eq!(spec.direction, SortDirection::Desc);
        assert_eq!(SortSpec::parse("sub-desc", &["sub-desc"]), None);
    }

    #[test]
    fn test_token_matches_input() {
        assert_eq!(SortSpec::parse("date", COLUMNS).unwrap().token(), "date");
        assert_eq!(SortSpec::parse("date-desc", COLUMNS).unwrap().token(), "date-desc");
    }

    #[test]
    fn test_aliases_resolve_known_tokens_only() {
        let aliases = ColumnAliases::new(&[("date", "created_at"), ("login", "last_login_at")]);
        assert_eq!(aliases.resolve("date"), "created_at");
        assert_eq!(aliases.resolve("login"), "last_login_at");
        assert_eq!(aliases.resolve("email"), "email");
    }

    #[test]
    fn test_sortable_url_toggles_direction() {
        let links = SortableLinks::new("/users", Some("first_name"));
        assert_eq!(links.url("first_name"), "/users?order=first_name-desc");
        assert_eq!(links.url("email"), "/users?order=email");

        let links = SortableLinks::new("/users", Some("first_name-desc"));
        assert_eq!(links.url("first_name"), "/users?order=first_name");

        let links = SortableLinks::new("/users", None);
        assert_eq!(links.url("first_name"), "/users?order=first_name");
    }

    #[test]
    fn test_sortable_url_keeps_filters_and_drops_page() {
        let links = SortableLinks::new("/users", Some("email")).appends(vec![
            ("search".into(), "Duilio".into()),
            ("order".into(), "email".into()),
            ("page".into(), "3".into()),
            ("state".into(), "active".into()),
        ]);
        assert_eq!(
            links.url("email"),
            "/users?search=Duilio&order=email-desc&state=active"
        );
    }

    #[test]
    fn test_sortable_classes() {
        let links = SortableLinks::new("/users", Some("first_name"));
        assert_eq!(links.classes("first_name"), "link-sortable link-sorted-up");
        assert_eq!(links.classes("email"), "link-sortable");

        let links = SortableLinks::new("/users", Some("first_name-desc"));
        assert_eq!(links.classes("first_name"), "link-sortable link-sorted-down");

        let links = SortableLinks::new("/users", Some("first_name-descx"));
        assert_eq!(links.classes("first_name"), "link-sortable");
    }
}

//! Query string building.
//!
//! Optional parameters are `Option`s on the request types; `None` means the
//! parameter is not sent at all, while `Some(false)` or `Some(0)` is sent
//! verbatim.

use std::fmt::Display;

use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(&'static str, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key=value` when `value` is present.
    pub fn push<V: Display>(&mut self, key: &'static str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.pairs.push((key, value.to_string()));
        }
        self
    }

    /// Add one `key=item` pair per item when `values` is present.
    pub fn push_each<V: Display>(&mut self, key: &'static str, values: Option<&[V]>) -> &mut Self {
        for value in values.unwrap_or_default() {
            self.pairs.push((key, value.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Append the pairs to `url`. A query with no pairs leaves the URL
    /// untouched rather than adding a bare `?`.
    pub fn apply_to(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            return;
        }
        let mut serializer = url.query_pairs_mut();
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://localhost:5601/api/fleet/agents").unwrap()
    }

    #[test]
    fn none_values_are_omitted() {
        let mut query = Query::new();
        query.push("page", None::<u32>).push("kuery", None::<&str>);
        assert!(query.is_empty());

        let mut url = url();
        query.apply_to(&mut url);
        assert_eq!(url.as_str(), "http://localhost:5601/api/fleet/agents");
    }

    #[test]
    fn false_and_zero_are_sent() {
        let mut query = Query::new();
        query.push("showInactive", Some(false)).push("page", Some(0u32));

        let mut url = url();
        query.apply_to(&mut url);
        assert_eq!(url.query(), Some("showInactive=false&page=0"));
    }

    #[test]
    fn values_are_form_encoded() {
        let mut query = Query::new();
        query.push("kuery", Some("policy_id:\"a b\""));

        let mut url = url();
        query.apply_to(&mut url);
        let decoded: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(decoded, vec![("kuery".to_string(), "policy_id:\"a b\"".to_string())]);
    }

    #[test]
    fn push_each_repeats_the_key() {
        let mut query = Query::new();
        query.push_each("ids", Some(&["a", "b"][..]));
        query.push_each::<&str>("tags", None);
        assert_eq!(
            query.pairs(),
            &[("ids", "a".to_string()), ("ids", "b".to_string())]
        );
    }
}

use crate::filter::Filter;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// One request against a `/nmdcschema/{collection}` endpoint.
///
/// A `Query` describes a single page. Pagination derives follow-up queries
/// with [`Query::with_page_token`], leaving everything else untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    collection: String,
    filter: String,
    page_size: u32,
    fields: Vec<String>,
    page_token: Option<String>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            fields: Vec::new(),
            page_token: None,
        }
    }

    /// Raw filter string, passed to the server verbatim.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn filter_expr(self, filter: &Filter) -> Self {
        self.filter(filter.encode())
    }

    /// Page size; values below 1 are clamped to 1.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    pub fn with_page_token(&self, token: impl Into<String>) -> Self {
        self.clone().page_token(token)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filter_value(&self) -> &str {
        &self.filter
    }

    pub fn page_size_value(&self) -> u32 {
        self.page_size
    }

    pub fn fields_value(&self) -> &[String] {
        &self.fields
    }

    pub fn page_token_value(&self) -> Option<&str> {
        self.page_token.as_deref()
    }

    /// Endpoint path segments below the API base URL, unencoded.
    pub(crate) fn segments(&self) -> [&str; 2] {
        ["nmdcschema", &self.collection]
    }

    /// Query-string parameters, in wire order. Empty filter and projection
    /// are left out so the server applies its defaults.
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(4);
        if !self.filter.is_empty() {
            params.push(("filter", self.filter.clone()));
        }
        params.push(("page_size", self.page_size.to_string()));
        if !self.fields.is_empty() {
            params.push(("projection", self.fields.join(",")));
        }
        if let Some(token) = &self.page_token {
            params.push(("page_token", token.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_page_params() {
        let q = Query::new("study_set")
            .filter(r#"{"name":"x"}"#)
            .page_size(2)
            .fields(["id", "name"]);

        assert_eq!(q.segments(), ["nmdcschema", "study_set"]);
        assert_eq!(
            q.params(),
            vec![
                ("filter", r#"{"name":"x"}"#.to_string()),
                ("page_size", "2".to_string()),
                ("projection", "id,name".to_string()),
            ]
        );
    }

    #[test]
    fn empty_filter_and_projection_are_omitted() {
        let q = Query::new("biosample_set");
        assert_eq!(q.params(), vec![("page_size", "100".to_string())]);
    }

    #[test]
    fn page_token_only_changes_token() {
        let q = Query::new("study_set").page_size(0);
        let next = q.with_page_token("abc");

        assert_eq!(q.page_size_value(), 1);
        assert_eq!(q.page_token_value(), None);
        assert_eq!(next.page_token_value(), Some("abc"));
        assert_eq!(next.with_page_token("def").page_size_value(), 1);
        assert_eq!(
            next.params().last(),
            Some(&("page_token", "abc".to_string()))
        );
    }
}

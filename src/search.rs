//! Per-collection lookups on top of [`Client`].
//!
//! A [`CollectionSearch`] carries the collection name plus the page size,
//! projection and "all pages" switch shared by every lookup.

use std::fmt;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::filter::{Comparison, Filter};
use crate::pagination::Record;
use crate::query::Query;
use crate::util::id_values;

pub const STUDY_SET: &str = "study_set";
pub const BIOSAMPLE_SET: &str = "biosample_set";
pub const DATA_OBJECT_SET: &str = "data_object_set";
pub const FIELD_RESEARCH_SITE_SET: &str = "field_research_site_set";
pub const PROCESS_SAMPLE_SET: &str = "process_sample_set";
pub const FUNCTIONAL_ANNOTATION_AGG: &str = "functional_annotation_agg";

pub const LATITUDE_FIELD: &str = "lat_lon.latitude";
pub const LONGITUDE_FIELD: &str = "lat_lon.longitude";

pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 25;

/// Maximum number of ids sent in one `$in` filter.
pub const ID_CHUNK_SIZE: usize = 100;

/// Functional annotation identifiers accepted by `gene_function_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionalId {
    Kegg(String),
    Cog(String),
    Pfam(String),
}

impl fmt::Display for FunctionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionalId::Kegg(id) => write!(f, "KEGG.ORTHOLOGY:{}", id),
            FunctionalId::Cog(id) => write!(f, "COG:{}", id),
            FunctionalId::Pfam(id) => write!(f, "PFAM:{}", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionSearch<'a> {
    client: &'a Client,
    collection: String,
    page_size: u32,
    fields: Vec<String>,
    all_pages: bool,
}

impl<'a> CollectionSearch<'a> {
    pub fn new(client: &'a Client, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
            page_size: DEFAULT_SEARCH_PAGE_SIZE,
            fields: Vec::new(),
            all_pages: false,
        }
    }

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

    /// Follow `next_page_token` to the end instead of stopping after page one.
    pub fn all_pages(mut self, all_pages: bool) -> Self {
        self.all_pages = all_pages;
        self
    }

    pub fn name(&self) -> &str {
        &self.collection
    }

    /// The query every lookup starts from, before a filter is applied.
    pub fn query(&self) -> Query {
        Query::new(self.collection.clone())
            .page_size(self.page_size)
            .fields(self.fields.iter().cloned())
    }

    pub fn records(&self) -> Result<Vec<Record>> {
        self.run(self.query())
    }

    pub fn records_by_filter(&self, filter: &Filter) -> Result<Vec<Record>> {
        self.run(self.query().filter_expr(filter))
    }

    /// Raw MongoDB-style filter string, sent as-is.
    pub fn records_by_raw_filter(&self, filter: &str) -> Result<Vec<Record>> {
        self.run(self.query().filter(filter))
    }

    /// Regex match of `value` against `attribute`.
    pub fn records_by_attribute(&self, attribute: &str, value: &str) -> Result<Vec<Record>> {
        self.records_by_filter(&Filter::regex(attribute, value))
    }

    pub fn record_by_id(&self, id: &str) -> Result<Record> {
        self.client.record_by_id(&self.collection, id)
    }

    pub fn records_by_latitude(&self, op: Comparison, latitude: f64) -> Result<Vec<Record>> {
        self.records_by_filter(&coordinate(LATITUDE_FIELD, op, latitude)?)
    }

    pub fn records_by_longitude(&self, op: Comparison, longitude: f64) -> Result<Vec<Record>> {
        self.records_by_filter(&coordinate(LONGITUDE_FIELD, op, longitude)?)
    }

    /// Both coordinates at once, e.g. north of 45 and west of -100.
    pub fn records_by_lat_long(
        &self,
        lat_op: Comparison,
        latitude: f64,
        long_op: Comparison,
        longitude: f64,
    ) -> Result<Vec<Record>> {
        let filter = coordinate(LATITUDE_FIELD, lat_op, latitude)?
            .and(coordinate(LONGITUDE_FIELD, long_op, longitude)?);
        self.records_by_filter(&filter)
    }

    pub fn data_objects_by_type(&self, data_object_type: &str) -> Result<Vec<Record>> {
        self.records_by_filter(&Filter::regex("data_object_type", data_object_type))
    }

    pub fn functional_annotations(&self, id: &FunctionalId) -> Result<Vec<Record>> {
        self.records_by_filter(&Filter::equals("gene_function_id", id.to_string()))
    }

    /// Follows references from `source` into this collection.
    ///
    /// Takes the `id_field` values of `source` (lists are flattened) and
    /// fetches every record here whose `match_field` is one of them. Ids are
    /// sent in chunks of [`ID_CHUNK_SIZE`]; every chunk is fetched to the last
    /// page regardless of `all_pages`.
    pub fn records_for_ids(
        &self,
        source: &[Record],
        id_field: &str,
        match_field: &str,
    ) -> Result<Vec<Record>> {
        let ids = id_values(source, id_field)?;
        let mut out = Vec::new();
        for chunk in ids.chunks(ID_CHUNK_SIZE) {
            let filter = Filter::any_of(match_field, chunk.iter().cloned());
            out.extend(self.client.fetch_all(&self.query().filter_expr(&filter))?);
        }
        Ok(out)
    }

    fn run(&self, query: Query) -> Result<Vec<Record>> {
        if self.all_pages {
            self.client.fetch_all(&query)
        } else {
            Ok(self.client.fetch_page(&query)?.items)
        }
    }
}

/// NaN and infinities would serialize as `null` and silently change the query.
fn coordinate(field: &str, op: Comparison, value: f64) -> Result<Filter> {
    if !value.is_finite() {
        return Err(Error::NonFiniteValue {
            field: field.to_string(),
            value,
        });
    }
    Ok(Filter::compare(field, op, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn functional_id_prefixes() {
        assert_eq!(
            FunctionalId::Kegg("K00001".into()).to_string(),
            "KEGG.ORTHOLOGY:K00001"
        );
        assert_eq!(FunctionalId::Cog("COG0001".into()).to_string(), "COG:COG0001");
        assert_eq!(FunctionalId::Pfam("PF00001".into()).to_string(), "PFAM:PF00001");
    }

    #[test]
    fn base_query_carries_settings() {
        let client = Client::new(Some("http://127.0.0.1:1".into()), Some(true)).unwrap();
        let search = client
            .collection(BIOSAMPLE_SET)
            .page_size(0)
            .fields(["id", "name"]);
        let q = search.query();

        assert_eq!(search.name(), "biosample_set");
        assert_eq!(q.collection(), "biosample_set");
        assert_eq!(q.page_size_value(), 1);
        assert_eq!(q.fields_value(), ["id".to_string(), "name".to_string()]);
        assert_eq!(q.page_token_value(), None);
    }

    #[test]
    fn lat_long_filter_combines_both_axes() {
        let f = coordinate(LATITUDE_FIELD, Comparison::Gt, 45.0)
            .unwrap()
            .and(coordinate(LONGITUDE_FIELD, Comparison::Lte, -100.5).unwrap());
        assert_eq!(
            f.encode(),
            r#"{"$and":[{"lat_lon.latitude":{"$gt":45.0}},{"lat_lon.longitude":{"$lte":-100.5}}]}"#
        );
    }

    #[test]
    fn non_finite_coordinates_are_rejected_before_any_request() {
        // Nothing listens on port 1; a request would surface as Transport.
        let client = Client::new(Some("http://127.0.0.1:1".into()), Some(true)).unwrap();
        let search = client.collection(BIOSAMPLE_SET);

        let err = search
            .records_by_latitude(Comparison::Gt, f64::NAN)
            .unwrap_err();
        assert!(matches!(err, Error::NonFiniteValue { ref field, .. } if field == LATITUDE_FIELD));

        let err = search
            .records_by_lat_long(Comparison::Gt, 10.0, Comparison::Lt, f64::INFINITY)
            .unwrap_err();
        assert!(matches!(err, Error::NonFiniteValue { ref field, .. } if field == LONGITUDE_FIELD));

        let err = search
            .records_by_longitude(Comparison::Eq, f64::NEG_INFINITY)
            .unwrap_err();
        assert!(matches!(err, Error::NonFiniteValue { .. }));
    }
}

//! A small Rust client for the NMDC (National Microbiome Data Collaborative)
//! metadata API.
//!
//! The API serves collections of JSON records (`study_set`, `biosample_set`,
//! ...) from `/nmdcschema/{collection}`, a page at a time. This crate builds
//! those requests, follows `next_page_token` to collect complete result
//! sets, and can lay the records out as a [`Table`].
//!
//! ## Quick start
//! - The base URL defaults to `https://api.microbiomedata.org`; override it
//!   with `NMDC_API_URL` or a `.nmdcrc` file (`url: ...`).
//! - Build one [`Client`] and pass it around by reference.
//!
//! ```no_run
//! use nmdcapi::{Client, Comparison, Filter, Query, Table};
//!
//! fn main() -> nmdcapi::Result<()> {
//!     let client = Client::from_env()?;
//!
//!     let query = Query::new("study_set")
//!         .filter_expr(&Filter::regex("name", "soil"))
//!         .page_size(50)
//!         .fields(["id", "name"]);
//!     let studies = client.fetch_all(&query)?;
//!
//!     let north = client
//!         .collection("biosample_set")
//!         .all_pages(true)
//!         .records_by_latitude(Comparison::Gt, 45.0)?;
//!
//!     println!("{} studies, {} samples", studies.len(), north.len());
//!     println!("{:?}", Table::from_records(&studies).columns());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod filter;
mod pagination;
mod query;
pub mod search;
mod table;
mod util;

pub use client::{Client, ClientConfig};
pub use config::DEFAULT_BASE_URL;
pub use error::{Error, Result};
pub use filter::{Comparison, Filter};
pub use pagination::{Page, PageSource, PaginatedFetcher, Record};
pub use query::{DEFAULT_PAGE_SIZE, Query};
pub use search::{CollectionSearch, FunctionalId};
pub use table::Table;

//! Client for the Notion API, the remote record store holding all
//! dashboard data.

mod client;
mod types;

pub use client::{NotionApiError, NotionClient};
pub use types::{
    Database, DateValue, ExternalFile, FileRef, HostedFile, Page, Parent, PropertySpec,
    PropertyValue, QueryRequest, QueryResponse, RelationRef, RichText, SelectConfig, SelectOption,
    SelectValue, join_plain_text,
};

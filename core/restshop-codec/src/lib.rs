//! Attribute marshalling for restshop.
//!
//! Turns engine values into the external value model and back, derives the
//! attribute taxonomy from a bootstrap engine, and flattens the engine's
//! relation index into a connection list.

pub mod catalog;
pub mod codec;
pub mod compress;
pub mod connections;
pub mod error;

pub use catalog::{AttributeSpec, CATALOG_PRINCIPAL, TypeCatalog, classify};
pub use codec::{Units, decode, encode};
pub use compress::compress_series;
pub use connections::list_connections;
pub use error::{AttributeContext, CodecError, CodecResult};

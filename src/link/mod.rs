//! Link discovery and resolution
//!
//! [`extract_links`] pulls raw attribute values out of a downloaded body and
//! [`resolve_link`] turns each one into the scheme-less key used by the
//! frontier tree, along with the scheme to fetch it with.

mod extract;
mod resolve;

pub use extract::{extract_links, Links};
pub use resolve::{resolve, resolve_link, scheme_of, strip_scheme, Link};

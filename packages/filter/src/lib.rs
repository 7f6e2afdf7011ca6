#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filtering engine for establishment records.
//!
//! - [`predicate`] decides whether a record satisfies a
//!   [`FilterSpec`](etab_map_filter_models::FilterSpec).
//! - [`codec`] converts a filter spec to and from its query-string form.
//! - [`category_index`] collects the distinct values of every categorical
//!   field for building selector option lists.
//!
//! Nothing in this crate is fallible: malformed input degrades to "no
//! constraint".

pub mod category_index;
pub mod codec;
pub mod predicate;

pub use category_index::{CategoryIndex, CategoryOption};
pub use codec::{decode, decode_into, encode};
pub use predicate::{Predicate, matches};

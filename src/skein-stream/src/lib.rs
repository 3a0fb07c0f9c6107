//! Provides the token level plumbing for JSON based object graph
//! serialization.
//!
//! Writing is fully streaming: every call on a [`JsonWriter`] emits
//! its token right away. Reading on the other hand buffers a whole
//! document into a tree of [`Node`]s first, which can then be walked
//! in any order.

#![deny(
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    unsafe_op_in_unsafe_fn
)]

mod reader;
pub use reader::{read_document, Field, Node, Object};

mod writer;
pub use writer::JsonWriter;

mod util;

//! Link construction: descriptors and the builder

pub mod builder;
pub mod descriptor;

pub use builder::{link_from_url, LinkBuilder};
pub use descriptor::{Descriptor, Framing};

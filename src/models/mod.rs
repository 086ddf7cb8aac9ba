//! Data models
//!
//! Entities stored by the organizer (Tag, Startup, NewsLink, Post), the
//! input structs the services accept, and the URL helpers views link with.

mod newslink;
mod post;
mod startup;
mod tag;

pub use newslink::{NewsLink, NewsLinkInput};
pub use post::{Post, PostInput};
pub use startup::{Startup, StartupInput};
pub use tag::{Tag, TagInput};

/// Maximum length of any stored URL field
pub const URL_MAX_LENGTH: usize = 255;

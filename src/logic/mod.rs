pub mod authorize;
pub mod compose;
pub mod hooks;
pub mod links;
pub mod pages;
pub mod posts;
pub mod resolve;

#[cfg(test)]
mod fixtures;

pub use authorize::*;
pub use compose::PageComposer;
pub use hooks::*;
pub use links::UrlBuilder;
pub use pages::*;
pub use posts::*;
pub use resolve::PathResolver;

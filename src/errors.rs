//! Crate-wide error alias. Typed errors of the rendering layer live in
//! `video::errors` and convert into `failure::Error` with `?`.

pub use failure::{Error, ResultExt};

pub type Result<T> = ::std::result::Result<T, Error>;

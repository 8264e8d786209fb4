//! Progress display during a send

pub mod reporter;

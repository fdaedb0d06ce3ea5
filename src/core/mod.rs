// Core modules implementing multipart splitting, naming, media hints, and error modeling.
pub mod boundary;
pub mod error;
pub mod media;
pub mod multipart;
pub mod naming;

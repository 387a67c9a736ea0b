pub mod value;
pub mod event;
pub mod context;
pub mod document;
pub mod extractor;
pub mod datadog;
pub mod pipeline;
pub mod serializer;
pub mod formatter;
pub mod env;

#[cfg(feature = "layer")]
pub mod layer;

#[cfg(feature = "layer")]
pub mod init;

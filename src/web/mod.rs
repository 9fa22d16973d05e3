mod asset;
pub(crate) mod router;
pub mod server;
pub(crate) mod template;

pub(crate) mod dto;
pub(crate) mod page;
pub(crate) mod render;

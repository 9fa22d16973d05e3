pub(crate) mod external;
pub(crate) mod man;
pub(crate) mod quiz;
pub(crate) mod result;
pub mod web;

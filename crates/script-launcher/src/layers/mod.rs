pub(crate) mod execution;
pub(crate) mod service;
pub(crate) mod ui;

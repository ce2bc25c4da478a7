pub(crate) mod batch;
pub(crate) mod events;
pub(crate) mod headless;
pub(crate) mod import;
pub(crate) mod logging;
pub(crate) mod tail;

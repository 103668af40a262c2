pub(crate) mod analytics;
pub(crate) mod notify;
pub(crate) mod ranking;
pub(crate) mod scoring;
pub(crate) mod standings;

pub(crate) mod certificates;
pub(crate) mod enrollment_completion;
pub(crate) mod progress;
pub(crate) mod quiz_scoring;
pub(crate) mod session_store;

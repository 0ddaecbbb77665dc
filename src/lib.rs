pub mod core;
pub mod host;

// Hook capability and per-host registry
pub mod hooks;

// Attach/detach and lifecycle interception
pub mod runtime;

// Optional components
pub mod logging;

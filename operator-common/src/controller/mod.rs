pub mod base;
pub mod external;
pub mod reconciler;

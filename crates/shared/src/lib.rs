pub mod clock;
pub mod domain;
pub mod error;
pub mod garden;
pub mod lifecycle;
pub mod protocol;

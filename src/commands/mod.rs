mod alive;
mod cookies;
mod start;

pub use alive::alive;
pub use cookies::cookies;
pub use start::start;

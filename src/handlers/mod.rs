mod link_received;

pub use link_received::link_received;

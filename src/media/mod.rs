pub mod convert;
pub mod dispatch;
pub mod kind;
pub mod probe;

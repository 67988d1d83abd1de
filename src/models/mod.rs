pub mod hours;
pub mod session;

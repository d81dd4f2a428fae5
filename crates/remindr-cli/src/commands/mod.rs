pub mod compile;
pub mod extract;
pub mod list;
pub mod next;

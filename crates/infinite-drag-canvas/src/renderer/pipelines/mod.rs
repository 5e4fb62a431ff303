pub mod cards;
pub mod post_stack;

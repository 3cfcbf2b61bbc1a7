//! Ready-made components

mod split;
mod text_block;

pub use split::SplitPane;
pub use text_block::{TextBlock, TextBlockState};

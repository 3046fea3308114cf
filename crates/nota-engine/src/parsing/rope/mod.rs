pub mod lines;
pub mod slice;
pub mod span;

pub use lines::{LineRef, lines_with_spans};
pub use slice::{one_line_preview, preview, slice_to_string};
pub use span::Span;

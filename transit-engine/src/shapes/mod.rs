//! Vehicle path geometry: streaming one shape out of shapes.txt, and
//! cutting the piece between two stops out of it.

mod reader;
mod segment;

pub use reader::{read_shape, read_shape_file};
pub use segment::{closest_index, extract_segment};

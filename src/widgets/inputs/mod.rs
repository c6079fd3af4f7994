pub mod text;
pub mod text_edit;

pub use text::TextInput;

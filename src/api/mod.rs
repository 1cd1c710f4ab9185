pub mod selector;

pub use selector::{SceneSequenceSelector, SelectorStats};

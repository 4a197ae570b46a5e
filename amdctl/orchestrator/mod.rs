// Register walk orchestration
// Drives the state walker over the selected cores and P-states

pub mod walker;

pub use walker::StateWalker;

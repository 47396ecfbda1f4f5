pub mod contact;

pub use contact::{apply_impulses, correct_positions, ContactProps, CorrectionWeighting};

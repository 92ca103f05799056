// Crisis screening
// Offline keyword match that runs independently of the language model

mod detector;

pub use detector::{CrisisDetector, CrisisKeywords};

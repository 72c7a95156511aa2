pub mod accumulator;
pub mod decoder;

pub use accumulator::{StreamAccumulator, StreamObserver, StreamOutcome};
pub use decoder::{decode, Fragment, DONE_MARKER};

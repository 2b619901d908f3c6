pub mod codec;

pub use codec::{decode, encode, AggregateEntry, DecodeError, Submission};

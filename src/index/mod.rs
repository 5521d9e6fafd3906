//! Index construction: postings codec, merge engine, token dictionary,
//! buffer and indexing session.

pub mod buffer;
pub mod codec;
pub mod dictionary;
pub mod merge;
pub mod session;

pub use buffer::IndexBuffer;
pub use codec::{decode, encode, DeltaCodec, PlainCodec, PostingsCodec};
pub use dictionary::{ResolveContext, TokenDictionary};
pub use merge::{
    merge_fragment, merge_index_fragments, merge_postings_lists, IndexFragments, TokenFragment,
};
pub use session::{IndexSession, SessionState, SessionStats};

pub mod entities;
pub mod errors;
pub mod key_codec;
pub mod value_objects;

pub use key_codec::KeyCodec;

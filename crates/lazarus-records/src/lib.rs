pub mod catalog;
pub use catalog::{Catalog, Plan, Service};
pub mod codec;
pub use codec::{Codec, CodecError, NoopCodec};
pub mod error;
pub use error::RecordError;
pub mod record;
pub use record::{Binding, Instance};
pub mod store;
pub use store::RecordStore;

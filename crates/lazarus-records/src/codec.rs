use thiserror::Error;

#[derive(Debug, Error)]
#[error("codec failure: {0}")]
pub struct CodecError(pub String);

/// Reversible transform applied to every record before it is stored.
///
/// `decrypt(encrypt(x)) == x` must hold for every input.
pub trait Codec: Send + Sync + 'static {
    fn encrypt(&self, plain: &[u8]) -> Result<Vec<u8>, CodecError>;
    fn decrypt(&self, cipher: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Stores records as plain JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCodec;

impl Codec for NoopCodec {
    fn encrypt(&self, plain: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(plain.to_vec())
    }

    fn decrypt(&self, cipher: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(cipher.to_vec())
    }
}

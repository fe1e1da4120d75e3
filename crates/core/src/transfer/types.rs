//! Types for transfer operations.

use super::error::TransferError;

/// Validated descriptor bytes (a bencoded `.torrent` file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDescriptor {
    data: Vec<u8>,
}

impl TransferDescriptor {
    /// Checks the bytes look like a bencoded dictionary.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, TransferError> {
        match data.first() {
            None => Err(TransferError::InvalidDescriptor("empty".to_string())),
            Some(b'd') => Ok(Self { data }),
            Some(_) => Err(TransferError::InvalidDescriptor(
                "not a bencoded dictionary".to_string(),
            )),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

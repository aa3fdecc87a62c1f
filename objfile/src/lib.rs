use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use common::constants::{MEM_WORDS, WORD_SIZE};
use common::mem::{as_be_bytes, from_be_bytes, WriteU16};

use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("image is missing its origin word")]
    MissingOrigin,

    #[error("image is truncated: {len} bytes is not a whole number of words")]
    OddLength { len: usize },

    #[error("image of {words} words at origin {origin:#06x} runs past the end of memory")]
    Overflow { origin: u16, words: usize },
}

// A program image: the first word of the file is the load address, every
// following word is stored at consecutive addresses from there. All words
// are big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjFile {
    pub origin: u16,
    pub words: Vec<u16>,
}

impl ObjFile {
    pub fn new(origin: u16, words: Vec<u16>) -> Result<ObjFile, ObjError> {
        if origin as usize + words.len() > MEM_WORDS {
            return Err(ObjError::Overflow { origin, words: words.len() });
        }
        Ok(ObjFile { origin, words })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<ObjFile, ObjError> {
        let word_size = WORD_SIZE as usize;
        if bytes.len() < word_size {
            return Err(ObjError::MissingOrigin);
        }
        if bytes.len() % word_size != 0 {
            return Err(ObjError::OddLength { len: bytes.len() });
        }

        let mut words = from_be_bytes(bytes);
        let origin = words.remove(0);
        Self::new(origin, words)
    }

    pub fn read_from(reader: &mut impl Read) -> Result<ObjFile, ObjError> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<ObjFile, ObjError> {
        let path = path.as_ref();
        let obj = Self::read_from(&mut File::open(path)?)?;
        debug!(
            "{}: {} words at {:#06x}",
            path.display(),
            obj.words.len(),
            obj.origin
        );
        Ok(obj)
    }

    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        writer.write_u16(self.origin)?;
        writer.write_all(&as_be_bytes(&self.words))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WORD_SIZE as usize * (self.words.len() + 1));
        out.extend_from_slice(&self.origin.to_be_bytes());
        out.extend(as_be_bytes(&self.words));
        out
    }

    // One past the last address written, which may be 0x10000.
    pub fn end(&self) -> usize {
        self.origin as usize + self.words.len()
    }
}

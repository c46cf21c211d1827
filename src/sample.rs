use std::io::{self, Read};

const CHUNK_SIZE: usize = 8 * 1024;

/// How much of the input the sniffer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSize {
    /// Read until this many line breaks are buffered, or the input ends.
    Records(usize),
    /// Read at most this many bytes.
    Bytes(usize),
    /// Read the entire input.
    ///
    /// # Warning
    ///
    /// This loads the entire file into memory. For large files, prefer
    /// [`SampleSize::Bytes`] with a reasonable limit.
    All,
}

impl Default for SampleSize {
    fn default() -> Self {
        SampleSize::Records(100)
    }
}

/// Read the sample described by `size` from the front of `reader`.
pub(crate) fn read_sample<R: Read>(mut reader: R, size: SampleSize) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    match size {
        SampleSize::Bytes(n) => {
            reader.take(n as u64).read_to_end(&mut buffer)?;
        }
        SampleSize::All => {
            reader.read_to_end(&mut buffer)?;
        }
        SampleSize::Records(n) => {
            let mut lines = 0;
            let mut chunk = vec![0u8; CHUNK_SIZE];
            while lines < n {
                let read = match reader.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(read) => read,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                lines += bytecount::count(&chunk[..read], b'\n');
                buffer.extend_from_slice(&chunk[..read]);
            }
        }
    }
    Ok(buffer)
}

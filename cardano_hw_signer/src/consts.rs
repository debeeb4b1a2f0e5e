use std::time::Duration;

pub const TIMEOUT: Duration = Duration::from_secs(90);
pub const BAUD_RATE: u32 = 115_200;

/// Maximum size of an inline datum or reference script chunk
pub const MAX_CHUNK_SIZE: usize = 1024;

/// Size of the buffer receiving a single reply frame
pub const RX_BUFFER_SIZE: usize = 4096;

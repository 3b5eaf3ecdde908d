mod counter;
mod error;
mod fifo;
mod gray;
mod oracle;
mod relay;
mod reset;
mod ring;
mod storage;

pub use counter::PositionCounter;
pub use error::{ConfigError, ReadError, WriteError};
pub use fifo::{Consumer, Fifo, Producer};
pub use gray::{GrayValue, hamming};
pub use relay::{GrayRegister, SyncRelay};
pub use reset::ResetPhase;
pub use ring::{DEFAULT_SYNC_STAGES, MAX_DEPTH, RingConfig};

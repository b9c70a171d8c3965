use std::io;

use thiserror::Error;

use crate::disk::{DeviceOperation, JbodStatus};

/// 调用方参数或状态不合法，在任何设备 I/O 之前就被拦下
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("array is not mounted")]
    NotMounted,
    #[error("array is already mounted")]
    AlreadyMounted,
    #[error("length {len} exceeds the {max}-byte request limit")]
    LengthTooLarge { len: u32, max: usize },
    #[error("no buffer supplied for a {len}-byte request")]
    MissingBuffer { len: u32 },
    #[error("buffer holds {have} bytes but the request needs {len}")]
    BufferTooSmall { len: u32, have: usize },
    #[error("range {addr}+{len} runs past the end of the array")]
    OutOfRange { addr: u32, len: u32 },
    #[error("cache capacity {0} is outside [2, 4096]")]
    InvalidCapacity(usize),
    #[error("cache is already active")]
    CacheAlreadyActive,
    #[error("cache is not active")]
    CacheNotActive,
    #[error("invalid block coordinates (disk {disk}, block {block})")]
    InvalidCoordinates { disk: u32, block: u32 },
    #[error("block (disk {disk}, block {block}) is already cached")]
    AlreadyCached { disk: u32, block: u32 },
}

/// 连接或报文层面的失败
#[derive(Error, Debug)]
pub enum NetError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("client is not connected")]
    NotConnected,
    #[error("malformed frame: length field {0}")]
    MalformedFrame(u16),
    #[error("connection closed by peer")]
    Closed,
    #[error("socket I/O error: {0}")]
    Io(#[from] io::Error),
}

/// 阵列控制器对外的统一错误
#[derive(Error, Debug)]
pub enum MdadmError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("device rejected {op}: {status}")]
    Device {
        op: DeviceOperation,
        status: JbodStatus,
    },
    #[error(transparent)]
    Network(#[from] NetError),
}

impl MdadmError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device { .. })
    }
}

pub type Result<T> = std::result::Result<T, MdadmError>;

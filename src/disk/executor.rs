use thiserror::Error;

use crate::{disk::types::Block, error::NetError};

/// 设备返回的非零状态码，线上以 u16 传输，0 表示成功
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JbodStatus {
    #[error("already mounted")]
    AlreadyMounted,
    #[error("already unmounted")]
    AlreadyUnmounted,
    #[error("device is unmounted")]
    Unmounted,
    #[error("bad command")]
    BadCommand,
    #[error("bad disk number")]
    BadDisk,
    #[error("bad block number")]
    BadBlock,
    #[error("block buffer missing")]
    MissingBuffer,
    #[error("backing store I/O failure")]
    Io,
    #[error("unknown status code {0}")]
    Other(u16),
}

pub const STATUS_OK: u16 = 0;

impl JbodStatus {
    pub fn code(&self) -> u16 {
        match self {
            Self::AlreadyMounted => 1,
            Self::AlreadyUnmounted => 2,
            Self::Unmounted => 3,
            Self::BadCommand => 4,
            Self::BadDisk => 5,
            Self::BadBlock => 6,
            Self::MissingBuffer => 7,
            Self::Io => 8,
            Self::Other(code) => *code,
        }
    }

    /// 0 返回 None，其余映射成具体状态
    pub fn from_code(code: u16) -> Option<Self> {
        let status = match code {
            STATUS_OK => return None,
            1 => Self::AlreadyMounted,
            2 => Self::AlreadyUnmounted,
            3 => Self::Unmounted,
            4 => Self::BadCommand,
            5 => Self::BadDisk,
            6 => Self::BadBlock,
            7 => Self::MissingBuffer,
            8 => Self::Io,
            other => Self::Other(other),
        };
        Some(status)
    }

    /// 把状态码转成 Result，方便调用方用 `?`
    pub fn check(code: u16) -> Result<(), JbodStatus> {
        match Self::from_code(code) {
            None => Ok(()),
            Some(status) => Err(status),
        }
    }
}

/// 设备执行器：接收打包后的操作字和可选的数据块，返回状态码。
///
/// 本地的 [`Jbod`](crate::disk::Jbod) 和远端的
/// [`JbodClient`](crate::net::JbodClient) 都实现这个 trait，控制器不区分二者。
/// `Err` 只表示传输失败，设备自己的失败放在状态码里。
pub trait JbodExecutor {
    fn execute(&mut self, op: u32, block: Option<&mut Block>) -> Result<u16, NetError>;
}

impl<E: JbodExecutor + ?Sized> JbodExecutor for Box<E> {
    fn execute(&mut self, op: u32, block: Option<&mut Block>) -> Result<u16, NetError> {
        (**self).execute(op, block)
    }
}

impl<E: JbodExecutor + ?Sized> JbodExecutor for &mut E {
    fn execute(&mut self, op: u32, block: Option<&mut Block>) -> Result<u16, NetError> {
        (**self).execute(op, block)
    }
}

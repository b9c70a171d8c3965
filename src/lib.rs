//! 软件 JBOD 阵列控制器：线性地址翻译、分块读写、LRU 块缓存，
//! 以及把块操作转发到远端设备的报文协议。

pub mod config;
pub mod disk;
pub mod error;
pub mod mdadm;
pub mod net;

pub use error::{MdadmError, NetError, Result, ValidationError};
pub use mdadm::Mdadm;

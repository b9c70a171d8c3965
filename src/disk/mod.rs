pub mod block_device;
pub mod executor;
pub mod file_disk;
pub mod jbod;
pub mod mem_disk;
pub mod op;
pub mod types;

pub use block_device::BlockDevice;
pub use executor::{JbodExecutor, JbodStatus, STATUS_OK};
pub use file_disk::FileDisk;
pub use jbod::Jbod;
pub use mem_disk::MemDisk;
pub use op::{Command, DeviceOperation};
pub use types::*;

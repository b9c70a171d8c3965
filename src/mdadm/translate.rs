use crate::disk::{BLOCK_SIZE, DISK_SIZE};

/// 线性地址对应的物理位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalLocation {
    pub disk: u32,
    pub block: u32,
    pub offset: usize, // 块内字节偏移
}

/// 线性地址 -> (disk, block, offset)。
/// 只对 `[0, TOTAL_CAPACITY)` 有意义，越界地址要在调用前拦下。
pub fn translate(address: u32) -> PhysicalLocation {
    let address = address as usize;
    let within_disk = address % DISK_SIZE;
    PhysicalLocation {
        disk: (address / DISK_SIZE) as u32,
        block: (within_disk / BLOCK_SIZE) as u32,
        offset: within_disk % BLOCK_SIZE,
    }
}

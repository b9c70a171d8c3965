/// 每个块（Block）的大小：256 字节
/// JBOD 以块为最小读写单位。
pub const BLOCK_SIZE: usize = 256;

/// 每块磁盘包含的块数
pub const BLOCKS_PER_DISK: usize = 256;

/// 磁盘数量
pub const DISK_COUNT: usize = 16;

/// 单块磁盘大小（字节）：256 * 256 = 64KB
pub const DISK_SIZE: usize = BLOCK_SIZE * BLOCKS_PER_DISK;

/// 整个阵列的线性地址空间大小：16 * 64KB = 1MB
pub const TOTAL_CAPACITY: usize = DISK_SIZE * DISK_COUNT;

/// 全部块的数量，磁盘镜像按 disk 优先顺序平铺
pub const TOTAL_BLOCKS: usize = BLOCKS_PER_DISK * DISK_COUNT;

/// 单次 read/write 允许的最大长度
pub const MAX_IO_SIZE: usize = 1024;

/// 定义一个块类型（256 字节数组）
/// 所有设备读写都以 Block 为单位进行。
pub type Block = [u8; BLOCK_SIZE];

/// 把 (disk, block) 坐标换算成镜像中的全局块号
pub fn global_block_id(disk: u32, block: u32) -> u64 {
    disk as u64 * BLOCKS_PER_DISK as u64 + block as u64
}

use std::io::Result;

use crate::disk::types::Block;

/// 平铺的块存储：按全局块号读写，不关心 disk/block 坐标
pub trait BlockDevice: Send {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()>;
    fn write_block(&mut self, block_id: u64, buf: &Block) -> Result<()>;
}

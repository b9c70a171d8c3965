use std::io::{Error, ErrorKind, Result};

use crate::disk::{
    block_device::BlockDevice,
    types::{Block, BLOCK_SIZE, TOTAL_BLOCKS},
};

/// 纯内存块存储，进程退出即丢失
#[derive(Debug, Clone)]
pub struct MemDisk {
    blocks: Vec<u8>, // 扁平化存储，TOTAL_BLOCKS * BLOCK_SIZE
}

impl MemDisk {
    pub fn new() -> Self {
        Self {
            blocks: vec![0u8; TOTAL_BLOCKS * BLOCK_SIZE],
        }
    }

    fn range(block_id: u64) -> Result<std::ops::Range<usize>> {
        if block_id >= TOTAL_BLOCKS as u64 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("block id {block_id} out of range"),
            ));
        }
        let start = block_id as usize * BLOCK_SIZE;
        Ok(start..start + BLOCK_SIZE)
    }
}

impl Default for MemDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        buf.copy_from_slice(&self.blocks[Self::range(block_id)?]);
        Ok(())
    }

    fn write_block(&mut self, block_id: u64, buf: &Block) -> Result<()> {
        let range = Self::range(block_id)?;
        self.blocks[range].copy_from_slice(buf);
        Ok(())
    }
}

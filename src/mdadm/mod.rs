//! 阵列控制器：把线性地址上的任意长度读写拆成逐块的设备操作，
//! 中间可选地经过一层 LRU 块缓存。

pub mod cache;
pub mod translate;

use tracing::{debug, info, warn};

use crate::{
    disk::{
        Block, DeviceOperation, JbodExecutor, JbodStatus, BLOCKS_PER_DISK, BLOCK_SIZE,
        MAX_IO_SIZE, TOTAL_CAPACITY,
    },
    error::{MdadmError, Result, ValidationError},
};

pub use cache::{BlockCache, CacheLookup};
pub use translate::{translate, PhysicalLocation};

/// 控制器上下文：持有执行器、缓存和挂载状态。
///
/// 每个请求按块推进，块与块之间没有原子性：中途设备出错时，
/// 已经写下去的块保持写入后的状态，不做回滚。
#[derive(Debug)]
pub struct Mdadm<E: JbodExecutor> {
    executor: E,
    cache: BlockCache,
    mounted: bool,
}

impl<E: JbodExecutor> Mdadm<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            cache: BlockCache::new(),
            mounted: false,
        }
    }

    pub fn with_cache(executor: E, capacity: usize) -> Result<Self> {
        let mut mdadm = Self::new(executor);
        mdadm.cache.create(capacity)?;
        Ok(mdadm)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Err(ValidationError::AlreadyMounted.into());
        }
        self.device(DeviceOperation::mount(), None)?;
        self.mounted = true;
        info!("array mounted");
        Ok(())
    }

    pub fn unmount(&mut self) -> Result<()> {
        if !self.mounted {
            return Err(ValidationError::NotMounted.into());
        }
        self.device(DeviceOperation::unmount(), None)?;
        self.mounted = false;
        info!("array unmounted");
        Ok(())
    }

    /// 从 `addr` 开始读 `len` 字节到 `buf`，返回读到的字节数
    pub fn read(&mut self, addr: u32, len: u32, buf: Option<&mut [u8]>) -> Result<usize> {
        self.validate(addr, len, buf.as_ref().map(|b| b.len()))?;
        let Some(buf) = buf else {
            return Ok(0);
        };

        let len = len as usize;
        let mut loc = translate(addr);
        let mut done = 0;
        let mut block: Block = [0u8; BLOCK_SIZE];

        while done < len {
            let chunk = (len - done).min(BLOCK_SIZE - loc.offset);
            if !self.cache_hit(loc, &mut block) {
                self.fetch_block(loc, &mut block)?;
                if self.cache.is_enabled() {
                    self.cache.insert(loc.disk, loc.block, &block)?;
                }
            }
            buf[done..done + chunk].copy_from_slice(&block[loc.offset..loc.offset + chunk]);
            done += chunk;
            loc = next_block(loc);
        }

        debug!(addr, len, "read complete");
        Ok(done)
    }

    /// 把 `buf` 的前 `len` 字节写到 `addr` 开始的位置，返回写入的字节数。
    /// 每个块先读出、拼接、整块写回，缓存中已有的块同步更新。
    pub fn write(&mut self, addr: u32, len: u32, buf: Option<&[u8]>) -> Result<usize> {
        self.validate(addr, len, buf.map(|b| b.len()))?;
        let Some(data) = buf else {
            return Ok(0);
        };

        let len = len as usize;
        let mut loc = translate(addr);
        let mut done = 0;
        let mut block: Block = [0u8; BLOCK_SIZE];

        while done < len {
            let chunk = (len - done).min(BLOCK_SIZE - loc.offset);
            if !self.cache_hit(loc, &mut block) {
                self.fetch_block(loc, &mut block)?;
            }
            block[loc.offset..loc.offset + chunk].copy_from_slice(&data[done..done + chunk]);
            self.store_block(loc, &mut block)?;
            self.cache.update(loc.disk, loc.block, &block);
            done += chunk;
            loc = next_block(loc);
        }

        debug!(addr, len, "write complete");
        Ok(done)
    }

    pub fn cache(&self) -> &BlockCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut BlockCache {
        &mut self.cache
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    // 所有检查都在碰设备之前完成
    fn validate(&self, addr: u32, len: u32, have: Option<usize>) -> Result<()> {
        if !self.mounted {
            return Err(ValidationError::NotMounted.into());
        }
        if len as usize > MAX_IO_SIZE {
            return Err(ValidationError::LengthTooLarge {
                len,
                max: MAX_IO_SIZE,
            }
            .into());
        }
        match have {
            None if len > 0 => return Err(ValidationError::MissingBuffer { len }.into()),
            Some(have) if have < len as usize => {
                return Err(ValidationError::BufferTooSmall { len, have }.into())
            }
            _ => {}
        }
        if addr as u64 + len as u64 > TOTAL_CAPACITY as u64 {
            return Err(ValidationError::OutOfRange { addr, len }.into());
        }
        Ok(())
    }

    fn cache_hit(&mut self, loc: PhysicalLocation, block: &mut Block) -> bool {
        self.cache.is_enabled()
            && matches!(
                self.cache.lookup(loc.disk, loc.block, block),
                Ok(CacheLookup::Hit)
            )
    }

    fn fetch_block(&mut self, loc: PhysicalLocation, block: &mut Block) -> Result<()> {
        self.device(DeviceOperation::seek_to_disk(loc.disk), None)?;
        self.device(DeviceOperation::seek_to_block(loc.block), None)?;
        self.device(DeviceOperation::read_block(loc.disk, loc.block), Some(block))
    }

    fn store_block(&mut self, loc: PhysicalLocation, block: &mut Block) -> Result<()> {
        self.device(DeviceOperation::seek_to_disk(loc.disk), None)?;
        self.device(DeviceOperation::seek_to_block(loc.block), None)?;
        self.device(DeviceOperation::write_block(loc.disk, loc.block), Some(block))
    }

    fn device(&mut self, op: DeviceOperation, block: Option<&mut Block>) -> Result<()> {
        let code = self.executor.execute(op.encode(), block).map_err(|e| {
            warn!(%op, error = %e, "executor unreachable");
            e
        })?;
        JbodStatus::check(code).map_err(|status| {
            warn!(%op, %status, "device operation failed");
            MdadmError::Device { op, status }
        })
    }
}

fn next_block(loc: PhysicalLocation) -> PhysicalLocation {
    let mut next = PhysicalLocation {
        disk: loc.disk,
        block: loc.block + 1,
        offset: 0,
    };
    if next.block as usize == BLOCKS_PER_DISK {
        next.block = 0;
        next.disk += 1;
    }
    next
}

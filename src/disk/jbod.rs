use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    disk::{
        block_device::BlockDevice,
        executor::{JbodExecutor, JbodStatus, STATUS_OK},
        mem_disk::MemDisk,
        op::{Command, DeviceOperation},
        types::{global_block_id, Block, BLOCKS_PER_DISK, DISK_COUNT},
    },
    error::NetError,
};

/// 进程内的 JBOD 设备：16 块盘，每盘 256 块，带一个读写磁头。
///
/// SEEK_TO_DISK 把磁头移到目标盘的 0 号块，SEEK_TO_BLOCK 在当前盘内定位，
/// READ_BLOCK / WRITE_BLOCK 在磁头处传输一块后磁头后移一块。
#[derive(Debug)]
pub struct Jbod<D: BlockDevice = MemDisk> {
    store: D,
    mounted: bool,
    disk: u32,  // 磁头所在盘
    block: u32, // 磁头所在块
    ops: HashMap<Command, u64>,
}

impl Jbod<MemDisk> {
    pub fn in_memory() -> Self {
        Self::new(MemDisk::new())
    }
}

impl<D: BlockDevice> Jbod<D> {
    pub fn new(store: D) -> Self {
        Self {
            store,
            mounted: false,
            disk: 0,
            block: 0,
            ops: HashMap::new(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// 某条命令累计被执行（不论成败）的次数
    pub fn op_count(&self, command: Command) -> u64 {
        self.ops.get(&command).copied().unwrap_or(0)
    }

    pub fn total_ops(&self) -> u64 {
        self.ops.values().sum()
    }

    pub fn reset_counters(&mut self) {
        self.ops.clear();
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    fn run(&mut self, op: DeviceOperation, block: Option<&mut Block>) -> Result<(), JbodStatus> {
        *self.ops.entry(op.command).or_insert(0) += 1;

        match op.command {
            Command::Mount => {
                if self.mounted {
                    return Err(JbodStatus::AlreadyMounted);
                }
                self.mounted = true;
                self.disk = 0;
                self.block = 0;
                return Ok(());
            }
            Command::Unmount => {
                if !self.mounted {
                    return Err(JbodStatus::AlreadyUnmounted);
                }
                self.mounted = false;
                return Ok(());
            }
            _ if !self.mounted => return Err(JbodStatus::Unmounted),
            _ => {}
        }

        match op.command {
            Command::SeekToDisk => {
                if op.disk as usize >= DISK_COUNT {
                    return Err(JbodStatus::BadDisk);
                }
                self.disk = op.disk;
                self.block = 0;
            }
            Command::SeekToBlock => {
                if op.block as usize >= BLOCKS_PER_DISK {
                    return Err(JbodStatus::BadBlock);
                }
                self.block = op.block;
            }
            Command::ReadBlock => {
                let buf = block.ok_or(JbodStatus::MissingBuffer)?;
                let id = self.head()?;
                self.store.read_block(id, buf).map_err(|e| {
                    warn!(error = %e, block_id = id, "backing store read failed");
                    JbodStatus::Io
                })?;
                self.block += 1;
            }
            Command::WriteBlock => {
                let buf = block.ok_or(JbodStatus::MissingBuffer)?;
                let id = self.head()?;
                self.store.write_block(id, buf).map_err(|e| {
                    warn!(error = %e, block_id = id, "backing store write failed");
                    JbodStatus::Io
                })?;
                self.block += 1;
            }
            Command::Mount | Command::Unmount => unreachable!("handled above"),
        }
        Ok(())
    }

    // 磁头越过盘尾之后不允许继续传输
    fn head(&self) -> Result<u64, JbodStatus> {
        if self.block as usize >= BLOCKS_PER_DISK {
            return Err(JbodStatus::BadBlock);
        }
        Ok(global_block_id(self.disk, self.block))
    }
}

impl<D: BlockDevice> JbodExecutor for Jbod<D> {
    fn execute(&mut self, op: u32, block: Option<&mut Block>) -> Result<u16, NetError> {
        let Some(op) = DeviceOperation::decode(op) else {
            debug!(word = op, "unknown command bits");
            return Ok(JbodStatus::BadCommand.code());
        };
        let status = match self.run(op, block) {
            Ok(()) => STATUS_OK,
            Err(status) => {
                debug!(%op, %status, "jbod operation failed");
                status.code()
            }
        };
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::{op::encode, types::BLOCK_SIZE};

    fn exec(jbod: &mut Jbod, op: DeviceOperation, block: Option<&mut Block>) -> u16 {
        jbod.execute(op.encode(), block).unwrap()
    }

    #[test]
    fn everything_but_mount_is_rejected_while_unmounted() {
        let mut jbod = Jbod::in_memory();
        let mut buf = [0u8; BLOCK_SIZE];
        assert_eq!(
            exec(&mut jbod, DeviceOperation::read_block(0, 0), Some(&mut buf)),
            JbodStatus::Unmounted.code()
        );
        assert_eq!(
            exec(&mut jbod, DeviceOperation::unmount(), None),
            JbodStatus::AlreadyUnmounted.code()
        );
        assert_eq!(exec(&mut jbod, DeviceOperation::mount(), None), STATUS_OK);
        assert_eq!(
            exec(&mut jbod, DeviceOperation::mount(), None),
            JbodStatus::AlreadyMounted.code()
        );
    }

    #[test]
    fn head_advances_after_each_transfer() {
        let mut jbod = Jbod::in_memory();
        exec(&mut jbod, DeviceOperation::mount(), None);
        exec(&mut jbod, DeviceOperation::seek_to_disk(2), None);
        exec(&mut jbod, DeviceOperation::seek_to_block(10), None);

        let mut first = [1u8; BLOCK_SIZE];
        let mut second = [2u8; BLOCK_SIZE];
        assert_eq!(exec(&mut jbod, DeviceOperation::write_block(2, 10), Some(&mut first)), 0);
        assert_eq!(exec(&mut jbod, DeviceOperation::write_block(2, 11), Some(&mut second)), 0);

        exec(&mut jbod, DeviceOperation::seek_to_disk(2), None);
        exec(&mut jbod, DeviceOperation::seek_to_block(11), None);
        let mut buf = [0u8; BLOCK_SIZE];
        assert_eq!(exec(&mut jbod, DeviceOperation::read_block(2, 11), Some(&mut buf)), 0);
        assert_eq!(buf, [2u8; BLOCK_SIZE]);
    }

    #[test]
    fn out_of_range_seeks_and_missing_buffers_fail() {
        let mut jbod = Jbod::in_memory();
        exec(&mut jbod, DeviceOperation::mount(), None);
        // 4 位的 disk 字段装不下 16，只能在结构化操作上检查
        assert_eq!(
            jbod.run(DeviceOperation::seek_to_disk(16), None),
            Err(JbodStatus::BadDisk)
        );
        assert_eq!(
            exec(&mut jbod, DeviceOperation::seek_to_block(256), None),
            JbodStatus::BadBlock.code()
        );
        assert_eq!(
            exec(&mut jbod, DeviceOperation::read_block(0, 0), None),
            JbodStatus::MissingBuffer.code()
        );
        assert_eq!(
            jbod.execute(encode(Command::Mount, 0, 0) | (0x3F << 26), None)
                .unwrap(),
            JbodStatus::BadCommand.code()
        );
    }

    #[test]
    fn oversized_disk_number_spills_into_command_bits() {
        let word = DeviceOperation::seek_to_disk(16).encode();
        assert_eq!(
            DeviceOperation::decode(word),
            Some(DeviceOperation::new(Command::SeekToBlock, 0, 0))
        );

        let mut jbod = Jbod::in_memory();
        exec(&mut jbod, DeviceOperation::mount(), None);
        assert_eq!(jbod.execute(word, None).unwrap(), STATUS_OK);
        assert_eq!(jbod.op_count(Command::SeekToDisk), 0);
        assert_eq!(jbod.op_count(Command::SeekToBlock), 1);
    }

    #[test]
    fn transfer_past_last_block_fails() {
        let mut jbod = Jbod::in_memory();
        let mut buf = [0u8; BLOCK_SIZE];
        exec(&mut jbod, DeviceOperation::mount(), None);
        exec(&mut jbod, DeviceOperation::seek_to_disk(15), None);
        exec(&mut jbod, DeviceOperation::seek_to_block(255), None);
        assert_eq!(exec(&mut jbod, DeviceOperation::read_block(15, 255), Some(&mut buf)), 0);
        assert_eq!(
            exec(&mut jbod, DeviceOperation::read_block(15, 256), Some(&mut buf)),
            JbodStatus::BadBlock.code()
        );
    }

    #[test]
    fn counts_every_command() {
        let mut jbod = Jbod::in_memory();
        exec(&mut jbod, DeviceOperation::mount(), None);
        exec(&mut jbod, DeviceOperation::seek_to_disk(1), None);
        assert_eq!(
            exec(&mut jbod, DeviceOperation::seek_to_block(256), None),
            JbodStatus::BadBlock.code()
        );
        exec(&mut jbod, DeviceOperation::seek_to_block(3), None);
        assert_eq!(jbod.op_count(Command::SeekToDisk), 1);
        assert_eq!(jbod.op_count(Command::SeekToBlock), 2);
        assert_eq!(jbod.total_ops(), 4);
        jbod.reset_counters();
        assert_eq!(jbod.total_ops(), 0);
    }
}

use std::{
    fs::{File, OpenOptions},
    io::{Read, Result, Seek, SeekFrom, Write},
    path::Path,
};

use tracing::info;

use crate::disk::{
    block_device::BlockDevice,
    types::{Block, BLOCK_SIZE, TOTAL_CAPACITY},
};

/// 以镜像文件为后端的块存储
#[derive(Debug)]
pub struct FileDisk {
    file: File, // 读走 &File，定位和读取不需要独占
}

impl FileDisk {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        // 新镜像或长度不足时补齐到整个阵列大小，未写过的块读出来是 0
        if file.metadata()?.len() < TOTAL_CAPACITY as u64 {
            info!(path = %path.display(), "allocating disk image");
            file.set_len(TOTAL_CAPACITY as u64)?;
        }

        Ok(Self { file })
    }
}

impl BlockDevice for FileDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&mut self, block_id: u64, buf: &Block) -> Result<()> {
        self.file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        self.file.write_all(buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_image_is_zero_filled_and_sized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jbod.img");
        let disk = FileDisk::open(&path).unwrap();

        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            TOTAL_CAPACITY as u64
        );
        let mut buf = [0xAAu8; BLOCK_SIZE];
        disk.read_block(4095, &mut buf).unwrap();
        assert_eq!(buf, [0u8; BLOCK_SIZE]);
    }

    #[test]
    fn blocks_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jbod.img");
        {
            let mut disk = FileDisk::open(&path).unwrap();
            disk.write_block(300, &[7u8; BLOCK_SIZE]).unwrap();
        }
        let disk = FileDisk::open(&path).unwrap();
        let mut buf = [0u8; BLOCK_SIZE];
        disk.read_block(300, &mut buf).unwrap();
        assert_eq!(buf, [7u8; BLOCK_SIZE]);
        disk.read_block(301, &mut buf).unwrap();
        assert_eq!(buf, [0u8; BLOCK_SIZE]);
    }

    #[test]
    fn reads_through_shared_reference_land_on_the_right_block() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = FileDisk::open(dir.path().join("jbod.img")).unwrap();
        disk.write_block(0, &[1u8; BLOCK_SIZE]).unwrap();
        disk.write_block(4095, &[2u8; BLOCK_SIZE]).unwrap();

        let shared = &disk;
        let mut buf = [0u8; BLOCK_SIZE];
        shared.read_block(4095, &mut buf).unwrap();
        assert_eq!(buf, [2u8; BLOCK_SIZE]);
        shared.read_block(0, &mut buf).unwrap();
        assert_eq!(buf, [1u8; BLOCK_SIZE]);
    }
}

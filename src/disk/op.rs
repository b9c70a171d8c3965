use std::fmt;

/// JBOD 命令，取值即操作字中 bits 31..26 的编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Mount = 0,
    Unmount = 1,
    SeekToDisk = 2,
    SeekToBlock = 3,
    ReadBlock = 4,
    WriteBlock = 5,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Mount,
        Command::Unmount,
        Command::SeekToDisk,
        Command::SeekToBlock,
        Command::ReadBlock,
        Command::WriteBlock,
    ];

    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.get(bits as usize).copied()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mount => "MOUNT",
            Self::Unmount => "UNMOUNT",
            Self::SeekToDisk => "SEEK_TO_DISK",
            Self::SeekToBlock => "SEEK_TO_BLOCK",
            Self::ReadBlock => "READ_BLOCK",
            Self::WriteBlock => "WRITE_BLOCK",
        };
        f.write_str(name)
    }
}

const COMMAND_SHIFT: u32 = 26;
const DISK_SHIFT: u32 = 22;
const DISK_MASK: u32 = 0xF;
const BLOCK_MASK: u32 = (1 << DISK_SHIFT) - 1;

/// 一次设备操作。内部保持结构化，只在执行器边界打包成 32 位操作字：
///
/// ```text
/// 31        26 25    22 21                  0
/// +-----------+--------+---------------------+
/// |  command  |  disk  |        block        |
/// +-----------+--------+---------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceOperation {
    pub command: Command,
    pub disk: u32,
    pub block: u32,
}

impl DeviceOperation {
    pub fn new(command: Command, disk: u32, block: u32) -> Self {
        Self {
            command,
            disk,
            block,
        }
    }

    pub fn mount() -> Self {
        Self::new(Command::Mount, 0, 0)
    }

    pub fn unmount() -> Self {
        Self::new(Command::Unmount, 0, 0)
    }

    pub fn seek_to_disk(disk: u32) -> Self {
        Self::new(Command::SeekToDisk, disk, 0)
    }

    pub fn seek_to_block(block: u32) -> Self {
        Self::new(Command::SeekToBlock, 0, block)
    }

    pub fn read_block(disk: u32, block: u32) -> Self {
        Self::new(Command::ReadBlock, disk, block)
    }

    pub fn write_block(disk: u32, block: u32) -> Self {
        Self::new(Command::WriteBlock, disk, block)
    }

    pub fn encode(&self) -> u32 {
        encode(self.command, self.disk, self.block)
    }

    pub fn decode(word: u32) -> Option<Self> {
        decode(word).map(|(command, disk, block)| Self::new(command, disk, block))
    }
}

impl fmt::Display for DeviceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(disk={}, block={})", self.command, self.disk, self.block)
    }
}

/// 打包操作字。不做范围检查，调用方保证 disk < 16、block 放得进 22 位
pub fn encode(command: Command, disk: u32, block: u32) -> u32 {
    ((command as u32) << COMMAND_SHIFT) | (disk << DISK_SHIFT) | block
}

/// 拆开操作字；命令位不认识时返回 None
pub fn decode(word: u32) -> Option<(Command, u32, u32)> {
    let command = Command::from_bits((word >> COMMAND_SHIFT) as u8)?;
    let disk = (word >> DISK_SHIFT) & DISK_MASK;
    let block = word & BLOCK_MASK;
    Some((command, disk, block))
}

/// 只取命令位，用于判断报文是否带数据块
pub fn command_of(word: u32) -> Option<Command> {
    Command::from_bits((word >> COMMAND_SHIFT) as u8)
}

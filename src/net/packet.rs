use std::io::{self, Read, Write};

use crate::{
    disk::{op::command_of, Block, Command, BLOCK_SIZE},
    error::NetError,
};

/// 报文头长度：length(2) + op(4) + return code(2)，全部大端
pub const HEADER_LEN: usize = 8;

/// 带数据块的报文长度
pub const BLOCK_FRAME_LEN: usize = HEADER_LEN + BLOCK_SIZE;

/// 一个线上报文。`block` 存在当且仅当 length 字段为 264
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub op: u32,
    pub ret: u16,
    pub block: Option<Block>,
}

impl Packet {
    /// 请求报文：只有 WRITE_BLOCK 带数据块，返回码固定为 0
    pub fn request(op: u32, block: Option<&Block>) -> Self {
        let block = match command_of(op) {
            Some(Command::WriteBlock) => block.copied(),
            _ => None,
        };
        Self { op, ret: 0, block }
    }

    pub fn response(op: u32, ret: u16, block: Option<&Block>) -> Self {
        Self {
            op,
            ret,
            block: block.copied(),
        }
    }

    pub fn frame_len(&self) -> usize {
        if self.block.is_some() {
            BLOCK_FRAME_LEN
        } else {
            HEADER_LEN
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.frame_len());
        frame.extend_from_slice(&(self.frame_len() as u16).to_be_bytes());
        frame.extend_from_slice(&self.op.to_be_bytes());
        frame.extend_from_slice(&self.ret.to_be_bytes());
        if let Some(block) = &self.block {
            frame.extend_from_slice(block);
        }
        frame
    }

    /// 从一段完整的报文字节解析
    pub fn decode(frame: &[u8]) -> Result<Self, NetError> {
        let header: &[u8; HEADER_LEN] = frame
            .get(..HEADER_LEN)
            .and_then(|h| h.try_into().ok())
            .ok_or(NetError::Closed)?;
        let (len, op, ret) = parse_header(header);
        let block = match len as usize {
            HEADER_LEN => None,
            BLOCK_FRAME_LEN => {
                let payload = frame
                    .get(HEADER_LEN..BLOCK_FRAME_LEN)
                    .ok_or(NetError::Closed)?;
                let mut block = [0u8; BLOCK_SIZE];
                block.copy_from_slice(payload);
                Some(block)
            }
            _ => return Err(NetError::MalformedFrame(len)),
        };
        Ok(Self { op, ret, block })
    }
}

fn parse_header(header: &[u8; HEADER_LEN]) -> (u16, u32, u16) {
    let len = u16::from_be_bytes([header[0], header[1]]);
    let op = u32::from_be_bytes([header[2], header[3], header[4], header[5]]);
    let ret = u16::from_be_bytes([header[6], header[7]]);
    (len, op, ret)
}

/// 写出整个报文；write_all 会一直写到全部发完或出错
pub fn write_packet<W: Write>(writer: &mut W, packet: &Packet) -> Result<(), NetError> {
    writer.write_all(&packet.encode())?;
    writer.flush()?;
    Ok(())
}

/// 先读满报文头，再按 length 决定是否继续读 256 字节数据块
pub fn read_packet<R: Read>(reader: &mut R) -> Result<Packet, NetError> {
    let mut header = [0u8; HEADER_LEN];
    read_full(reader, &mut header)?;
    let (len, op, ret) = parse_header(&header);

    let block = match len as usize {
        HEADER_LEN => None,
        BLOCK_FRAME_LEN => {
            let mut block = [0u8; BLOCK_SIZE];
            read_full(reader, &mut block)?;
            Some(block)
        }
        _ => return Err(NetError::MalformedFrame(len)),
    };
    Ok(Packet { op, ret, block })
}

fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), NetError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => NetError::Closed,
        _ => NetError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::DeviceOperation;

    #[test]
    fn read_request_is_header_only() {
        let op = DeviceOperation::read_block(3, 9).encode();
        let frame = Packet::request(op, Some(&[1u8; BLOCK_SIZE])).encode();
        assert_eq!(frame.len(), HEADER_LEN);
        assert_eq!(&frame[..2], &[0, 8]);
        assert_eq!(&frame[2..6], &op.to_be_bytes());
        assert_eq!(&frame[6..], &[0, 0]);

        let decoded = Packet::decode(&frame).unwrap();
        assert_eq!(decoded, Packet { op, ret: 0, block: None });
    }

    #[test]
    fn write_request_carries_the_block() {
        let op = DeviceOperation::write_block(15, 255).encode();
        let block: Block = std::array::from_fn(|i| i as u8);
        let frame = Packet::request(op, Some(&block)).encode();
        assert_eq!(frame.len(), BLOCK_FRAME_LEN);
        assert_eq!(&frame[..2], &264u16.to_be_bytes());
        assert_eq!(&frame[8..264], &block[..]);

        let decoded = Packet::decode(&frame).unwrap();
        assert_eq!(decoded.op, op);
        assert_eq!(decoded.ret, 0);
        assert_eq!(decoded.block, Some(block));
    }

    #[test]
    fn response_round_trips_return_code() {
        let op = DeviceOperation::read_block(0, 1).encode();
        let block = [0x5Au8; BLOCK_SIZE];
        let packet = Packet::response(op, 0xBEEF, Some(&block));
        let mut wire = Vec::new();
        write_packet(&mut wire, &packet).unwrap();
        assert_eq!(&wire[6..8], &[0xBE, 0xEF]);
        assert_eq!(read_packet(&mut wire.as_slice()).unwrap(), packet);
    }

    #[test]
    fn bad_length_is_rejected() {
        let mut frame = Packet::request(0, None).encode();
        frame[1] = 9;
        assert!(matches!(
            read_packet(&mut frame.as_slice()),
            Err(NetError::MalformedFrame(9))
        ));
    }

    #[test]
    fn truncated_payload_reports_closed() {
        let block = [0u8; BLOCK_SIZE];
        let frame = Packet::request(DeviceOperation::write_block(0, 0).encode(), Some(&block))
            .encode();
        assert!(matches!(
            read_packet(&mut &frame[..100]),
            Err(NetError::Closed)
        ));
    }
}

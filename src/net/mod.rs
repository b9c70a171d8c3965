//! JBOD 远程协议：8 字节大端报文头，后面可选跟一个 256 字节数据块。

pub mod client;
pub mod packet;
pub mod server;

pub use client::JbodClient;
pub use packet::{read_packet, write_packet, Packet, BLOCK_FRAME_LEN, HEADER_LEN};
pub use server::{serve_connection, JbodServer};

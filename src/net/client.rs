use std::{
    io::{Read, Write},
    net::TcpStream,
};

use tracing::{debug, info, warn};

use crate::{
    disk::{Block, JbodExecutor},
    error::NetError,
    net::packet::{read_packet, write_packet, Packet},
};

/// 远端 JBOD 的客户端。一次 `call` 就是一次同步往返，不做流水线，
/// 出错后也不会自动重连。
#[derive(Debug)]
pub struct JbodClient<S: Read + Write = TcpStream> {
    stream: Option<S>, // None 即已断开
    peer: String,
}

impl JbodClient<TcpStream> {
    pub fn connect(host: &str, port: u16) -> Result<Self, NetError> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr).map_err(|source| NetError::Connect {
            addr: addr.clone(),
            source,
        })?;
        stream.set_nodelay(true)?;
        info!(%addr, "connected to jbod server");
        Ok(Self {
            stream: Some(stream),
            peer: addr,
        })
    }
}

impl<S: Read + Write> JbodClient<S> {
    /// 在一条已建立的字节流上使用协议
    pub fn from_stream(stream: S, peer: impl Into<String>) -> Self {
        Self {
            stream: Some(stream),
            peer: peer.into(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// 释放连接，之后的调用一律返回 NotConnected
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            info!(peer = %self.peer, "disconnected from jbod server");
        }
    }

    pub fn send_request(&mut self, op: u32, block: Option<&Block>) -> Result<(), NetError> {
        let stream = self.stream.as_mut().ok_or(NetError::NotConnected)?;
        write_packet(stream, &Packet::request(op, block))
    }

    pub fn receive_response(&mut self) -> Result<Packet, NetError> {
        let stream = self.stream.as_mut().ok_or(NetError::NotConnected)?;
        read_packet(stream)
    }

    /// 发请求并阻塞到完整响应到达，返回设备状态码。
    /// 响应带数据块时拷进 `block`。
    pub fn call(&mut self, op: u32, block: Option<&mut Block>) -> Result<u16, NetError> {
        let result = self.round_trip(op, block);
        if let Err(e) = &result {
            warn!(peer = %self.peer, error = %e, "jbod rpc failed");
        }
        result
    }

    fn round_trip(&mut self, op: u32, block: Option<&mut Block>) -> Result<u16, NetError> {
        self.send_request(op, block.as_deref())?;
        let response = self.receive_response()?;
        if response.op != op {
            debug!(sent = op, received = response.op, "response op differs from request");
        }
        if let (Some(dst), Some(src)) = (block, response.block.as_ref()) {
            dst.copy_from_slice(src);
        }
        Ok(response.ret)
    }

    pub fn into_inner(self) -> Option<S> {
        self.stream
    }
}

impl<S: Read + Write> JbodExecutor for JbodClient<S> {
    fn execute(&mut self, op: u32, block: Option<&mut Block>) -> Result<u16, NetError> {
        self.call(op, block)
    }
}

use std::{
    io::{self, Read, Write},
    net::{SocketAddr, TcpListener, ToSocketAddrs},
};

use tracing::{debug, info, warn};

use crate::{
    disk::{op::command_of, BlockDevice, Command, Jbod, JbodExecutor, BLOCK_SIZE, STATUS_OK},
    error::NetError,
    net::packet::{read_packet, write_packet, Packet},
};

/// 协议的服务端：一次只服务一个客户端，会话结束后再接受下一个
#[derive(Debug)]
pub struct JbodServer<D: BlockDevice> {
    listener: TcpListener,
    jbod: Jbod<D>,
}

impl<D: BlockDevice> JbodServer<D> {
    pub fn bind<A: ToSocketAddrs>(addr: A, jbod: Jbod<D>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        info!(addr = %listener.local_addr()?, "jbod server listening");
        Ok(Self { listener, jbod })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn jbod(&self) -> &Jbod<D> {
        &self.jbod
    }

    pub fn into_jbod(self) -> Jbod<D> {
        self.jbod
    }

    /// 接受一个客户端并服务到它断开，返回处理的请求数
    pub fn serve_one(&mut self) -> Result<u64, NetError> {
        let (mut stream, peer) = self.listener.accept()?;
        stream.set_nodelay(true)?;
        info!(%peer, "client connected");
        let served = serve_connection(&mut stream, &mut self.jbod)?;
        info!(%peer, served, "client disconnected");
        Ok(served)
    }

    /// 一直服务下去；单个会话出错只结束该会话
    pub fn serve(&mut self) -> Result<(), NetError> {
        loop {
            if let Err(e) = self.serve_one() {
                warn!(error = %e, "session ended with error");
            }
        }
    }
}

/// 在一条连接上循环：读请求、执行、回响应，直到对端正常关闭
pub fn serve_connection<S, E>(stream: &mut S, executor: &mut E) -> Result<u64, NetError>
where
    S: Read + Write,
    E: JbodExecutor,
{
    let mut served = 0;
    loop {
        let request = match read_packet(stream) {
            Ok(request) => request,
            Err(NetError::Closed) => return Ok(served),
            Err(e) => return Err(e),
        };

        let command = command_of(request.op);
        let mut block = request.block.unwrap_or([0u8; BLOCK_SIZE]);
        let buffer = match command {
            Some(Command::ReadBlock) => Some(&mut block),
            Some(Command::WriteBlock) if request.block.is_some() => Some(&mut block),
            _ => None,
        };
        let status = executor.execute(request.op, buffer)?;
        debug!(op = request.op, status, "served request");

        let payload = (command == Some(Command::ReadBlock) && status == STATUS_OK).then_some(&block);
        write_packet(stream, &Packet::response(request.op, status, payload))?;
        served += 1;
    }
}

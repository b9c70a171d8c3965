use crate::shell::command::Command;
use mdadm_jbod::disk::MAX_IO_SIZE;

/// 地址和长度支持十进制或 0x 开头的十六进制
fn parse_number(token: &str) -> Option<u32> {
    match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}

/// 单次请求长度，超过上限直接拒绝，避免按用户给的长度分配缓冲区
fn parse_len(token: &str) -> Option<u32> {
    parse_number(token).filter(|&len| len as usize <= MAX_IO_SIZE)
}

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.split_ascii_whitespace().collect();
    let (&cmd, args) = tokens.split_first()?;

    match cmd {
        "help" => Some(Command::Help),
        "mount" => Some(Command::Mount),
        "unmount" | "umount" => Some(Command::Unmount),
        "read" => match args {
            [addr, len] => Some(Command::Read(parse_number(addr)?, parse_len(len)?)),
            _ => None,
        },
        "write" => {
            if args.len() >= 2 {
                // 原样保留文本中的空白，只去掉地址前面的部分
                let addr = args[0];
                let text = input.trim_start()[cmd.len()..]
                    .trim_start()
                    .strip_prefix(addr)?
                    .trim_start();
                Some(Command::Write(parse_number(addr)?, text.to_string()))
            } else {
                None
            }
        }
        "fill" => match args {
            [addr, len, byte] => {
                let byte = u8::try_from(parse_number(byte)?).ok()?;
                Some(Command::Fill(parse_number(addr)?, parse_len(len)?, byte))
            }
            _ => None,
        },
        "zero" => Some(Command::Zero),
        "cache" => match args {
            ["off"] => Some(Command::Cache(None)),
            [n] => Some(Command::Cache(Some(n.parse().ok()?))),
            _ => None,
        },
        "stats" => Some(Command::Stats),
        "clear" => Some(Command::Clear),
        "exit" | "quit" => Some(Command::Exit),
        _ => None,
    }
}

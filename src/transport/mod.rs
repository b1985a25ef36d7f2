/**
 * Transmission Channel
 *
 * Wire format: one UDP datagram per motor command, payload "<a>,<b>"
 * (ASCII decimal, no trailing delimiter). No framing, no acks.
 */

pub mod dispatcher;
pub mod udp;

pub use dispatcher::{DispatchStats, Dispatcher};
pub use udp::UdpSink;

use std::fmt;
use std::net::Ipv6Addr;

use crate::drive::{MotorCommand, MAX_POWER};
use crate::error::{DecodeError, SessionError, TransmitError};

const MAX_HOST_LEN: usize = 253;

/// Anything that can put one payload on the wire towards an endpoint.
pub trait DatagramSink: Send + Sync{
    fn send(&self, endpoint: &Endpoint, payload: &[u8]) -> Result<(), TransmitError>;
}

/// Remote robot address. The host is resolved on every send.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint{
    pub host: String,
    pub port: u16,
}

impl Endpoint{
    pub fn new(host: &str, port: u16) -> Self{
        Endpoint{ host: host.to_string(), port }
    }

    /// Parse `host`, `host:port`, `[v6]:port` or a bare IPv6 literal.
    pub fn parse(text: &str, default_port: u16) -> Result<Self, SessionError>{
        let text = text.trim();
        if text.is_empty(){
            return Err(SessionError::InvalidConfiguration("remote address is empty".into()));
        }

        let (host, port) = if let Some(rest) = text.strip_prefix('['){
            let close = rest.find(']').ok_or_else(|| invalid(text, "missing ']'"))?;
            let host = &rest[..close];
            let port = match &rest[close + 1..]{
                "" => default_port,
                tail => parse_port(text, tail.strip_prefix(':').ok_or_else(|| invalid(text, "junk after ']'"))?)?,
            };
            (host, port)
        }else if text.parse::<Ipv6Addr>().is_ok(){
            (text, default_port)
        }else{
            match text.rsplit_once(':'){
                Some((host, port)) => (host, parse_port(text, port)?),
                None => (text, default_port),
            }
        };

        if host.is_empty(){
            return Err(invalid(text, "host is empty"));
        }
        if host.len() > MAX_HOST_LEN || host.chars().any(|c| c.is_whitespace() || c.is_control()){
            return Err(invalid(text, "not a valid host name"));
        }

        Ok(Endpoint{ host: host.to_string(), port })
    }
}

impl fmt::Display for Endpoint{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result{
        if self.host.contains(':'){
            write!(f, "[{}]:{}", self.host, self.port)
        }else{
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn invalid(text: &str, why: &str) -> SessionError{
    SessionError::InvalidConfiguration(format!("{:?}: {}", text, why))
}

fn parse_port(text: &str, port: &str) -> Result<u16, SessionError>{
    match port.parse::<u16>(){
        Ok(p) if p != 0 => Ok(p),
        _ => Err(invalid(text, "invalid port")),
    }
}

/// `"<motor_a>,<motor_b>"`
pub fn encode(cmd: &MotorCommand) -> String{
    format!("{},{}", cmd.motor_a, cmd.motor_b)
}

/// Inverse of [`encode`], tolerant of a trailing newline and padding around fields.
pub fn decode(payload: &[u8]) -> Result<MotorCommand, DecodeError>{
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
    let body = text.strip_suffix('\n').unwrap_or(text);
    let body = body.strip_suffix('\r').unwrap_or(body);

    let (left, right) = body.split_once(',')
        .ok_or_else(|| DecodeError::Malformed(text.to_string()))?;
    let field = |s: &str| -> Result<i32, DecodeError>{
        let value: i32 = s.trim().parse().map_err(|_| DecodeError::Malformed(text.to_string()))?;
        if !(-MAX_POWER..=MAX_POWER).contains(&value){
            return Err(DecodeError::OutOfRange(value));
        }
        Ok(value)
    };

    Ok(MotorCommand::new(field(left)?, field(right)?))
}

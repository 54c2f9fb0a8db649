use std::{
    collections::HashMap,
    io,
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
    time::Duration,
};

use rcj_core::{RobotName, SonarValues, TeamColor};
use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("invalid remote address {0:?}")]
    Address(String),
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode sensor report: {0}")]
    Encode(serde_json::Error),
    #[error("malformed command: {0}")]
    Decode(serde_json::Error),
}

/// The ball signal as read by the robot, absent when nothing was received.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BallSignal {
    pub direction: Option<[f64; 3]>,
    pub strength: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotReport {
    pub name: RobotName,
    pub position: [f64; 2],
    pub rotation: f64,
    pub sonar: SonarValues,
}

/// Everything a remotely controlled robot sensed this tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_for_kickoff: Option<bool>,
    /// Id of the last teammate heard from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robot_id: Option<i32>,
    pub ball: BallSignal,
    pub robot: RobotReport,
    pub color: TeamColor,
    pub time: f64,
}

/// Wheel velocities chosen by the remote decision process.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WheelCommand {
    #[serde(rename = "L")]
    pub left: f64,
    #[serde(rename = "R")]
    pub right: f64,
}

/// Datagram link to an external decision process.
///
/// Each tick the robot sends one JSON [`SensorReport`] and waits up to the
/// configured timeout for a JSON object mapping robot names to
/// [`WheelCommand`]s.
pub struct RemoteBrain {
    socket: UdpSocket,
    target: SocketAddr,
    buf: Vec<u8>,
}

impl RemoteBrain {
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let target = addr
            .to_socket_addrs()
            .map_err(|_| RemoteError::Address(addr.to_owned()))?
            .next()
            .ok_or_else(|| RemoteError::Address(addr.to_owned()))?;
        let raw_socket = Socket::new(Domain::for_address(target), Type::DGRAM, Some(Protocol::UDP))?;
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        raw_socket.bind(&local.into())?;
        raw_socket.set_read_timeout(Some(timeout))?;
        let socket: UdpSocket = raw_socket.into();
        log::debug!("Remote brain socket {:?} -> {}", socket.local_addr(), target);
        Ok(Self {
            socket,
            target,
            buf: vec![0u8; 2 * 1024],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RemoteError> {
        Ok(self.socket.local_addr()?)
    }

    /// Send a report and wait for the reply.
    ///
    /// Returns `Ok(None)` when nothing arrives before the timeout or the reply
    /// has no entry for this robot.
    pub fn exchange(&mut self, report: &SensorReport) -> Result<Option<WheelCommand>, RemoteError> {
        self.discard_stale()?;

        let payload = serde_json::to_vec(report).map_err(RemoteError::Encode)?;
        self.socket.send_to(&payload, self.target)?;

        let len = match self.socket.recv_from(&mut self.buf) {
            Ok((len, _)) => len,
            Err(err) if is_timeout(&err) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut commands: HashMap<String, WheelCommand> =
            serde_json::from_slice(&self.buf[..len]).map_err(RemoteError::Decode)?;
        Ok(commands.remove(&report.robot.name.to_string()))
    }

    /// Drop replies that arrived after an earlier exchange had timed out.
    fn discard_stale(&mut self) -> Result<(), RemoteError> {
        self.socket.set_nonblocking(true)?;
        let mut stale = 0;
        let result = loop {
            match self.socket.recv_from(&mut self.buf) {
                Ok(_) => stale += 1,
                Err(err) if is_timeout(&err) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        self.socket.set_nonblocking(false)?;
        if stale > 0 {
            log::debug!("Discarded {} late replies from {}", stale, self.target);
        }
        Ok(result?)
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

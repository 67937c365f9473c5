//! Ephemeral port acquisition
//!
//! Candidates are drawn from the IANA ephemeral range and confirmed by binding
//! them on the loopback interfaces, so a port already held by another service is
//! never handed to `bw serve`. The test sockets are released right before the
//! server is spawned.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, TcpListener};
use std::ops::RangeInclusive;

use rand::Rng;

use crate::common::{Error, Result};

/// IANA dynamic/private port range
pub const EPHEMERAL_PORTS: RangeInclusive<u16> = 49152..=65535;

const MAX_ATTEMPTS: u32 = 64;

/// Find a free port in [`EPHEMERAL_PORTS`]
pub fn acquire_port() -> Result<u16> {
    acquire_port_with(&mut rand::thread_rng())
}

/// Find a free port using the given random source
pub fn acquire_port_with<R: Rng + ?Sized>(rng: &mut R) -> Result<u16> {
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = rng.gen_range(EPHEMERAL_PORTS);
        match try_bind(candidate) {
            Ok(port) => {
                tracing::trace!(port, attempt, "Acquired ephemeral port");
                return Ok(port);
            }
            Err(e) => {
                tracing::trace!(port = candidate, error = %e, "Port unavailable");
            }
        }
    }

    Err(Error::NoPortAvailable {
        low: *EPHEMERAL_PORTS.start(),
        high: *EPHEMERAL_PORTS.end(),
        attempts: MAX_ATTEMPTS,
    })
}

/// `localhost` may resolve to either loopback address, so the port must be
/// free on both. Hosts without IPv6 only need the IPv4 bind.
fn try_bind(port: u16) -> std::io::Result<u16> {
    let v4 = TcpListener::bind((Ipv4Addr::LOCALHOST, port))?;
    let _v6 = match TcpListener::bind((Ipv6Addr::LOCALHOST, port)) {
        Ok(listener) => Some(listener),
        Err(e) if e.kind() == ErrorKind::AddrInUse => return Err(e),
        Err(e) => {
            tracing::trace!(port, error = %e, "IPv6 loopback unavailable");
            None
        }
    };
    Ok(v4.local_addr()?.port())
}

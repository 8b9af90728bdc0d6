use crate::error::{Result, TelemetryError};
use log::debug;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Half-duplex packet radio as seen by a link session
///
/// Reception is polled: `try_receive` never blocks and yields at most the one
/// packet the module is currently holding.
pub trait Radio {
    /// Bring the module up; an error here leaves the node with no telemetry path
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn transmit(&mut self, payload: &str) -> Result<()>;
    fn try_receive(&mut self) -> Option<String>;
}

impl<R: Radio + ?Sized> Radio for Box<R> {
    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    fn transmit(&mut self, payload: &str) -> Result<()> {
        (**self).transmit(payload)
    }

    fn try_receive(&mut self) -> Option<String> {
        (**self).try_receive()
    }
}

type Mailbox = Rc<RefCell<Option<String>>>;

/// One end of an in-memory radio channel
///
/// Each direction holds a single pending packet. Transmitting again before the
/// peer polls overwrites the pending packet, like a module without a receive
/// queue would.
#[derive(Debug)]
pub struct LoopbackRadio {
    name: &'static str,
    inbox: Mailbox,
    outbox: Mailbox,
    online: bool,
    overwritten: u32,
}

impl LoopbackRadio {
    /// Create two connected endpoints
    pub fn pair(a: &'static str, b: &'static str) -> (Self, Self) {
        let a_to_b: Mailbox = Rc::new(RefCell::new(None));
        let b_to_a: Mailbox = Rc::new(RefCell::new(None));
        (
            Self {
                name: a,
                inbox: b_to_a.clone(),
                outbox: a_to_b.clone(),
                online: true,
                overwritten: 0,
            },
            Self {
                name: b,
                inbox: a_to_b,
                outbox: b_to_a,
                online: true,
                overwritten: 0,
            },
        )
    }

    /// An endpoint whose module never came up
    pub fn offline(name: &'static str) -> Self {
        let (mut radio, _) = Self::pair(name, "unreachable");
        radio.online = false;
        radio
    }

    fn check_online(&self) -> Result<()> {
        if self.online {
            Ok(())
        } else {
            Err(TelemetryError::LinkUnavailable(format!(
                "{} radio did not respond",
                self.name
            )))
        }
    }

    /// Packets this endpoint clobbered because the peer had not read them yet
    pub fn overwritten(&self) -> u32 {
        self.overwritten
    }
}

impl Radio for LoopbackRadio {
    fn begin(&mut self) -> Result<()> {
        self.check_online()
    }

    fn transmit(&mut self, payload: &str) -> Result<()> {
        self.check_online()?;
        if self.outbox.borrow_mut().replace(payload.to_string()).is_some() {
            self.overwritten += 1;
            debug!("{}: pending packet overwritten before peer read it", self.name);
        }
        debug!("{} sent: {}", self.name, payload);
        Ok(())
    }

    fn try_receive(&mut self) -> Option<String> {
        if !self.online {
            return None;
        }
        self.inbox.borrow_mut().take()
    }
}

/// Radio fed from a recorded list of inbound packets
///
/// Used to replay captures through a link session; everything the session
/// transmits is kept for inspection.
#[derive(Debug, Default)]
pub struct ReplayRadio {
    inbound: VecDeque<String>,
    transmitted: Vec<String>,
}

impl ReplayRadio {
    pub fn new<I, S>(packets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inbound: packets.into_iter().map(Into::into).collect(),
            transmitted: Vec::new(),
        }
    }

    pub fn push_inbound(&mut self, packet: impl Into<String>) {
        self.inbound.push_back(packet.into());
    }

    pub fn remaining(&self) -> usize {
        self.inbound.len()
    }

    pub fn transmitted(&self) -> &[String] {
        &self.transmitted
    }

    pub fn take_transmitted(&mut self) -> Vec<String> {
        std::mem::take(&mut self.transmitted)
    }
}

impl Radio for ReplayRadio {
    fn transmit(&mut self, payload: &str) -> Result<()> {
        self.transmitted.push(payload.to_string());
        Ok(())
    }

    fn try_receive(&mut self) -> Option<String> {
        self.inbound.pop_front()
    }
}

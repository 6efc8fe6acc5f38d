//! In-process reader stand-in for integration tests.

#![allow(dead_code)]

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use bytes::{Bytes, BytesMut};
use redrcp_frame::{encode_frame, Frame, FrameDecoder, MessageType};
use redrcp_transport::{ByteHandler, Result, Transport, TransportError};

/// Decides what the fake reader sends back for each command.
pub type Script = Box<dyn FnMut(&Frame) -> Vec<Bytes> + Send>;

/// What crossed the link, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// A command with this code reached the transport.
    Command(u8),
    /// The fake reader started sending a scripted reply.
    Reply,
}

/// State shared between the transport and the test body.
#[derive(Default)]
pub struct Link {
    handler: Mutex<Option<ByteHandler>>,
    sent: Mutex<Vec<Frame>>,
    events: Mutex<Vec<LinkEvent>>,
}

impl Link {
    /// Push bytes into the receive path synchronously, as if the reader sent them.
    pub fn inject(&self, bytes: &[u8]) {
        for &byte in bytes {
            let mut handler = self.handler.lock().unwrap();
            match handler.as_mut() {
                Some(on_byte) => on_byte(byte),
                None => return,
            }
        }
    }

    /// Commands received so far.
    pub fn sent(&self) -> Vec<Frame> {
        self.sent.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<LinkEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: LinkEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Transport whose replies come from a [`Script`], delivered in order on a
/// background thread like a serial receive loop would.
pub struct ScriptedTransport {
    link: Arc<Link>,
    script: Script,
    decoder: FrameDecoder,
    outbox: Sender<Bytes>,
}

impl ScriptedTransport {
    pub fn new(script: impl FnMut(&Frame) -> Vec<Bytes> + Send + 'static) -> (Self, Arc<Link>) {
        let link = Arc::new(Link::default());
        let (outbox, inbox) = mpsc::channel::<Bytes>();
        let worker_link = Arc::clone(&link);
        thread::spawn(move || {
            for chunk in inbox {
                worker_link.record(LinkEvent::Reply);
                worker_link.inject(&chunk);
            }
        });
        let transport = Self {
            link: Arc::clone(&link),
            script: Box::new(script),
            decoder: FrameDecoder::new(),
            outbox,
        };
        (transport, link)
    }

    /// A reader that never answers.
    pub fn silent() -> (Self, Arc<Link>) {
        Self::new(|_| Vec::new())
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self, _endpoint: &str, on_byte: ByteHandler) -> Result<()> {
        let mut handler = self.link.handler.lock().unwrap();
        if handler.is_some() {
            return Err(TransportError::AlreadyConnected);
        }
        *handler = Some(on_byte);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        *self.link.handler.lock().unwrap() = None;
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        for frame in self.decoder.decode_slice(bytes) {
            self.link.record(LinkEvent::Command(frame.code));
            self.link.sent.lock().unwrap().push(frame.clone());
            for reply in (self.script)(&frame) {
                let _ = self.outbox.send(reply);
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.link.handler.lock().unwrap().is_some()
    }
}

fn wire(kind: MessageType, code: u8, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::new();
    encode_frame(kind, code, payload, &mut buf).unwrap();
    buf.freeze()
}

pub fn response(code: u8, payload: &[u8]) -> Bytes {
    wire(MessageType::Response, code, payload)
}

pub fn notification(code: u8, payload: &[u8]) -> Bytes {
    wire(MessageType::Notification, code, payload)
}

pub fn failure(code: u8, error: u8) -> Bytes {
    wire(MessageType::Response, 0xFF, &[code, error])
}

/// PC word `0x3400` followed by a 12-byte EPC ending in `last`.
pub fn tag_payload(last: u8) -> Vec<u8> {
    let mut payload = vec![0x34, 0x00, 0xE2, 0x00, 0x00, 0x17, 0x22, 0x0A, 0x01, 0x23, 0x14, 0x50, 0x6A];
    payload.push(last);
    payload
}

//! Scripted Transport for Tests and Demos
//!
//! Simulates a camera board without hardware: each exchange pops the next
//! scripted reply, falling back to a repeating reply once the script runs out.

use crate::error::ProtocolError;
use crate::transport::Transport;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Mock camera board
#[derive(Debug)]
pub struct MockTransport {
    /// Replies consumed in order
    script: VecDeque<Result<Vec<u8>, ProtocolError>>,
    /// Reply once the script is exhausted
    fallback: Option<Vec<u8>>,
    /// Simulated latency of every exchange
    latency: Duration,
    /// Whether the transport is "connected"
    connected: bool,
    /// Every request and command written, in order
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a connected mock with an empty script
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            fallback: None,
            latency: Duration::ZERO,
            connected: true,
            sent_log: Vec::new(),
        }
    }

    /// Create a mock that answers every frame request with a synthetic image frame
    pub fn streaming(payload: &[u8]) -> Self {
        let mut mock = Self::new();
        mock.set_fallback(Self::image_frame(payload));
        mock
    }

    /// Build a well-formed image response around `payload`
    pub fn image_frame(payload: &[u8]) -> Vec<u8> {
        let mut data = crate::frame::SIGNATURE.to_vec();
        // reserved
        data.push(0);
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(payload);
        data
    }

    /// Queue a reply
    pub fn push_response(&mut self, response: Vec<u8>) {
        self.script.push_back(Ok(response));
    }

    /// Queue a transport failure
    pub fn push_error(&mut self, error: ProtocolError) {
        self.script.push_back(Err(error));
    }

    /// Set the reply used once the script is exhausted
    pub fn set_fallback(&mut self, response: Vec<u8>) {
        self.fallback = Some(response);
    }

    /// Delay every exchange
    pub fn set_latency(&mut self, latency: Duration) {
        self.latency = latency;
    }

    /// Toggle the simulated connection
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// All bytes written so far, one entry per call
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Number of scripted replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        if !self.connected {
            return Err(ProtocolError::NotConnected);
        }
        self.sent_log.push(bytes.to_vec());
        Ok(())
    }

    fn send_and_receive(
        &mut self,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, ProtocolError> {
        if !self.connected {
            return Err(ProtocolError::NotConnected);
        }
        self.sent_log.push(request.to_vec());

        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        let reply = match self.script.pop_front() {
            Some(reply) => reply?,
            None => match &self.fallback {
                Some(fallback) => fallback.clone(),
                None => return Err(ProtocolError::Timeout(0)),
            },
        };

        let n = reply.len().min(response.len());
        response[..n].copy_from_slice(&reply[..n]);
        debug!("Mock replied with {} bytes", n);
        Ok(n)
    }

    fn endpoint(&self) -> Option<String> {
        self.connected.then(|| "mock".to_string())
    }
}

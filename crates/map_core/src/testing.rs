//! Scripted transport for tests: replays queued responses in order and
//! records every request it was asked to send.

use crate::context::HttpTransport;
use crate::error::{TransportError, TransportErrorKind};
use crate::types::{RequestDescriptor, ResponseDescriptor};
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<ResponseDescriptor, TransportError>>>,
    requests: RefCell<Vec<RequestDescriptor>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: ResponseDescriptor) -> Self {
        self.responses.borrow_mut().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.responses.borrow_mut().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(TransportError::new(
                TransportErrorKind::Other,
                format!("no scripted response left for {} {}", request.method, request.url),
            ))
        })
    }
}
